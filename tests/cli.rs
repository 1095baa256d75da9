use assert_cmd::Command;
use predicates::str::contains;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_root(name: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should move forward")
        .as_nanos();
    let root = std::env::temp_dir().join(format!("mlog-cli-{name}-{unique}"));
    std::fs::create_dir_all(&root).expect("failed to create temp root");
    root
}

fn write_source(root: &Path, name: &str, text: &str) -> PathBuf {
    let path = root.join(name);
    std::fs::write(&path, text).expect("failed to write input");
    path
}

fn mlog() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mlog"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_flag_lists_subcommands() {
    mlog()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Analyzer and checker for Mindustry logic"))
        .stdout(contains("check"))
        .stdout(contains("tokens"))
        .stdout(contains("scopes"));
}

#[test]
fn check_accepts_clean_program() {
    let root = temp_root("clean");
    let input = write_source(
        &root,
        "clean.mlog",
        "loop:\n  sensor t @unit @totalItems\n  print t\n  printflush message1\n  jump loop always\n",
    );

    mlog()
        .arg("check")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("0 error(s), 0 warning(s)"));
}

#[test]
fn check_fails_on_errors_and_renders_codes() {
    let root = temp_root("errors");
    let input = write_source(&root, "broken.mlog", "sett x 1\nprint x\n");

    mlog()
        .arg("check")
        .arg(&input)
        .assert()
        .failure()
        .stdout(contains("1 error(s)"))
        .stderr(contains("unknown-instruction"))
        .stderr(contains("did you mean 'set'?"))
        .stderr(contains("1 file(s) failed the check"));
}

#[test]
fn warnings_alone_do_not_fail_the_check() {
    let root = temp_root("warnings");
    let input = write_source(&root, "warn.mlog", "set x 1\n");

    mlog()
        .arg("check")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("0 error(s), 1 warning(s)"))
        .stderr(contains("unused-variable"));
}

#[test]
fn check_reports_every_file() {
    let root = temp_root("many");
    let good = write_source(&root, "good.mlog", "end\n");
    let bad = write_source(&root, "bad.mlog", "jump nowhere always\n");

    mlog()
        .arg("check")
        .arg(&good)
        .arg(&bad)
        .assert()
        .failure()
        .stdout(contains("good.mlog: 0 error(s)"))
        .stdout(contains("bad.mlog: 1 error(s)"))
        .stderr(contains("undefined-label"));
}

#[test]
fn explicit_config_overrides_limits() {
    let root = temp_root("config");
    let input = write_source(&root, "long.mlog", "end\nend\n");
    let config = write_source(&root, "strict.toml", "[analysis]\nmax_instructions = 1\n");

    mlog()
        .arg("check")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("too-many-instructions"));
}

#[test]
fn discovers_config_next_to_the_input() {
    let root = temp_root("discover");
    write_source(&root, "mlog.toml", "[analysis]\nmax_instructions = 1\n");
    let input = write_source(&root, "long.mlog", "end\nend\n");

    mlog()
        .arg("check")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("too-many-instructions"));
}

#[test]
fn invalid_config_is_reported() {
    let root = temp_root("bad-config");
    let input = write_source(&root, "prog.mlog", "end\n");
    let config = write_source(&root, "zero.toml", "[analysis]\nmax_labels = 0\n");

    mlog()
        .arg("check")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("analysis.max_labels"))
        .stderr(contains("must be greater than zero"));
}

#[test]
fn missing_input_is_reported() {
    let root = temp_root("missing");
    mlog()
        .arg("check")
        .arg(root.join("absent.mlog"))
        .assert()
        .failure()
        .stderr(contains("failed to read"));
}

#[test]
fn tokens_prints_kinds_per_statement() {
    let root = temp_root("tokens");
    let input = write_source(&root, "tokens.mlog", "set x 5\nprint \"hi\" # done\n");

    mlog()
        .arg("tokens")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("1:1  identifier \"set\"  identifier \"x\"  number \"5\""))
        .stdout(contains("2:1  identifier \"print\"  string \"\\\"hi\\\"\"  comment \"# done\""));
}

#[test]
fn scopes_prints_label_tree() {
    let root = temp_root("scopes");
    let input = write_source(&root, "scopes.mlog", "start:\n  inner:\n    end\nsub:\n  end\n");

    mlog()
        .arg("scopes")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("<root> [0..5)\n  start [0..3)\n    inner [1..3)\n  sub [3..5)\n"));
}

#[test]
fn verbose_logs_analysis_to_stderr() {
    let root = temp_root("verbose");
    let input = write_source(&root, "prog.mlog", "end\n");

    mlog()
        .arg("-v")
        .arg("check")
        .arg(&input)
        .assert()
        .success()
        .stderr(contains("analyzed document"));
}
