use std::path::{Path, PathBuf};
use std::{env, io::IsTerminal};

use anyhow::Context;
use clap::{Parser, Subcommand};
use mlog_core::config::AnalyzerConfig;
use mlog_core::diag::{RenderOptions, Severity, render_diagnostics_with_options};
use mlog_core::{Analyzer, Document, tokenize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "mlog",
    version,
    about = "Analyzer and checker for Mindustry logic (mlog) sources",
    long_about = None,
    after_help = "Examples:\n  mlog check path/to/program.mlog\n  mlog tokens path/to/program.mlog\n  mlog scopes path/to/program.mlog"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of searching for mlog.toml.
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log analysis progress to stderr.
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report diagnostics; exits non-zero when any file has errors.
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Print each statement's tokens and their kinds.
    Tokens {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the label scope tree.
    Scopes {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { files } => check_command(&files, cli.config.as_deref()),
        Commands::Tokens { file } => tokens_command(&file),
        Commands::Scopes { file } => scopes_command(&file, cli.config.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

fn load_config(explicit: Option<&Path>, input: &Path) -> anyhow::Result<AnalyzerConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let start = match input.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let Some(found) = AnalyzerConfig::discover(start) else {
                return Ok(AnalyzerConfig::default());
            };
            found
        }
    };
    debug!(config = %path.display(), "loading analyzer config");
    Ok(AnalyzerConfig::load(&path)?)
}

fn check_command(files: &[PathBuf], config: Option<&Path>) -> anyhow::Result<()> {
    let render_options = if stderr_supports_color() {
        RenderOptions::colored()
    } else {
        RenderOptions::plain()
    };
    let mut failed = 0usize;
    for path in files {
        let source = read_source(path)?;
        let analyzer = Analyzer::new(load_config(config, path)?);
        let document = Document::new(source, &analyzer);
        let diagnostics = document.diagnostics();

        if !diagnostics.is_empty() {
            eprintln!(
                "{}",
                render_diagnostics_with_options(
                    &path.display().to_string(),
                    document.text(),
                    diagnostics,
                    render_options,
                )
            );
        }

        let count = |severity: Severity| {
            diagnostics
                .iter()
                .filter(|diagnostic| diagnostic.severity == severity)
                .count()
        };
        let errors = count(Severity::Error);
        println!(
            "{}: {} error(s), {} warning(s)",
            path.display(),
            errors,
            count(Severity::Warning)
        );
        if errors > 0 {
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed the check");
    }
    Ok(())
}

fn tokens_command(path: &Path) -> anyhow::Result<()> {
    let source = read_source(path)?;
    let tokenized = tokenize(&source);
    for line in &tokenized.lines {
        let start = line.first().range.start;
        let tokens: Vec<String> = line
            .tokens()
            .iter()
            .map(|token| format!("{} {:?}", token.kind_name(), token.content))
            .collect();
        println!(
            "{}:{}  {}",
            start.line + 1,
            start.column + 1,
            tokens.join("  ")
        );
    }
    Ok(())
}

fn scopes_command(path: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let source = read_source(path)?;
    let analyzer = Analyzer::new(load_config(config, path)?);
    let document = Document::new(source, &analyzer);
    print!("{}", document.scopes().render(document.nodes()));
    Ok(())
}

fn stderr_supports_color() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if let Some(force) = env::var_os("CLICOLOR_FORCE") {
        return force != "0";
    }

    if let Some(choice) = env::var_os("CLICOLOR")
        && choice == "0"
    {
        return false;
    }

    std::io::stderr().is_terminal()
}
