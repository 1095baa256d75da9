use super::*;
use crate::builtins::{LINK_BACKFILL_LIMIT, builtins};
use crate::config::AnalyzerConfig;
use crate::descriptor::ParamRole;
use crate::diag::{Diagnostic, DiagnosticCode, DiagnosticTag};
use crate::instructions::InstructionRegistry;
use crate::lexer::tokenize;
use crate::syntax::{SyntaxNode, build_tree};

fn parse_nodes(text: &str) -> Vec<SyntaxNode> {
    let registry = InstructionRegistry::new();
    build_tree(&registry, tokenize(text).lines, 16).nodes
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
    diagnostics.iter().map(|diagnostic| diagnostic.code).collect()
}

fn labels_at(text: &str, index: usize) -> Vec<String> {
    let nodes = parse_nodes(text);
    let tree = LabelScopeTree::build(&nodes);
    labels_in_scope(&nodes, &tree, index)
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[test]
fn flat_labels_are_all_in_scope() {
    let text = "start:\nset a 1\nsub:\njump start always";
    assert_eq!(labels_at(text, 3), ["start", "sub"]);
}

#[test]
fn nested_labels_are_visible_only_inside_their_block() {
    let text = "start:\n  inner:\n    set a 1\nsub:\n  deep:\n  jump start always";
    assert_eq!(labels_at(text, 5), ["start", "sub", "deep"]);
    assert_eq!(labels_at(text, 2), ["start", "sub", "inner"]);
}

#[test]
fn blocks_partition_the_document() {
    let text = "# intro\nstart:\n  a:\n    set x 1\n  b:\n    end\nnext:\n  c:\nstop";
    let nodes = parse_nodes(text);
    let tree = LabelScopeTree::build(&nodes);

    assert_eq!(tree.root().start_index, 0);
    assert_eq!(tree.root().end_index, nodes.len());
    for block in tree.blocks() {
        let mut cursor = block
            .children
            .first()
            .map(|child| tree.block(*child).start_index);
        for child in &block.children {
            let child = tree.block(*child);
            assert_eq!(Some(child.start_index), cursor);
            assert!(child.start_index >= block.start_index);
            cursor = Some(child.end_index);
        }
        if !block.children.is_empty() {
            assert_eq!(cursor, Some(block.end_index));
        }
    }
    for index in 0..nodes.len() {
        let innermost = tree.innermost_block(index);
        assert!(tree.block(innermost).contains(index));
        assert!(
            tree.block(innermost)
                .children
                .iter()
                .all(|child| !tree.block(*child).contains(index))
        );
    }
    assert_eq!(tree.innermost_block(0), tree.root().children[0]);
}

#[test]
fn documentation_comments_move_with_the_next_label() {
    let text = "start:\n  set a 1\n  # describes next\nnext:\n  end";
    let nodes = parse_nodes(text);
    let tree = LabelScopeTree::build(&nodes);
    let root = tree.root();
    let start = tree.block(root.children[0]);
    let next = tree.block(root.children[1]);
    assert_eq!((start.start_index, start.end_index), (0, 2));
    assert_eq!((next.start_index, next.end_index), (2, 5));
}

#[test]
fn comments_outdented_past_the_parent_stay_put() {
    let text = "outer:\n  a:\n    set x 1\n# about outer\n  b:\n    end";
    let nodes = parse_nodes(text);
    let tree = LabelScopeTree::build(&nodes);
    let outer = tree.block(tree.root().children[0]);
    let a = tree.block(outer.children[0]);
    let b = tree.block(outer.children[1]);
    assert_eq!((a.start_index, a.end_index), (1, 4));
    assert_eq!(b.start_index, 4);
}

#[test]
fn render_outlines_nesting() {
    let nodes = parse_nodes("start:\n  inner:\nend");
    let tree = LabelScopeTree::build(&nodes);
    assert_eq!(
        tree.render(&nodes),
        "<root> [0..3)\n  start [0..3)\n    inner [1..3)\n"
    );
}

#[test]
fn symbol_table_collects_writes_and_links() {
    let nodes = parse_nodes("set x 1\nset _ 2\nread v cell3 0\nset @counter 0\nop add y x 1");
    let table = SymbolTable::build(&nodes, builtins(), "_");

    let x = table.lookup("x").expect("x");
    assert!(x.flags.writeable);
    assert!(!x.flags.global);
    assert!(table.lookup("_").is_none());
    assert!(table.lookup("y").is_some());
    for link in ["cell1", "cell2", "cell3"] {
        let symbol = table.lookup(link).expect(link);
        assert!(symbol.flags.building_link);
        assert!(!symbol.flags.writeable);
    }
    assert!(table.lookup("cell4").is_none());
    assert!(table.local("@counter").is_none());
    assert!(table.lookup("@counter").expect("@counter").flags.writeable);
}

#[test]
fn huge_link_numbers_back_fill_a_bounded_prefix() {
    let nodes = parse_nodes("print cell4000000000\nprint display3000000");
    let table = SymbolTable::build(&nodes, builtins(), "_");

    let links = 2 * (LINK_BACKFILL_LIMIT as usize + 1);
    assert_eq!(table.locals().count(), links);
    assert!(table.lookup("cell1").is_some());
    assert!(table.lookup(&format!("cell{LINK_BACKFILL_LIMIT}")).is_some());
    assert!(table.lookup(&format!("cell{}", LINK_BACKFILL_LIMIT + 1)).is_none());
    let huge = table.lookup("cell4000000000").expect("cell4000000000");
    assert!(huge.flags.building_link);
    assert!(table.lookup("display3000000").is_some());
    assert!(validate_variable_usage(&nodes, &table, "_").is_empty());
}

#[test]
fn out_of_range_jump_targets_are_errors() {
    let nodes = parse_nodes("set x 1\njump 2 always");
    let diagnostics = validate_label_usage(&nodes, &AnalyzerConfig::default());
    assert_eq!(
        codes(&diagnostics),
        [DiagnosticCode::OutOfRangeValue, DiagnosticCode::PreferLabels]
    );
    assert_eq!(diagnostics[0].range.start.line, 1);
    assert_eq!(diagnostics[0].range.start.column, 5);

    let nodes = parse_nodes("set x 1\njump 1 always");
    let diagnostics = validate_label_usage(&nodes, &AnalyzerConfig::default());
    assert_eq!(codes(&diagnostics), [DiagnosticCode::PreferLabels]);
}

#[test]
fn unreferenced_label_is_reported_once() {
    let nodes = parse_nodes("start:\nset x 1\nprint x");
    let diagnostics = validate_label_usage(&nodes, &AnalyzerConfig::default());
    assert_eq!(codes(&diagnostics), [DiagnosticCode::UnusedLabel]);
    assert!(diagnostics[0].has_tag(DiagnosticTag::Unnecessary));
}

#[test]
fn duplicate_and_undefined_labels() {
    let nodes = parse_nodes("start:\nstart:\njump strat always\njump start always");
    let diagnostics = validate_label_usage(&nodes, &AnalyzerConfig::default());
    assert_eq!(
        codes(&diagnostics),
        [DiagnosticCode::DuplicateLabel, DiagnosticCode::UndefinedLabel]
    );
    assert_eq!(diagnostics[0].related.len(), 1);
    assert_eq!(diagnostics[0].related[0].range.start.line, 0);
    assert_eq!(diagnostics[1].suggestion.as_deref(), Some("start"));
}

#[test]
fn caps_flag_each_excess_entry() {
    let config = AnalyzerConfig {
        max_labels: 1,
        max_instructions: 2,
        ..AnalyzerConfig::default()
    };
    let nodes = parse_nodes("a:\nb:\nc:\njump a always\njump b always\njump c always");
    let diagnostics = validate_label_usage(&nodes, &config);
    assert_eq!(
        codes(&diagnostics),
        [
            DiagnosticCode::TooManyLabels,
            DiagnosticCode::TooManyLabels,
            DiagnosticCode::TooManyInstructions,
        ]
    );
    assert_eq!(diagnostics[2].range.start.line, 5);
}

#[test]
fn unknown_instructions_count_toward_the_program_size() {
    let nodes = parse_nodes("frob a\njump 1 always");
    let diagnostics = validate_label_usage(&nodes, &AnalyzerConfig::default());
    assert_eq!(codes(&diagnostics), [DiagnosticCode::PreferLabels]);
}

#[test]
fn variable_usage_reports_unused_writes_and_unknown_reads() {
    let nodes = parse_nodes("set x 1\nset y 2\nprint y\nprint z\nset _ 3\nprint @unit");
    let table = SymbolTable::build(&nodes, builtins(), "_");
    let diagnostics = validate_variable_usage(&nodes, &table, "_");
    assert_eq!(
        codes(&diagnostics),
        [DiagnosticCode::UnusedVariable, DiagnosticCode::UndefinedVariable]
    );
    assert!(diagnostics[0].has_tag(DiagnosticTag::Unnecessary));
    assert_eq!(diagnostics[0].suggestion.as_deref(), Some("_"));
    assert_eq!(diagnostics[1].message, "'z' is never assigned");
}

#[test]
fn reads_before_the_write_still_count() {
    let nodes = parse_nodes("loop:\nprint x\nset x 1\njump loop always");
    let table = SymbolTable::build(&nodes, builtins(), "_");
    assert!(validate_variable_usage(&nodes, &table, "_").is_empty());
}

#[test]
fn undefined_variables_get_spelling_suggestions() {
    let nodes = parse_nodes("set counter 1\nprint countr");
    let table = SymbolTable::build(&nodes, builtins(), "_");
    let diagnostics = validate_variable_usage(&nodes, &table, "_");
    assert_eq!(codes(&diagnostics), [DiagnosticCode::UndefinedVariable]);
    assert_eq!(diagnostics[0].suggestion.as_deref(), Some("counter"));
}

#[test]
fn unknown_instruction_reads_are_not_undefined() {
    let nodes = parse_nodes("frob mystery");
    let table = SymbolTable::build(&nodes, builtins(), "_");
    assert!(validate_variable_usage(&nodes, &table, "_").is_empty());
}

#[test]
fn finds_variable_and_label_references() {
    let nodes = parse_nodes("loop:\nop add i i 1\njump loop lessThan i 10");
    let references = variable_references(&nodes, "i");
    let roles: Vec<_> = references.iter().map(|reference| reference.role).collect();
    assert_eq!(roles, [ParamRole::Write, ParamRole::Read, ParamRole::Read]);
    assert_eq!(references[2].node_index, 2);

    let labels = label_references(&nodes, "loop");
    assert_eq!(labels.definitions.len(), 1);
    assert_eq!(labels.definitions[0].end.column, 4);
    assert_eq!(labels.references.len(), 1);
    assert_eq!(labels.references[0].start.line, 2);
}
