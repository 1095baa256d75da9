use std::str::FromStr;

use lsp_types::{
    CompletionItemKind, DiagnosticSeverity, HoverContents, NumberOrString, ParameterLabel, Uri,
};
use mlog_core::diag::DiagnosticCode;
use mlog_core::span::Position;
use mlog_core::{Analyzer, Document};
use serde_json::json;

use super::*;

fn uri() -> Uri {
    Uri::from_str("file:///tmp/test.mlog").expect("uri")
}

#[test]
fn legend_matches_core_ordinals() {
    let legend = semantic_token_legend();
    let types: Vec<_> = legend.token_types.iter().map(|ty| ty.as_str()).collect();
    assert_eq!(
        types,
        [
            "comment",
            "string",
            "number",
            "color",
            "label",
            "keyword",
            "enumMember",
            "variable",
            "function",
        ]
    );
    let modifiers: Vec<_> = legend.token_modifiers.iter().map(|m| m.as_str()).collect();
    assert_eq!(
        modifiers,
        ["readonly", "declaration", "controlFlow", "defaultLibrary"]
    );
}

#[test]
fn capabilities_serialize_with_semantic_tokens() {
    let value = serde_json::to_value(server_capabilities()).expect("serialize capabilities");
    assert_eq!(value["hoverProvider"], json!(true));
    assert_eq!(value["renameProvider"], json!(true));
    assert_eq!(
        value["semanticTokensProvider"]["legend"]["tokenTypes"][8],
        json!("function")
    );
}

#[test]
fn converts_diagnostics_with_code_tags_and_related_info() {
    let analyzer = Analyzer::default();
    let document = Document::new("start:\nstart:\njump start always\nset x 1", &analyzer);
    let uri = uri();

    let duplicate = document
        .diagnostics()
        .iter()
        .find(|diagnostic| diagnostic.code == DiagnosticCode::DuplicateLabel)
        .expect("duplicate label");
    let converted = diagnostic_to_lsp(duplicate, &uri);
    assert_eq!(converted.severity, Some(DiagnosticSeverity::ERROR));
    assert_eq!(
        converted.code,
        Some(NumberOrString::String("duplicate-label".to_string()))
    );
    assert_eq!(converted.source.as_deref(), Some(DIAGNOSTIC_SOURCE));
    let related = converted.related_information.expect("related info");
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].location.range.start.line, 0);

    let unused = document
        .diagnostics()
        .iter()
        .find(|diagnostic| diagnostic.code == DiagnosticCode::UnusedVariable)
        .expect("unused variable");
    let converted = diagnostic_to_lsp(unused, &uri);
    assert_eq!(converted.severity, Some(DiagnosticSeverity::WARNING));
    assert_eq!(
        converted.tags,
        Some(vec![lsp_types::DiagnosticTag::UNNECESSARY])
    );
    assert_eq!(converted.data, Some(json!({ "suggestion": "_" })));
}

#[test]
fn suggestions_appear_as_help_lines() {
    let analyzer = Analyzer::default();
    let document = Document::new("draw lnie 0 0 1 1", &analyzer);
    let converted = diagnostic_to_lsp(&document.diagnostics()[0], &uri());
    assert!(converted.message.contains("help: did you mean 'line'?"));
}

#[test]
fn converts_completion_items() {
    let analyzer = Analyzer::default();
    let document = Document::new("", &analyzer);
    let items: Vec<_> = document
        .completions(Position::new(0, 0))
        .iter()
        .map(completion_item_to_lsp)
        .collect();
    let set = items.iter().find(|item| item.label == "set").expect("set");
    assert_eq!(set.kind, Some(CompletionItemKind::FUNCTION));
    assert_eq!(set.detail.as_deref(), Some("set variable value"));
}

#[test]
fn converts_hover_to_markdown() {
    let analyzer = Analyzer::default();
    let document = Document::new("end", &analyzer);
    let hover = document.hover(Position::new(0, 1)).expect("hover");
    let converted = hover_to_lsp(&hover);
    match converted.contents {
        HoverContents::Markup(markup) => assert!(markup.value.starts_with("```mlog")),
        other => panic!("unexpected hover contents: {other:?}"),
    }
    assert_eq!(converted.range.map(|range| range.end.character), Some(3));
}

#[test]
fn converts_signature_help_offsets() {
    let analyzer = Analyzer::default();
    let document = Document::new("set x ", &analyzer);
    let help = document
        .signature_help(Position::new(0, 6))
        .expect("signature help");
    let converted = signature_help_to_lsp(&help);
    assert_eq!(converted.active_signature, Some(0));
    assert_eq!(converted.active_parameter, Some(1));
    let signature = &converted.signatures[0];
    assert_eq!(signature.label, "set variable value");
    let parameters = signature.parameters.as_ref().expect("parameters");
    assert_eq!(parameters[1].label, ParameterLabel::LabelOffsets([13, 18]));
}

#[test]
fn regroups_semantic_tokens() {
    let analyzer = Analyzer::default();
    let document = Document::new("set x 1\nprint x", &analyzer);
    let tokens = semantic_tokens_to_lsp(&document.encoded_semantic_tokens());
    assert_eq!(tokens.data.len(), 5);
    let print = &tokens.data[3];
    assert_eq!((print.delta_line, print.delta_start, print.length), (1, 0, 5));
    assert_eq!(print.token_type, 8);
}

#[test]
fn code_actions_become_quick_fix_workspace_edits() {
    let analyzer = Analyzer::default();
    let document = Document::new("end extra", &analyzer);
    let uri = uri();
    let diagnostic = &document.diagnostics()[0];
    let actions = document.code_actions(diagnostic);
    let converted = code_action_to_lsp(&actions[0], &uri);
    assert_eq!(converted.kind, Some(lsp_types::CodeActionKind::QUICKFIX));
    assert_eq!(converted.is_preferred, Some(true));
    let changes = converted
        .edit
        .and_then(|edit| edit.changes)
        .expect("workspace changes");
    let edits = changes.get(&uri).expect("edits for uri");
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].range.start.character, 3);
    assert_eq!(edits[0].range.end.character, 9);
    assert!(edits[0].new_text.is_empty());
}

#[test]
fn converts_reference_locations() {
    let analyzer = Analyzer::default();
    let document = Document::new("loop:\njump loop always", &analyzer);
    let uri = uri();
    let locations = locations_to_lsp(&uri, &document.references(Position::new(0, 0), true));
    assert_eq!(locations.len(), 2);
    assert!(locations.iter().all(|location| location.uri == uri));
    assert_eq!(position_from_lsp(locations[1].range.start), Position::new(1, 5));
}
