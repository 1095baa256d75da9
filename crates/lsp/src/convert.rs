use std::collections::HashMap;

use lsp_types::{
    CodeActionKind, CompletionItemKind, DiagnosticRelatedInformation, DiagnosticSeverity,
    Documentation, HoverContents, Location, MarkupContent, MarkupKind, NumberOrString,
    ParameterInformation, ParameterLabel, Range, SemanticTokens, SignatureInformation, Uri,
    WorkspaceEdit,
};
use mlog_core::descriptor::{
    CodeAction, CompletionItem, CompletionKind, Hover, SignatureHelp, TextEdit,
};
use mlog_core::diag::{Diagnostic, DiagnosticTag, Severity, Supplemental};
use mlog_core::span::{Position, TextRange};
use serde_json::json;

pub const DIAGNOSTIC_SOURCE: &str = "mlog";

pub fn position_to_lsp(position: Position) -> lsp_types::Position {
    lsp_types::Position::new(position.line, position.column)
}

pub fn position_from_lsp(position: lsp_types::Position) -> Position {
    Position::new(position.line, position.character)
}

pub fn range_to_lsp(range: TextRange) -> Range {
    Range::new(position_to_lsp(range.start), position_to_lsp(range.end))
}

pub fn severity_to_lsp(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

pub fn diagnostic_to_lsp(diagnostic: &Diagnostic, uri: &Uri) -> lsp_types::Diagnostic {
    let related_information = if diagnostic.related.is_empty() {
        None
    } else {
        Some(
            diagnostic
                .related
                .iter()
                .map(|related| DiagnosticRelatedInformation {
                    location: Location::new(uri.clone(), range_to_lsp(related.range)),
                    message: related.message.clone(),
                })
                .collect::<Vec<_>>(),
        )
    };

    let tags = if diagnostic.tags.is_empty() {
        None
    } else {
        Some(
            diagnostic
                .tags
                .iter()
                .map(|tag| match tag {
                    DiagnosticTag::Unnecessary => lsp_types::DiagnosticTag::UNNECESSARY,
                    DiagnosticTag::Deprecated => lsp_types::DiagnosticTag::DEPRECATED,
                })
                .collect(),
        )
    };

    let mut message = diagnostic.message.clone();
    for supplement in &diagnostic.supplements {
        match supplement {
            Supplemental::Help(help) => {
                message.push_str("\nhelp: ");
                message.push_str(help);
            }
            Supplemental::Note(note) => {
                message.push_str("\nnote: ");
                message.push_str(note);
            }
        }
    }

    lsp_types::Diagnostic {
        range: range_to_lsp(diagnostic.range),
        severity: Some(severity_to_lsp(diagnostic.severity)),
        code: Some(NumberOrString::String(diagnostic.code.as_str().to_string())),
        code_description: None,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message,
        related_information,
        tags,
        data: diagnostic
            .suggestion
            .as_ref()
            .map(|suggestion| json!({ "suggestion": suggestion })),
    }
}

pub fn completion_kind_to_lsp(kind: CompletionKind) -> CompletionItemKind {
    match kind {
        CompletionKind::Function => CompletionItemKind::FUNCTION,
        CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        CompletionKind::EnumMember => CompletionItemKind::ENUM_MEMBER,
        CompletionKind::Label => CompletionItemKind::REFERENCE,
        CompletionKind::Variable => CompletionItemKind::VARIABLE,
        CompletionKind::Constant => CompletionItemKind::CONSTANT,
    }
}

pub fn completion_item_to_lsp(item: &CompletionItem) -> lsp_types::CompletionItem {
    lsp_types::CompletionItem {
        label: item.label.clone(),
        kind: Some(completion_kind_to_lsp(item.kind)),
        detail: item.detail.clone(),
        ..lsp_types::CompletionItem::default()
    }
}

pub fn hover_to_lsp(hover: &Hover) -> lsp_types::Hover {
    lsp_types::Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover.contents.clone(),
        }),
        range: Some(range_to_lsp(hover.range)),
    }
}

pub fn signature_help_to_lsp(help: &SignatureHelp) -> lsp_types::SignatureHelp {
    let signatures = help
        .signatures
        .iter()
        .map(|signature| SignatureInformation {
            label: signature.label.clone(),
            documentation: None,
            parameters: Some(
                signature
                    .parameters
                    .iter()
                    .map(|parameter| {
                        let (start, end) = parameter.label_offsets;
                        ParameterInformation {
                            label: ParameterLabel::LabelOffsets([start, end]),
                            documentation: Some(Documentation::String(parameter.name.to_string())),
                        }
                    })
                    .collect(),
            ),
            active_parameter: None,
        })
        .collect();
    lsp_types::SignatureHelp {
        signatures,
        active_signature: help.active_signature.map(|index| index as u32),
        active_parameter: help.active_parameter.map(|index| index as u32),
    }
}

/// Regroups the flat relative stream into LSP tokens.
pub fn semantic_tokens_to_lsp(data: &[u32]) -> SemanticTokens {
    let data = data
        .chunks_exact(5)
        .map(|chunk| lsp_types::SemanticToken {
            delta_line: chunk[0],
            delta_start: chunk[1],
            length: chunk[2],
            token_type: chunk[3],
            token_modifiers_bitset: chunk[4],
        })
        .collect();
    SemanticTokens {
        result_id: None,
        data,
    }
}

pub fn text_edit_to_lsp(edit: &TextEdit) -> lsp_types::TextEdit {
    lsp_types::TextEdit {
        range: range_to_lsp(edit.range),
        new_text: edit.new_text.clone(),
    }
}

#[allow(clippy::mutable_key_type)]
pub fn workspace_edit(uri: &Uri, edits: &[TextEdit]) -> WorkspaceEdit {
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits.iter().map(text_edit_to_lsp).collect());
    WorkspaceEdit::new(changes)
}

pub fn code_action_to_lsp(action: &CodeAction, uri: &Uri) -> lsp_types::CodeAction {
    lsp_types::CodeAction {
        title: action.title.clone(),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![diagnostic_to_lsp(&action.diagnostic, uri)]),
        edit: Some(workspace_edit(uri, &action.edits)),
        is_preferred: Some(action.preferred),
        ..lsp_types::CodeAction::default()
    }
}

pub fn locations_to_lsp(uri: &Uri, ranges: &[TextRange]) -> Vec<Location> {
    ranges
        .iter()
        .map(|range| Location::new(uri.clone(), range_to_lsp(*range)))
        .collect()
}
