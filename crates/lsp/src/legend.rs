use lsp_types::{
    CodeActionProviderCapability, CompletionOptions, HoverProviderCapability, OneOf,
    SemanticTokenModifier, SemanticTokenType, SemanticTokensFullOptions, SemanticTokensLegend,
    SemanticTokensOptions, SemanticTokensServerCapabilities, ServerCapabilities,
    SignatureHelpOptions, TextDocumentSyncCapability, TextDocumentSyncKind,
    WorkDoneProgressOptions,
};
use mlog_core::semantic::{self, modifiers};

/// Token types in ordinal order, so an index into the legend is the
/// ordinal the core encodes.
pub fn semantic_token_legend_types() -> Vec<SemanticTokenType> {
    semantic::SemanticTokenType::ALL
        .iter()
        .map(|token_type| SemanticTokenType::new(token_type.as_str()))
        .collect()
}

pub fn semantic_token_legend_modifiers() -> Vec<SemanticTokenModifier> {
    modifiers::NAMES
        .iter()
        .map(|name| SemanticTokenModifier::new(*name))
        .collect()
}

pub fn semantic_token_legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: semantic_token_legend_types(),
        token_modifiers: semantic_token_legend_modifiers(),
    }
}

pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![" ".to_string(), "@".to_string()]),
            ..CompletionOptions::default()
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        signature_help_provider: Some(SignatureHelpOptions {
            trigger_characters: Some(vec![" ".to_string()]),
            retrigger_characters: None,
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        rename_provider: Some(OneOf::Left(true)),
        code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
        semantic_tokens_provider: Some(
            SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                work_done_progress_options: WorkDoneProgressOptions::default(),
                legend: semantic_token_legend(),
                range: Some(false),
                full: Some(SemanticTokensFullOptions::Bool(true)),
            }),
        ),
        ..ServerCapabilities::default()
    }
}
