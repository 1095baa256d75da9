//! Maps the mlog analysis model onto `lsp_types` values for editor
//! integrations.

mod convert;
mod legend;

pub use self::convert::{
    DIAGNOSTIC_SOURCE, code_action_to_lsp, completion_item_to_lsp, completion_kind_to_lsp,
    diagnostic_to_lsp, hover_to_lsp, locations_to_lsp, position_from_lsp, position_to_lsp,
    range_to_lsp, semantic_tokens_to_lsp, severity_to_lsp, signature_help_to_lsp,
    text_edit_to_lsp, workspace_edit,
};
pub use self::legend::{
    semantic_token_legend, semantic_token_legend_modifiers, semantic_token_legend_types,
    server_capabilities,
};

#[cfg(test)]
mod tests;
