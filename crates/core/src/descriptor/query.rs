use crate::builtins::{Builtins, is_building_link};
use crate::diag::{Diagnostic, DiagnosticCode};
use crate::semantic::{SemanticToken, SemanticTokenType, literal_type, modifiers};
use crate::span::TextRange;
use crate::token::Token;

use super::{Descriptor, InstructionParameter, ParamKind, ParsedInstruction, Slot, VariantSelection};

/// What the cursor rests on inside an instruction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSlot {
    Name,
    Operand {
        operand_index: usize,
        slot_index: Option<usize>,
        slot: Option<Slot>,
    },
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Function,
    Keyword,
    EnumMember,
    Label,
    Variable,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    pub detail: Option<String>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Names the caller knows about that the descriptor cannot see.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionContext<'a> {
    pub labels: &'a [&'a str],
    pub variables: &'a [CompletionItem],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParameter {
    pub name: &'static str,
    /// Byte offsets of the parameter inside the signature label.
    pub label_offsets: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub label: String,
    pub parameters: Vec<SignatureParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHelp {
    pub signatures: Vec<Signature>,
    /// `None` while the overload variant is unresolved.
    pub active_signature: Option<usize>,
    pub active_parameter: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hover {
    pub range: TextRange,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: TextRange,
    pub new_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeAction {
    pub title: String,
    pub edits: Vec<TextEdit>,
    pub diagnostic: Diagnostic,
    pub preferred: bool,
}

/// Index of the token the cursor belongs to: the first token touching
/// `offset`, else the next one after it, else one past the last.
pub fn token_index_at(tokens: &[Token], offset: usize) -> usize {
    tokens
        .iter()
        .position(|token| token.span().touches(offset))
        .or_else(|| tokens.iter().position(|token| token.span().start > offset))
        .unwrap_or(tokens.len())
}

impl Descriptor {
    pub fn cursor_slot(
        &self,
        parsed: &ParsedInstruction,
        tokens: &[Token],
        offset: usize,
    ) -> CursorSlot {
        let index = token_index_at(tokens, offset);
        if index == 0 {
            return CursorSlot::Name;
        }
        if let Some(token) = tokens.get(index)
            && token.is_comment()
            && offset > token.span().start
        {
            return CursorSlot::Comment;
        }
        let operand_index = index - 1;
        let layout = self.layout(&parsed.variant);
        CursorSlot::Operand {
            operand_index,
            slot_index: (operand_index < layout.len()).then_some(operand_index),
            slot: layout.get(operand_index).copied(),
        }
    }

    pub fn signatures(&self, name: &str) -> Vec<Signature> {
        self.all_layouts()
            .into_iter()
            .map(|(key, slots)| build_signature(name, key, &slots))
            .collect()
    }

    pub fn signature_help(
        &self,
        name: &str,
        parsed: &ParsedInstruction,
        tokens: &[Token],
        offset: usize,
    ) -> SignatureHelp {
        let active_signature = match parsed.variant {
            VariantSelection::Single => Some(0),
            VariantSelection::Selected { index, .. } => Some(index),
            VariantSelection::Unknown | VariantSelection::Missing => None,
        };
        let active_parameter = match self.cursor_slot(parsed, tokens, offset) {
            CursorSlot::Operand { slot_index, .. } => slot_index,
            CursorSlot::Name | CursorSlot::Comment => None,
        };
        SignatureHelp {
            signatures: self.signatures(name),
            active_signature,
            active_parameter,
        }
    }

    pub fn completions(
        &self,
        parsed: &ParsedInstruction,
        tokens: &[Token],
        offset: usize,
        context: &CompletionContext<'_>,
    ) -> Vec<CompletionItem> {
        let CursorSlot::Operand { slot, .. } = self.cursor_slot(parsed, tokens, offset) else {
            return Vec::new();
        };
        match slot {
            Some(Slot::Discriminant(_)) => self
                .variant_keys()
                .into_iter()
                .map(|key| CompletionItem::new(key, CompletionKind::EnumMember))
                .collect(),
            Some(Slot::Param(spec)) => {
                if let Some(values) = spec.traits.restricted {
                    values
                        .iter()
                        .map(|value| CompletionItem::new(*value, CompletionKind::EnumMember))
                        .collect()
                } else if spec.traits.is_label {
                    context
                        .labels
                        .iter()
                        .map(|label| CompletionItem::new(*label, CompletionKind::Label))
                        .collect()
                } else {
                    context.variables.to_vec()
                }
            }
            None if parsed.variant == VariantSelection::Unknown => context.variables.to_vec(),
            None => Vec::new(),
        }
    }

    pub fn hover(
        &self,
        name: &str,
        parsed: &ParsedInstruction,
        tokens: &[Token],
        offset: usize,
    ) -> Option<Hover> {
        match self.cursor_slot(parsed, tokens, offset) {
            CursorSlot::Name => {
                let signatures = match parsed.variant {
                    VariantSelection::Selected { index, .. } => {
                        self.signatures(name).into_iter().skip(index).take(1).collect()
                    }
                    _ => self.signatures(name),
                };
                let labels: Vec<_> = signatures
                    .into_iter()
                    .map(|signature| signature.label)
                    .collect();
                Some(Hover {
                    range: tokens.first()?.range,
                    contents: format!("```mlog\n{}\n```", labels.join("\n")),
                })
            }
            CursorSlot::Operand {
                operand_index,
                slot: Some(slot),
                ..
            } => {
                let token = tokens.get(operand_index + 1)?;
                if !token.span().touches(offset) || token.is_comment() {
                    return None;
                }
                Some(Hover {
                    range: token.range,
                    contents: format!("parameter `{}`", slot.name()),
                })
            }
            _ => None,
        }
    }
}

fn build_signature(name: &str, key: Option<&'static str>, slots: &[Slot]) -> Signature {
    let mut label = name.to_string();
    let mut parameters = Vec::with_capacity(slots.len());
    for slot in slots {
        label.push(' ');
        let start = label.len() as u32;
        match slot {
            Slot::Discriminant(name) => label.push_str(key.unwrap_or(name)),
            Slot::Param(spec) => label.push_str(spec.name),
        }
        parameters.push(SignatureParameter {
            name: slot.name(),
            label_offsets: (start, label.len() as u32),
        });
    }
    Signature { label, parameters }
}

/// Highlighting for one operand, decided by its slot and the names the
/// processor defines.
pub fn operand_semantics(parameter: &InstructionParameter, builtins: &Builtins) -> SemanticToken {
    let token = &parameter.token;
    if let Some(token_type) = literal_type(token) {
        return SemanticToken::new(token.range, token_type);
    }
    match parameter.kind {
        ParamKind::EnumMember => SemanticToken::new(token.range, SemanticTokenType::EnumMember),
        ParamKind::Label => SemanticToken::new(token.range, SemanticTokenType::Label),
        ParamKind::Variable => variable_semantics(token, builtins),
    }
}

pub fn variable_semantics(token: &Token, builtins: &Builtins) -> SemanticToken {
    let variable = SemanticToken::new(token.range, SemanticTokenType::Variable);
    match builtins.get(&token.content) {
        Some(symbol) if symbol.flags.keyword => {
            SemanticToken::new(token.range, SemanticTokenType::Keyword)
        }
        Some(symbol) if symbol.flags.writeable => {
            variable.with_modifiers(modifiers::DEFAULT_LIBRARY)
        }
        Some(_) => variable.with_modifiers(modifiers::DEFAULT_LIBRARY | modifiers::READONLY),
        None if is_building_link(&token.content) => variable.with_modifiers(modifiers::READONLY),
        None => variable,
    }
}

/// Quick fixes for a diagnostic reported on `tokens`.
pub fn code_actions(diagnostic: &Diagnostic, tokens: &[Token]) -> Vec<CodeAction> {
    if diagnostic.code == DiagnosticCode::UnusedParameter {
        return remove_operand(diagnostic, tokens).into_iter().collect();
    }
    let Some(suggestion) = &diagnostic.suggestion else {
        return Vec::new();
    };
    let title = match diagnostic.code {
        DiagnosticCode::MissingSpace => "Insert missing space".to_string(),
        DiagnosticCode::UnusedVariable | DiagnosticCode::IgnoredValue => {
            format!("Discard with '{suggestion}'")
        }
        _ => format!("Replace with '{suggestion}'"),
    };
    vec![CodeAction {
        title,
        edits: vec![TextEdit {
            range: diagnostic.range,
            new_text: suggestion.clone(),
        }],
        diagnostic: diagnostic.clone(),
        preferred: true,
    }]
}

fn remove_operand(diagnostic: &Diagnostic, tokens: &[Token]) -> Option<CodeAction> {
    let index = tokens
        .iter()
        .position(|token| token.range.span == diagnostic.range.span)?;
    let previous = tokens.get(index.checked_sub(1)?)?;
    let range = TextRange::cover(
        TextRange::empty_at(previous.range.span.end, previous.range.end),
        tokens[index].range,
    );
    Some(CodeAction {
        title: "Remove unused parameter".to_string(),
        edits: vec![TextEdit {
            range,
            new_text: String::new(),
        }],
        diagnostic: diagnostic.clone(),
        preferred: true,
    })
}
