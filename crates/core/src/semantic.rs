use crate::span::TextRange;
use crate::token::{Token, TokenKind};

/// Highlight classes. The discriminants are the legend ordinals editors see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticTokenType {
    Comment = 0,
    String = 1,
    Number = 2,
    Color = 3,
    Label = 4,
    Keyword = 5,
    EnumMember = 6,
    Variable = 7,
    Function = 8,
}

impl SemanticTokenType {
    pub const ALL: [SemanticTokenType; 9] = [
        Self::Comment,
        Self::String,
        Self::Number,
        Self::Color,
        Self::Label,
        Self::Keyword,
        Self::EnumMember,
        Self::Variable,
        Self::Function,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::String => "string",
            Self::Number => "number",
            Self::Color => "color",
            Self::Label => "label",
            Self::Keyword => "keyword",
            Self::EnumMember => "enumMember",
            Self::Variable => "variable",
            Self::Function => "function",
        }
    }

    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

pub mod modifiers {
    pub const READONLY: u32 = 1;
    pub const DECLARATION: u32 = 1 << 1;
    pub const CONTROL_FLOW: u32 = 1 << 2;
    pub const DEFAULT_LIBRARY: u32 = 1 << 3;

    /// Modifier names in bit order.
    pub const NAMES: [&str; 4] = ["readonly", "declaration", "controlFlow", "defaultLibrary"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticToken {
    pub range: TextRange,
    pub token_type: SemanticTokenType,
    pub modifiers: u32,
}

impl SemanticToken {
    pub fn new(range: TextRange, token_type: SemanticTokenType) -> Self {
        Self {
            range,
            token_type,
            modifiers: 0,
        }
    }

    pub fn with_modifiers(mut self, modifiers: u32) -> Self {
        self.modifiers |= modifiers;
        self
    }

    pub fn has_modifier(&self, modifier: u32) -> bool {
        self.modifiers & modifier != 0
    }
}

/// Highlight class decided by the token's shape alone.
pub fn literal_type(token: &Token) -> Option<SemanticTokenType> {
    match token.kind {
        TokenKind::Comment => Some(SemanticTokenType::Comment),
        TokenKind::String(_) => Some(SemanticTokenType::String),
        TokenKind::Number(_) => Some(SemanticTokenType::Number),
        TokenKind::Color(_) => Some(SemanticTokenType::Color),
        TokenKind::Label => Some(SemanticTokenType::Label),
        TokenKind::Identifier => None,
    }
}

/// Flattens tokens into `delta_line, delta_start, length, type, modifiers`
/// quintuples, each position relative to the previous token.
pub fn encode(tokens: &[SemanticToken]) -> Vec<u32> {
    let mut sorted: Vec<&SemanticToken> = tokens
        .iter()
        .filter(|token| token.range.start.line == token.range.end.line)
        .filter(|token| token.range.end.column > token.range.start.column)
        .collect();
    sorted.sort_by_key(|token| (token.range.start.line, token.range.start.column));

    let mut data = Vec::with_capacity(sorted.len() * 5);
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;
    for token in sorted {
        let start = token.range.start;
        let delta_line = start.line - prev_line;
        let delta_start = if delta_line == 0 {
            start.column - prev_start
        } else {
            start.column
        };
        data.extend([
            delta_line,
            delta_start,
            token.range.end.column - start.column,
            token.token_type.ordinal(),
            token.modifiers,
        ]);
        prev_line = start.line;
        prev_start = start.column;
    }
    data
}
