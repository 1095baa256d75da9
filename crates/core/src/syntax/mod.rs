use std::sync::Arc;

use crate::builtins::Builtins;
use crate::descriptor::{
    CodeAction, CompletionContext, CompletionItem, Descriptor, Hover, ParsedInstruction,
    SignatureHelp, ValidationContext, code_actions, operand_semantics, token_index_at,
};
use crate::diag::{Diagnostic, DiagnosticCode};
use crate::instructions::{InstructionKind, InstructionRegistry};
use crate::lexer::StatementLine;
use crate::semantic::{SemanticToken, SemanticTokenType, literal_type, modifiers};
use crate::span::TextRange;
use crate::suggest::nearest;
use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    Comment {
        line: StatementLine,
    },
    LabelDeclaration {
        line: StatementLine,
        name: String,
        name_token: Token,
    },
    Instruction(InstructionNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionNode {
    pub kind: InstructionKind,
    pub line: StatementLine,
    /// `None` for [`InstructionKind::Unknown`].
    pub descriptor: Option<Arc<Descriptor>>,
    pub parsed: ParsedInstruction,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxTree {
    pub nodes: Vec<SyntaxNode>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn build_tree(
    registry: &InstructionRegistry,
    lines: Vec<StatementLine>,
    max_statement_tokens: usize,
) -> SyntaxTree {
    let mut tree = SyntaxTree::default();
    for line in lines {
        check_token_count(&line, max_statement_tokens, &mut tree.diagnostics);
        let first = line.first();
        let node = if first.is_comment() {
            SyntaxNode::Comment { line }
        } else if let Some(name) = first.label_name() {
            let name = name.to_string();
            let name_token = first.clone();
            for extra in line.tokens()[1..].iter().filter(|token| !token.is_comment()) {
                tree.diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::UnexpectedToken,
                    extra.range,
                    format!("unexpected '{}' after label declaration", extra.content),
                ));
            }
            SyntaxNode::LabelDeclaration {
                line,
                name,
                name_token,
            }
        } else {
            SyntaxNode::Instruction(InstructionNode::new(registry, line, &mut tree.diagnostics))
        };
        tree.nodes.push(node);
    }
    tree
}

fn check_token_count(line: &StatementLine, max: usize, diagnostics: &mut Vec<Diagnostic>) {
    let tokens: Vec<&Token> = line.tokens().iter().filter(|token| !token.is_comment()).collect();
    if tokens.len() <= max {
        return;
    }
    let (Some(first), Some(last)) = (tokens.get(max), tokens.last()) else {
        return;
    };
    diagnostics.push(Diagnostic::error(
        DiagnosticCode::TooManyTokens,
        TextRange::cover(first.range, last.range),
        format!(
            "statement has {} tokens, the processor reads at most {max}",
            tokens.len()
        ),
    ));
}

impl InstructionNode {
    fn new(
        registry: &InstructionRegistry,
        line: StatementLine,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let name = &line.first().content;
        let Some(entry) = registry.get(name) else {
            let mut diagnostic = Diagnostic::error(
                DiagnosticCode::UnknownInstruction,
                line.first().range,
                format!("unknown instruction '{name}'"),
            );
            if let Some(suggestion) = nearest(name, registry.names()) {
                diagnostic = diagnostic.with_suggestion(suggestion);
            }
            diagnostics.push(diagnostic);
            let parsed = ParsedInstruction::generic(line.operands());
            return Self {
                kind: InstructionKind::Unknown,
                line,
                descriptor: None,
                parsed,
            };
        };

        let mut parsed = entry.descriptor.parse(line.operands());
        entry.kind.apply_exceptions(&mut parsed);
        Self {
            kind: entry.kind,
            line,
            descriptor: Some(Arc::clone(&entry.descriptor)),
            parsed,
        }
    }

    pub fn name(&self) -> &str {
        &self.line.first().content
    }

    pub fn name_token(&self) -> &Token {
        self.line.first()
    }

    pub fn diagnostics(&self, context: &ValidationContext<'_>) -> Vec<Diagnostic> {
        match &self.descriptor {
            Some(descriptor) => descriptor.validate(&self.parsed, &self.line, context),
            None => Vec::new(),
        }
    }

    pub fn completions(
        &self,
        offset: usize,
        context: &CompletionContext<'_>,
    ) -> Vec<CompletionItem> {
        match &self.descriptor {
            Some(descriptor) => {
                descriptor.completions(&self.parsed, self.line.tokens(), offset, context)
            }
            None if token_index_at(self.line.tokens(), offset) > 0 => context.variables.to_vec(),
            None => Vec::new(),
        }
    }

    pub fn signature_help(&self, offset: usize) -> Option<SignatureHelp> {
        let descriptor = self.descriptor.as_ref()?;
        Some(descriptor.signature_help(self.name(), &self.parsed, self.line.tokens(), offset))
    }

    pub fn hover(&self, offset: usize) -> Option<Hover> {
        let descriptor = self.descriptor.as_ref()?;
        descriptor.hover(self.name(), &self.parsed, self.line.tokens(), offset)
    }

    pub fn token_semantics(&self, builtins: &Builtins) -> Vec<SemanticToken> {
        let mut tokens = vec![SemanticToken::new(
            self.name_token().range,
            SemanticTokenType::Function,
        )];
        tokens.extend(
            self.parsed
                .parameters
                .iter()
                .map(|parameter| operand_semantics(parameter, builtins)),
        );
        if let Some(comment) = self.line.trailing_comment() {
            tokens.push(SemanticToken::new(comment.range, SemanticTokenType::Comment));
        }
        self.kind.adjust_semantics(&self.parsed, &mut tokens);
        tokens
    }
}

impl SyntaxNode {
    pub fn line(&self) -> &StatementLine {
        match self {
            Self::Comment { line } | Self::LabelDeclaration { line, .. } => line,
            Self::Instruction(instruction) => &instruction.line,
        }
    }

    pub fn range(&self) -> TextRange {
        self.line().range()
    }

    pub fn instruction(&self) -> Option<&InstructionNode> {
        match self {
            Self::Instruction(instruction) => Some(instruction),
            Self::Comment { .. } | Self::LabelDeclaration { .. } => None,
        }
    }

    pub fn label_name(&self) -> Option<&str> {
        match self {
            Self::LabelDeclaration { name, .. } => Some(name),
            Self::Comment { .. } | Self::Instruction(_) => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment { .. })
    }

    /// Column of the first token, the indentation the scope tree nests by.
    pub fn column(&self) -> u32 {
        self.line().first().range.start.column
    }

    pub fn diagnostics(&self, context: &ValidationContext<'_>) -> Vec<Diagnostic> {
        match self {
            Self::Instruction(instruction) => instruction.diagnostics(context),
            Self::Comment { .. } | Self::LabelDeclaration { .. } => Vec::new(),
        }
    }

    pub fn token_semantics(&self, builtins: &Builtins) -> Vec<SemanticToken> {
        match self {
            Self::Comment { line } => line
                .tokens()
                .iter()
                .map(|token| SemanticToken::new(token.range, SemanticTokenType::Comment))
                .collect(),
            Self::LabelDeclaration {
                line, name_token, ..
            } => {
                let mut tokens = vec![
                    SemanticToken::new(name_token.range, SemanticTokenType::Label)
                        .with_modifiers(modifiers::DECLARATION),
                ];
                tokens.extend(line.tokens()[1..].iter().map(|token| {
                    let token_type = literal_type(token).unwrap_or(SemanticTokenType::Variable);
                    SemanticToken::new(token.range, token_type)
                }));
                tokens
            }
            Self::Instruction(instruction) => instruction.token_semantics(builtins),
        }
    }

    pub fn code_actions(&self, diagnostic: &Diagnostic) -> Vec<CodeAction> {
        code_actions(diagnostic, self.line().tokens())
    }
}

/// Range of a label declaration's name without the trailing colon.
pub fn label_name_range(name_token: &Token) -> TextRange {
    let mut range = name_token.range;
    range.span.end = range.span.end.saturating_sub(1);
    range.end.column = range.end.column.saturating_sub(1);
    range
}
