//! One open mlog source and everything derived from it.
//!
//! A [`Document`] reruns the whole pipeline on every change: tokenize, build
//! the syntax tree, collect symbols and label scopes, then run the
//! diagnostic passes. Editor queries read from that snapshot.

use tracing::debug;

use crate::builtins::{Builtins, builtins};
use crate::config::AnalyzerConfig;
use crate::descriptor::{
    CodeAction, CompletionContext, CompletionItem, CompletionKind, Hover, ParamKind, ParamRole,
    SignatureHelp, TextEdit, ValidationContext, code_actions, token_index_at,
};
use crate::diag::{Diagnostic, Severity};
use crate::instructions::InstructionRegistry;
use crate::lexer::tokenize;
use crate::sema::{
    LabelScopeTree, Symbol, SymbolTable, label_references, labels_in_scope,
    validate_label_usage, validate_variable_usage, variable_references,
};
use crate::semantic::{SemanticToken, encode};
use crate::span::{LineIndex, Position, TextRange};
use crate::token::Token;
use crate::syntax::{SyntaxNode, build_tree, label_name_range};

/// Shared, immutable analysis inputs: the instruction registry, the
/// processor's built-ins and the configured limits.
#[derive(Debug)]
pub struct Analyzer {
    registry: InstructionRegistry,
    config: AnalyzerConfig,
    builtins: &'static Builtins,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            registry: InstructionRegistry::new(),
            config,
            builtins: builtins(),
        }
    }

    pub fn registry(&self) -> &InstructionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn builtins(&self) -> &'static Builtins {
        self.builtins
    }
}

/// A name the cursor can point at across the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolTarget {
    Label(String),
    Variable(String),
}

impl SymbolTarget {
    pub fn name(&self) -> &str {
        match self {
            Self::Label(name) | Self::Variable(name) => name,
        }
    }
}

#[derive(Debug)]
struct Snapshot {
    nodes: Vec<SyntaxNode>,
    symbols: SymbolTable,
    scopes: LabelScopeTree,
    diagnostics: Vec<Diagnostic>,
}

impl Snapshot {
    fn analyze(analyzer: &Analyzer, text: &str) -> Self {
        let config = &analyzer.config;
        let tokenized = tokenize(text);
        let mut diagnostics = tokenized.diagnostics;

        let tree = build_tree(&analyzer.registry, tokenized.lines, config.max_statement_tokens);
        diagnostics.extend(tree.diagnostics);
        let nodes = tree.nodes;

        let symbols = SymbolTable::build(&nodes, analyzer.builtins, &config.discard_name);
        let scopes = LabelScopeTree::build(&nodes);

        let context = ValidationContext {
            discard_name: &config.discard_name,
            builtins: analyzer.builtins,
        };
        for node in &nodes {
            diagnostics.extend(node.diagnostics(&context));
        }
        diagnostics.extend(validate_label_usage(&nodes, config));
        diagnostics.extend(validate_variable_usage(&nodes, &symbols, &config.discard_name));

        Self {
            nodes,
            symbols,
            scopes,
            diagnostics,
        }
    }
}

#[derive(Debug)]
pub struct Document<'a> {
    analyzer: &'a Analyzer,
    text: String,
    version: i32,
    line_index: LineIndex,
    snapshot: Snapshot,
}

impl<'a> Document<'a> {
    pub fn new(text: impl Into<String>, analyzer: &'a Analyzer) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        let snapshot = Snapshot::analyze(analyzer, &text);
        debug!(
            version = 0,
            nodes = snapshot.nodes.len(),
            diagnostics = snapshot.diagnostics.len(),
            "analyzed document"
        );
        Self {
            analyzer,
            text,
            version: 0,
            line_index,
            snapshot,
        }
    }

    /// Replaces the text and reanalyzes. Versions older than the current one
    /// are stale and leave the document untouched.
    pub fn update(&mut self, text: impl Into<String>, version: i32) -> bool {
        if version < self.version {
            debug!(version, current = self.version, "ignoring stale update");
            return false;
        }
        self.text = text.into();
        self.version = version;
        self.line_index = LineIndex::new(&self.text);
        self.snapshot = Snapshot::analyze(self.analyzer, &self.text);
        debug!(
            version,
            nodes = self.snapshot.nodes.len(),
            diagnostics = self.snapshot.diagnostics.len(),
            "analyzed document"
        );
        true
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.snapshot.nodes
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.snapshot.symbols
    }

    pub fn scopes(&self) -> &LabelScopeTree {
        &self.snapshot.scopes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.snapshot.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.snapshot
            .diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn offset_at(&self, position: Position) -> usize {
        self.line_index.to_offset(&self.text, position)
    }

    /// The statement the cursor belongs to. A line break or `;` between the
    /// statement's end and the cursor starts a new, empty statement.
    fn node_index_at(&self, offset: usize) -> Option<usize> {
        let nodes = &self.snapshot.nodes;
        let index = nodes
            .partition_point(|node| node.range().span.start <= offset)
            .checked_sub(1)?;
        let end = nodes[index].range().span.end;
        let gap = self.text.get(end.min(offset)..offset)?;
        (!gap.contains(['\n', '\r', ';'])).then_some(index)
    }

    pub fn completions(&self, position: Position) -> Vec<CompletionItem> {
        let offset = self.offset_at(position);
        let Some(index) = self.node_index_at(offset) else {
            return self.instruction_completions();
        };
        match &self.snapshot.nodes[index] {
            SyntaxNode::Instruction(instruction) => {
                if token_index_at(instruction.line.tokens(), offset) == 0 {
                    return self.instruction_completions();
                }
                let labels = labels_in_scope(&self.snapshot.nodes, &self.snapshot.scopes, index);
                let variables = self.variable_completions();
                let context = CompletionContext {
                    labels: &labels,
                    variables: &variables,
                };
                instruction.completions(offset, &context)
            }
            SyntaxNode::Comment { .. } | SyntaxNode::LabelDeclaration { .. } => Vec::new(),
        }
    }

    fn instruction_completions(&self) -> Vec<CompletionItem> {
        self.analyzer
            .registry
            .iter()
            .map(|entry| {
                let item = CompletionItem::new(entry.name, CompletionKind::Function);
                match entry.descriptor.signatures(entry.name).into_iter().next() {
                    Some(signature) => item.with_detail(signature.label),
                    None => item,
                }
            })
            .collect()
    }

    fn variable_completions(&self) -> Vec<CompletionItem> {
        let symbols = &self.snapshot.symbols;
        symbols
            .locals()
            .chain(symbols.builtins().iter())
            .map(|symbol| CompletionItem::new(symbol.name.clone(), symbol_completion_kind(symbol)))
            .collect()
    }

    pub fn hover(&self, position: Position) -> Option<Hover> {
        let offset = self.offset_at(position);
        let index = self.node_index_at(offset)?;
        let instruction = self.snapshot.nodes[index].instruction();
        if let Some(instruction) = instruction
            && token_index_at(instruction.line.tokens(), offset) == 0
        {
            return instruction.hover(offset);
        }

        let Some((target, range)) = self.target_at_offset(index, offset) else {
            return instruction?.hover(offset);
        };
        let contents = match &target {
            SymbolTarget::Label(name) => {
                let references = label_references(&self.snapshot.nodes, name);
                format!("label `{name}` ({} jumps)", references.references.len())
            }
            SymbolTarget::Variable(name) => match self.snapshot.symbols.lookup(name) {
                Some(symbol) => describe_symbol(symbol),
                None => format!("undefined variable `{name}`"),
            },
        };
        Some(Hover { range, contents })
    }

    pub fn signature_help(&self, position: Position) -> Option<SignatureHelp> {
        let offset = self.offset_at(position);
        let index = self.node_index_at(offset)?;
        self.snapshot.nodes[index].instruction()?.signature_help(offset)
    }

    pub fn semantic_tokens(&self) -> Vec<SemanticToken> {
        self.snapshot
            .nodes
            .iter()
            .flat_map(|node| node.token_semantics(self.analyzer.builtins))
            .collect()
    }

    pub fn encoded_semantic_tokens(&self) -> Vec<u32> {
        encode(&self.semantic_tokens())
    }

    pub fn code_actions(&self, diagnostic: &Diagnostic) -> Vec<CodeAction> {
        match self.node_index_at(diagnostic.range.span.start) {
            Some(index) => self.snapshot.nodes[index].code_actions(diagnostic),
            None => code_actions(diagnostic, &[]),
        }
    }

    pub fn target_at(&self, position: Position) -> Option<SymbolTarget> {
        let offset = self.offset_at(position);
        let index = self.node_index_at(offset)?;
        self.target_at_offset(index, offset).map(|(target, _)| target)
    }

    fn target_at_offset(&self, index: usize, offset: usize) -> Option<(SymbolTarget, TextRange)> {
        match &self.snapshot.nodes[index] {
            SyntaxNode::LabelDeclaration {
                name, name_token, ..
            } if name_token.span().touches(offset) => {
                Some((SymbolTarget::Label(name.clone()), label_name_range(name_token)))
            }
            SyntaxNode::Instruction(instruction) => {
                let parameter = instruction
                    .parsed
                    .parameters
                    .iter()
                    .filter(|parameter| parameter.role != ParamRole::Unused)
                    .find(|parameter| parameter.token.span().touches(offset))?;
                let token = &parameter.token;
                match parameter.kind {
                    ParamKind::Label if token.is_identifier() => {
                        Some((SymbolTarget::Label(token.content.clone()), token.range))
                    }
                    ParamKind::Variable => parameter
                        .variable_name()
                        .map(|name| (SymbolTarget::Variable(name.to_string()), token.range)),
                    ParamKind::Label | ParamKind::EnumMember => None,
                }
            }
            SyntaxNode::Comment { .. } | SyntaxNode::LabelDeclaration { .. } => None,
        }
    }

    /// Label declarations, or the writes that assign a variable.
    pub fn definition(&self, position: Position) -> Vec<TextRange> {
        match self.target_at(position) {
            Some(SymbolTarget::Label(name)) => {
                label_references(&self.snapshot.nodes, &name).definitions
            }
            Some(SymbolTarget::Variable(name)) => variable_references(&self.snapshot.nodes, &name)
                .into_iter()
                .filter(|reference| reference.role == ParamRole::Write)
                .map(|reference| reference.range)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn references(&self, position: Position, include_declaration: bool) -> Vec<TextRange> {
        match self.target_at(position) {
            Some(SymbolTarget::Label(name)) => {
                let references = label_references(&self.snapshot.nodes, &name);
                let mut ranges = Vec::new();
                if include_declaration {
                    ranges.extend(references.definitions);
                }
                ranges.extend(references.references);
                ranges
            }
            Some(SymbolTarget::Variable(name)) => variable_references(&self.snapshot.nodes, &name)
                .into_iter()
                .filter(|reference| include_declaration || reference.role != ParamRole::Write)
                .map(|reference| reference.range)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Edits renaming the label or local variable under the cursor. Built-ins
    /// and building links belong to the processor and cannot be renamed.
    pub fn rename(&self, position: Position, new_name: &str) -> Option<Vec<TextEdit>> {
        let new_name = new_name.trim();
        if !is_valid_name(new_name) || self.analyzer.builtins.contains(new_name) {
            return None;
        }
        let target = self.target_at(position)?;
        if let SymbolTarget::Variable(name) = &target {
            let symbol = self.snapshot.symbols.lookup(name);
            if symbol.is_some_and(|symbol| symbol.flags.global) {
                return None;
            }
        }
        let edits: Vec<TextEdit> = self
            .references(position, true)
            .into_iter()
            .map(|range| TextEdit {
                range,
                new_text: new_name.to_string(),
            })
            .collect();
        (!edits.is_empty()).then_some(edits)
    }
}

fn symbol_completion_kind(symbol: &Symbol) -> CompletionKind {
    if symbol.flags.keyword {
        CompletionKind::Keyword
    } else if symbol.flags.global && !symbol.flags.writeable {
        CompletionKind::Constant
    } else {
        CompletionKind::Variable
    }
}

fn describe_symbol(symbol: &Symbol) -> String {
    let flags = symbol.flags;
    let what = if flags.keyword {
        "keyword"
    } else if flags.building_link {
        "building link"
    } else if flags.global && flags.writeable {
        "writeable built-in"
    } else if flags.global {
        "read-only built-in"
    } else {
        "variable"
    };
    format!("{what} `{}`", symbol.name)
}

/// Whether `name` survives tokenization as a single plain identifier.
fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('@') {
        return false;
    }
    name.chars()
        .all(|ch| !ch.is_whitespace() && !matches!(ch, '#' | ';' | '"'))
        && Token::new(TextRange::default(), name).is_identifier()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::DiagnosticCode;

    fn codes(document: &Document<'_>) -> Vec<DiagnosticCode> {
        document
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.code)
            .collect()
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn diagnostics_follow_pipeline_order() {
        let analyzer = Analyzer::default();
        let document = Document::new(
            "print \"hi\nset x 1\nfrob\njump nowhere always\nprint y",
            &analyzer,
        );
        assert_eq!(
            codes(&document),
            [
                DiagnosticCode::UnclosedString,
                DiagnosticCode::UnknownInstruction,
                DiagnosticCode::UndefinedLabel,
                DiagnosticCode::UnusedVariable,
                DiagnosticCode::UndefinedVariable,
            ]
        );
        assert!(document.has_errors());
    }

    #[test]
    fn clean_program_has_no_diagnostics() {
        let analyzer = Analyzer::default();
        let document = Document::new(
            "loop:\n  sensor t @unit @totalItems\n  print t\n  printflush message1\n  jump loop always",
            &analyzer,
        );
        assert_eq!(codes(&document), []);
        assert!(!document.has_errors());
    }

    #[test]
    fn config_limits_apply() {
        let analyzer = Analyzer::new(AnalyzerConfig {
            max_instructions: 1,
            ..AnalyzerConfig::default()
        });
        let document = Document::new("end\nend", &analyzer);
        assert_eq!(codes(&document), [DiagnosticCode::TooManyInstructions]);
    }

    #[test]
    fn stale_updates_are_ignored() {
        let analyzer = Analyzer::default();
        let mut document = Document::new("end", &analyzer);
        assert!(document.update("set x 1", 3));
        assert_eq!(document.version(), 3);
        assert_eq!(codes(&document), [DiagnosticCode::UnusedVariable]);

        assert!(!document.update("frob", 2));
        assert_eq!(document.text(), "set x 1");
        assert_eq!(document.version(), 3);
    }

    #[test]
    fn completes_instruction_names_on_blank_lines() {
        let analyzer = Analyzer::default();
        let document = Document::new("set x 1\n\nend", &analyzer);
        let items = document.completions(Position::new(1, 0));
        assert_eq!(items.len(), analyzer.registry().len());
        let draw = items.iter().find(|item| item.label == "draw").expect("draw");
        assert_eq!(draw.kind, CompletionKind::Function);
        assert_eq!(draw.detail.as_deref(), Some("draw clear r g b"));

        let after_semicolon = Document::new("set x 1; ", &analyzer);
        let items = after_semicolon.completions(Position::new(0, 9));
        assert_eq!(items.len(), analyzer.registry().len());
    }

    #[test]
    fn completes_labels_in_scope_for_jump_targets() {
        let analyzer = Analyzer::default();
        let text = "start:\n  inner:\n    end\nsub:\n  deep:\n  jump ";
        let document = Document::new(text, &analyzer);
        let items = document.completions(Position::new(5, 7));
        assert_eq!(labels(&items), ["start", "sub", "deep"]);
        assert!(items.iter().all(|item| item.kind == CompletionKind::Label));
    }

    #[test]
    fn completes_variables_and_builtins_for_operands() {
        let analyzer = Analyzer::default();
        let document = Document::new("set speed 1\nprint ", &analyzer);
        let items = document.completions(Position::new(1, 6));
        let speed = items.iter().find(|item| item.label == "speed").expect("speed");
        assert_eq!(speed.kind, CompletionKind::Variable);
        let unit = items.iter().find(|item| item.label == "@unit").expect("@unit");
        assert_eq!(unit.kind, CompletionKind::Constant);
        let truth = items.iter().find(|item| item.label == "true").expect("true");
        assert_eq!(truth.kind, CompletionKind::Keyword);
    }

    #[test]
    fn no_completions_in_comments_or_label_lines() {
        let analyzer = Analyzer::default();
        let document = Document::new("# note\nstart:", &analyzer);
        assert!(document.completions(Position::new(0, 3)).is_empty());
        assert!(document.completions(Position::new(1, 3)).is_empty());
    }

    #[test]
    fn hovers_instruction_names_and_symbols() {
        let analyzer = Analyzer::default();
        let document = Document::new("start:\nset x @unit\njump start always", &analyzer);

        let hover = document.hover(Position::new(1, 1)).expect("name hover");
        assert!(hover.contents.contains("set variable value"));

        let hover = document.hover(Position::new(1, 5)).expect("variable hover");
        assert_eq!(hover.contents, "variable `x`");

        let hover = document.hover(Position::new(1, 8)).expect("builtin hover");
        assert_eq!(hover.contents, "read-only built-in `@unit`");

        let hover = document.hover(Position::new(2, 6)).expect("label hover");
        assert_eq!(hover.contents, "label `start` (1 jumps)");
    }

    #[test]
    fn signature_help_tracks_the_cursor() {
        let analyzer = Analyzer::default();
        let document = Document::new("draw line 0 0 ", &analyzer);
        let help = document
            .signature_help(Position::new(0, 14))
            .expect("signature help");
        assert_eq!(help.active_parameter, Some(3));
        assert!(document.signature_help(Position::new(0, 20)).is_some());
    }

    #[test]
    fn semantic_tokens_cover_every_statement() {
        let analyzer = Analyzer::default();
        let document = Document::new("# hi\nstart:\nset @counter 0", &analyzer);
        let tokens = document.semantic_tokens();
        assert_eq!(tokens.len(), 5);
        let encoded = document.encoded_semantic_tokens();
        assert_eq!(encoded.len(), 25);
        // Comment on line 0, label declaration on line 1.
        assert_eq!(&encoded[..5], &[0, 0, 4, 0, 0]);
        assert_eq!(&encoded[5..10], &[1, 0, 6, 4, 2]);
    }

    #[test]
    fn code_actions_resolve_through_the_owning_statement() {
        let analyzer = Analyzer::default();
        let document = Document::new("set x 1\nend extra", &analyzer);
        let unused = document
            .diagnostics()
            .iter()
            .find(|diagnostic| diagnostic.code == DiagnosticCode::UnusedParameter)
            .expect("unused parameter");
        let actions = document.code_actions(unused);
        assert_eq!(actions.len(), 1);

        let unused_variable = document
            .diagnostics()
            .iter()
            .find(|diagnostic| diagnostic.code == DiagnosticCode::UnusedVariable)
            .expect("unused variable");
        let actions = document.code_actions(unused_variable);
        assert_eq!(actions[0].title, "Discard with '_'");
        assert_eq!(actions[0].edits[0].new_text, "_");
    }

    #[test]
    fn navigates_labels() {
        let analyzer = Analyzer::default();
        let document = Document::new("loop:\nend\njump loop always\njump loop always", &analyzer);
        let definitions = document.definition(Position::new(2, 6));
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].start, Position::new(0, 0));
        assert_eq!(definitions[0].end, Position::new(0, 4));

        assert_eq!(document.references(Position::new(0, 1), true).len(), 3);
        assert_eq!(document.references(Position::new(0, 1), false).len(), 2);
    }

    #[test]
    fn navigates_variables() {
        let analyzer = Analyzer::default();
        let document = Document::new("set i 0\nop add i i 1\nprint i", &analyzer);
        let definitions = document.definition(Position::new(2, 6));
        assert_eq!(definitions.len(), 2);
        assert_eq!(document.references(Position::new(2, 6), true).len(), 4);
        assert_eq!(document.references(Position::new(2, 6), false).len(), 2);
    }

    #[test]
    fn renames_labels_without_colons() {
        let analyzer = Analyzer::default();
        let document = Document::new("loop:\njump loop always", &analyzer);
        let edits = document.rename(Position::new(1, 6), "again").expect("rename");
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].range.end, Position::new(0, 4));
        assert!(edits.iter().all(|edit| edit.new_text == "again"));
    }

    #[test]
    fn refuses_invalid_renames() {
        let analyzer = Analyzer::default();
        let document = Document::new("set x @unit\nprint x\nprint cell1", &analyzer);
        assert!(document.rename(Position::new(0, 4), "has space").is_none());
        assert!(document.rename(Position::new(0, 4), "@time").is_none());
        assert!(document.rename(Position::new(0, 4), "12").is_none());
        for literal in [".5", "+1", "%ff0000", "-3", "0x1f"] {
            assert!(
                document.rename(Position::new(0, 4), literal).is_none(),
                "{literal} tokenizes as a literal"
            );
        }
        assert!(document.rename(Position::new(0, 4), "done:").is_none());
        assert!(document.rename(Position::new(0, 8), "unit").is_none());
        assert!(document.rename(Position::new(2, 7), "bank1").is_none());
        assert_eq!(
            document.rename(Position::new(0, 4), "y").map(|edits| edits.len()),
            Some(2)
        );
    }
}
