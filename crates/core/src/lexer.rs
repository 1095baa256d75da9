use logos::Logos;
use tracing::trace;

use crate::diag::{Diagnostic, DiagnosticCode};
use crate::span::{LineIndex, Span, TextRange};
use crate::token::Token;

/// Raw fragments of a line. Classification of the resulting tokens happens
/// afterwards in [`Token::new`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip(r"[ \t\x0B\x0C]+"))]
enum Fragment {
    #[regex(r"\r\n|\n|\r")]
    LineBreak,

    #[token(";")]
    Semicolon,

    #[token("#", bump_to_line_end)]
    Comment,

    #[token("\"", bump_string)]
    String(bool),

    #[regex(r#"[^ \t\x0B\x0C\r\n;#"]+"#)]
    Word,
}

fn bump_to_line_end(lex: &mut logos::Lexer<Fragment>) {
    let rest = lex.remainder();
    let len = rest.find(['\r', '\n']).unwrap_or(rest.len());
    lex.bump(len);
}

/// Consumes through the closing quote, or up to the line break when the
/// string is left open. Yields whether the string was terminated.
fn bump_string(lex: &mut logos::Lexer<Fragment>) -> bool {
    let rest = lex.remainder();
    match rest.find(['"', '\r', '\n']) {
        Some(index) if rest.as_bytes()[index] == b'"' => {
            lex.bump(index + 1);
            true
        }
        Some(index) => {
            lex.bump(index);
            false
        }
        None => {
            lex.bump(rest.len());
            false
        }
    }
}

/// The tokens of one statement. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementLine {
    tokens: Vec<Token>,
}

impl StatementLine {
    pub fn new(tokens: Vec<Token>) -> Option<Self> {
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn first(&self) -> &Token {
        &self.tokens[0]
    }

    pub fn last(&self) -> &Token {
        &self.tokens[self.tokens.len() - 1]
    }

    pub fn range(&self) -> TextRange {
        TextRange::cover(self.first().range, self.last().range)
    }

    /// Tokens after the first one, without a trailing comment.
    pub fn operands(&self) -> &[Token] {
        let end = if self.tokens.len() > 1 && self.last().is_comment() {
            self.tokens.len() - 1
        } else {
            self.tokens.len()
        };
        &self.tokens[1.min(end)..end]
    }

    pub fn trailing_comment(&self) -> Option<&Token> {
        (self.tokens.len() > 1 && self.last().is_comment()).then(|| self.last())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tokenized {
    pub lines: Vec<StatementLine>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn tokenize(text: &str) -> Tokenized {
    let line_index = LineIndex::new(text);
    let mut lexer = Fragment::lexer(text);
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut diagnostics = Vec::new();

    while let Some(next) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        let fragment = next.unwrap_or(Fragment::Word);
        match fragment {
            Fragment::LineBreak | Fragment::Semicolon => flush_statement(&mut current, &mut lines),
            Fragment::Comment => {
                current.push(Token::new(line_index.range(text, span), lexer.slice()));
            }
            Fragment::String(terminated) => {
                let token_range = line_index.range(text, span);
                current.push(Token::new(token_range, lexer.slice()));
                if !terminated {
                    diagnostics.push(
                        Diagnostic::error(
                            DiagnosticCode::UnclosedString,
                            token_range,
                            "unclosed string literal",
                        )
                        .with_help("add a closing '\"' before the end of the line"),
                    );
                } else {
                    check_trailing_space(text, &line_index, span.end, &mut diagnostics);
                }
            }
            Fragment::Word => {
                current.push(Token::new(line_index.range(text, span), lexer.slice()));
                check_trailing_space(text, &line_index, span.end, &mut diagnostics);
            }
        }
    }
    flush_statement(&mut current, &mut lines);

    for line in &mut lines {
        apply_compatibility_rewrites(line);
    }

    trace!(
        statements = lines.len(),
        diagnostics = diagnostics.len(),
        "tokenized document"
    );
    Tokenized { lines, diagnostics }
}

fn flush_statement(current: &mut Vec<Token>, lines: &mut Vec<StatementLine>) {
    if let Some(line) = StatementLine::new(std::mem::take(current)) {
        lines.push(line);
    }
}

fn check_trailing_space(
    text: &str,
    line_index: &LineIndex,
    end: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(next) = text[end..].chars().next() else {
        return;
    };
    if next.is_whitespace() || next == ';' || next == '#' {
        return;
    }
    let span = Span::new(end, end + next.len_utf8());
    diagnostics.push(
        Diagnostic::warning(
            DiagnosticCode::MissingSpace,
            line_index.range(text, span),
            "missing space between tokens",
        )
        .with_replacement(format!(" {next}")),
    );
}

/// Renames kept for sources written against older processor versions.
fn apply_compatibility_rewrites(line: &mut StatementLine) {
    let is_op = line.tokens[0].content == "op";
    for (index, token) in line.tokens.iter_mut().enumerate().skip(1) {
        let replacement = match token.content.as_str() {
            "atan2" if is_op && index == 1 => "angle",
            "dst" if is_op && index == 1 => "len",
            "configure" => "config",
            "@configure" => "@config",
            _ => continue,
        };
        *token = Token::new(token.range, replacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;
    use crate::token::TokenKind;

    fn contents(line: &StatementLine) -> Vec<&str> {
        line.tokens()
            .iter()
            .map(|token| token.content.as_str())
            .collect()
    }

    #[test]
    fn splits_simple_statement() {
        let tokenized = tokenize("set x 5");
        assert_eq!(tokenized.lines.len(), 1);
        let line = &tokenized.lines[0];
        assert_eq!(contents(line), ["set", "x", "5"]);
        assert!(matches!(line.tokens()[0].kind, TokenKind::Identifier));
        assert!(matches!(line.tokens()[1].kind, TokenKind::Identifier));
        assert!(matches!(line.tokens()[2].kind, TokenKind::Number(_)));
        assert!(tokenized.diagnostics.is_empty());
    }

    #[test]
    fn unclosed_string_keeps_partial_token() {
        let tokenized = tokenize("print \"hello");
        let line = &tokenized.lines[0];
        assert_eq!(contents(line), ["print", "\"hello"]);
        assert!(matches!(line.tokens()[1].kind, TokenKind::String(_)));
        assert_eq!(tokenized.diagnostics.len(), 1);
        assert_eq!(
            tokenized.diagnostics[0].code,
            DiagnosticCode::UnclosedString
        );
    }

    #[test]
    fn unclosed_string_stops_at_line_end() {
        let tokenized = tokenize("print \"hello\nend");
        assert_eq!(tokenized.lines.len(), 2);
        assert_eq!(contents(&tokenized.lines[1]), ["end"]);
    }

    #[test]
    fn semicolons_and_carriage_returns_separate_statements() {
        let tokenized = tokenize("set a 1; set b 2\rend\r\n\n   \nstop");
        let statements: Vec<_> = tokenized.lines.iter().map(contents).collect();
        assert_eq!(
            statements,
            vec![
                vec!["set", "a", "1"],
                vec!["set", "b", "2"],
                vec!["end"],
                vec!["stop"],
            ]
        );
    }

    #[test]
    fn comments_swallow_semicolons() {
        let tokenized = tokenize("set a 1 # note; set b 2");
        assert_eq!(tokenized.lines.len(), 1);
        let line = &tokenized.lines[0];
        assert_eq!(contents(line), ["set", "a", "1", "# note; set b 2"]);
        assert_eq!(line.operands().len(), 2);
        assert!(line.trailing_comment().is_some());
    }

    #[test]
    fn reports_missing_space_after_string() {
        let tokenized = tokenize("print \"a\"b");
        assert_eq!(contents(&tokenized.lines[0]), ["print", "\"a\"", "b"]);
        assert_eq!(tokenized.diagnostics.len(), 1);
        let diagnostic = &tokenized.diagnostics[0];
        assert_eq!(diagnostic.code, DiagnosticCode::MissingSpace);
        assert_eq!(diagnostic.range.start, Position::new(0, 9));
    }

    #[test]
    fn reports_missing_space_before_string() {
        let tokenized = tokenize("print x\"a\"");
        assert_eq!(contents(&tokenized.lines[0]), ["print", "x", "\"a\""]);
        assert_eq!(tokenized.diagnostics.len(), 1);
        assert_eq!(tokenized.diagnostics[0].code, DiagnosticCode::MissingSpace);
    }

    #[test]
    fn comment_right_after_token_is_fine() {
        let tokenized = tokenize("end#done");
        assert!(tokenized.diagnostics.is_empty());
        assert_eq!(contents(&tokenized.lines[0]), ["end", "#done"]);
    }

    #[test]
    fn token_positions_track_lines_and_columns() {
        let tokenized = tokenize("end\n  jump loop always");
        let jump = &tokenized.lines[1].tokens()[1];
        assert_eq!(jump.content, "loop");
        assert_eq!(jump.range.start, Position::new(1, 7));
        assert_eq!(jump.range.end, Position::new(1, 11));
        assert_eq!(jump.range.span, Span::new(11, 15));
    }

    #[test]
    fn rewrites_legacy_names() {
        let tokenized =
            tokenize("op atan2 r a b\nop dst r a b\nucontrol configure @configure\nset dst 1");
        let statements: Vec<_> = tokenized.lines.iter().map(contents).collect();
        assert_eq!(statements[0], ["op", "angle", "r", "a", "b"]);
        assert_eq!(statements[1], ["op", "len", "r", "a", "b"]);
        assert_eq!(statements[2], ["ucontrol", "config", "@config"]);
        assert_eq!(statements[3], ["set", "dst", "1"]);
    }

    #[test]
    fn tokenizing_is_pure() {
        let text = "start:\n  print \"[red]hi\" # c\n jump start always;x\"y";
        assert_eq!(tokenize(text), tokenize(text));
    }
}
