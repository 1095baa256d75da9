use std::fmt;

use ariadne::{Color, ColorGenerator, Config, IndexType, Label, Report, ReportKind, Source};

use crate::span::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticTag {
    Unnecessary,
    Deprecated,
}

/// Stable identifiers attached to every diagnostic. Editors match quick fixes
/// on [`DiagnosticCode::as_str`], so the strings must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    UnclosedString,
    MissingSpace,
    TooManyTokens,
    UnexpectedToken,
    MissingParameter,
    UnknownInstruction,
    UnknownVariant,
    InvalidEnumMember,
    ReadonlyWrite,
    IgnoredValue,
    UnusedParameter,
    ExcessPrecision,
    DuplicateLabel,
    UndefinedLabel,
    OutOfRangeValue,
    PreferLabels,
    UnusedLabel,
    TooManyLabels,
    TooManyInstructions,
    UnusedVariable,
    UndefinedVariable,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 21] = [
        Self::UnclosedString,
        Self::MissingSpace,
        Self::TooManyTokens,
        Self::UnexpectedToken,
        Self::MissingParameter,
        Self::UnknownInstruction,
        Self::UnknownVariant,
        Self::InvalidEnumMember,
        Self::ReadonlyWrite,
        Self::IgnoredValue,
        Self::UnusedParameter,
        Self::ExcessPrecision,
        Self::DuplicateLabel,
        Self::UndefinedLabel,
        Self::OutOfRangeValue,
        Self::PreferLabels,
        Self::UnusedLabel,
        Self::TooManyLabels,
        Self::TooManyInstructions,
        Self::UnusedVariable,
        Self::UndefinedVariable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnclosedString => "unclosed-string",
            Self::MissingSpace => "missing-space",
            Self::TooManyTokens => "too-many-tokens",
            Self::UnexpectedToken => "unexpected-token",
            Self::MissingParameter => "missing-parameter",
            Self::UnknownInstruction => "unknown-instruction",
            Self::UnknownVariant => "unknown-variant",
            Self::InvalidEnumMember => "invalid-enum-member",
            Self::ReadonlyWrite => "readonly-write",
            Self::IgnoredValue => "ignored-value",
            Self::UnusedParameter => "unused-parameter",
            Self::ExcessPrecision => "excess-precision",
            Self::DuplicateLabel => "duplicate-label",
            Self::UndefinedLabel => "undefined-label",
            Self::OutOfRangeValue => "out-of-range-value",
            Self::PreferLabels => "prefer-labels",
            Self::UnusedLabel => "unused-label",
            Self::TooManyLabels => "too-many-labels",
            Self::TooManyInstructions => "too-many-instructions",
            Self::UnusedVariable => "unused-variable",
            Self::UndefinedVariable => "undefined-variable",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == code)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    pub range: TextRange,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Supplemental {
    Help(String),
    Note(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub range: TextRange,
    pub tags: Vec<DiagnosticTag>,
    pub related: Vec<RelatedInfo>,
    /// Replacement text offered by the quick fix for this diagnostic.
    pub suggestion: Option<String>,
    pub supplements: Vec<Supplemental>,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        code: DiagnosticCode,
        range: TextRange,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            range,
            tags: Vec::new(),
            related: Vec::new(),
            suggestion: None,
            supplements: Vec::new(),
        }
    }

    pub fn error(code: DiagnosticCode, range: TextRange, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, range, message)
    }

    pub fn warning(code: DiagnosticCode, range: TextRange, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, range, message)
    }

    pub fn hint(code: DiagnosticCode, range: TextRange, message: impl Into<String>) -> Self {
        Self::new(Severity::Hint, code, range, message)
    }

    pub fn with_tag(mut self, tag: DiagnosticTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_related(mut self, range: TextRange, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            range,
            message: message.into(),
        });
        self
    }

    /// Records a replacement and mirrors it as a "did you mean" help line.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        let suggestion = suggestion.into();
        self.supplements
            .push(Supplemental::Help(format!("did you mean '{suggestion}'?")));
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.suggestion = Some(replacement.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.supplements.push(Supplemental::Help(help.into()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.supplements.push(Supplemental::Note(note.into()));
        self
    }

    pub fn has_tag(&self, tag: DiagnosticTag) -> bool {
        self.tags.contains(&tag)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Information | Severity::Hint => ReportKind::Advice,
    }
}

fn primary_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Information => Color::Blue,
        Severity::Hint => Color::Cyan,
    }
}

pub fn plain_severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Information => "info",
        Severity::Hint => "hint",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub color: bool,
}

impl RenderOptions {
    pub const fn plain() -> Self {
        Self { color: false }
    }

    pub const fn colored() -> Self {
        Self { color: true }
    }
}

pub fn render_diagnostic_with_options(
    source_name: &str,
    source_text: &str,
    diagnostic: &Diagnostic,
    options: RenderOptions,
) -> String {
    let primary_span = (source_name, diagnostic.range.span.as_range());
    let mut report = Report::build(report_kind(diagnostic.severity), primary_span.clone())
        .with_config(
            Config::default()
                .with_index_type(IndexType::Byte)
                .with_color(options.color),
        )
        .with_code(diagnostic.code.as_str())
        .with_message(diagnostic.message.clone())
        .with_label(
            Label::new(primary_span)
                .with_color(primary_color(diagnostic.severity))
                .with_priority(100)
                .with_order(0)
                .with_message("here"),
        );

    let mut colors = ColorGenerator::new();
    for (index, related) in diagnostic.related.iter().enumerate() {
        report = report.with_label(
            Label::new((source_name, related.range.span.as_range()))
                .with_color(colors.next())
                .with_order((index + 1) as i32)
                .with_message(related.message.clone()),
        );
    }

    for supplement in &diagnostic.supplements {
        report = match supplement {
            Supplemental::Help(help) => report.with_help(help.clone()),
            Supplemental::Note(note) => report.with_note(note.clone()),
        };
    }

    let mut output = Vec::new();
    if report
        .finish()
        .write((source_name, Source::from(source_text)), &mut output)
        .is_ok()
    {
        return String::from_utf8_lossy(&output).into_owned();
    }

    let mut fallback = format!(
        "{}[{}]: {}\n --> {}:{}:{}",
        plain_severity_name(diagnostic.severity),
        diagnostic.code,
        diagnostic.message,
        source_name,
        diagnostic.range.start.line + 1,
        diagnostic.range.start.column + 1
    );
    for supplement in &diagnostic.supplements {
        match supplement {
            Supplemental::Help(help) => fallback.push_str(&format!("\nHelp: {help}")),
            Supplemental::Note(note) => fallback.push_str(&format!("\nNote: {note}")),
        }
    }
    fallback
}

pub fn render_diagnostics_with_options(
    source_name: &str,
    source_text: &str,
    diagnostics: &[Diagnostic],
    options: RenderOptions,
) -> String {
    diagnostics
        .iter()
        .map(|diag| render_diagnostic_with_options(source_name, source_text, diag, options))
        .collect::<Vec<_>>()
        .join("\n")
}
