use crate::builtins::{Builtins, is_building_link};
use crate::diag::{Diagnostic, DiagnosticCode, DiagnosticTag};
use crate::lexer::StatementLine;
use crate::suggest::nearest;
use crate::token::{Token, TokenKind};

use super::{Descriptor, ParamRole, ParsedInstruction, Slot, VariantSelection};

#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub discard_name: &'a str,
    pub builtins: &'a Builtins,
}

impl Descriptor {
    pub fn validate(
        &self,
        parsed: &ParsedInstruction,
        line: &StatementLine,
        context: &ValidationContext<'_>,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.check_variant(parsed, &mut diagnostics);
        check_missing(parsed, line, &mut diagnostics);

        let layout = self.layout(&parsed.variant);
        for parameter in &parsed.parameters {
            let token = &parameter.token;
            if let Some(Slot::Param(spec)) = parameter.slot.and_then(|index| layout.get(index))
                && let Some(values) = spec.traits.restricted
                && !values.contains(&token.content.as_str())
            {
                let mut diagnostic = Diagnostic::warning(
                    DiagnosticCode::InvalidEnumMember,
                    token.range,
                    format!("'{}' is not a valid value for '{}'", token.content, spec.name),
                );
                if let Some(suggestion) = nearest(&token.content, values.iter().copied()) {
                    diagnostic = diagnostic.with_suggestion(suggestion);
                }
                diagnostics.push(diagnostic);
            }

            match parameter.role {
                ParamRole::Write => {
                    if let Some(reason) = readonly_reason(&parameter.token, context.builtins) {
                        diagnostics.push(Diagnostic::error(
                            DiagnosticCode::ReadonlyWrite,
                            token.range,
                            format!("cannot write to {reason} '{}'", token.content),
                        ));
                    }
                }
                ParamRole::Ignored if token.content != context.discard_name => {
                    diagnostics.push(
                        Diagnostic::hint(
                            DiagnosticCode::IgnoredValue,
                            token.range,
                            format!(
                                "'{}' is ignored by this instruction",
                                parameter.name.unwrap_or("value")
                            ),
                        )
                        .with_replacement(context.discard_name),
                    );
                }
                ParamRole::Unused => {
                    diagnostics.push(
                        Diagnostic::hint(
                            DiagnosticCode::UnusedParameter,
                            token.range,
                            "unused parameter",
                        )
                        .with_tag(DiagnosticTag::Unnecessary),
                    );
                }
                ParamRole::Read | ParamRole::Ignored => {}
            }

            if let Some(number) = token.number()
                && !number.exact
            {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::ExcessPrecision,
                        token.range,
                        format!("'{}' cannot be represented exactly", token.content),
                    )
                    .with_note("integers beyond 2^53 are rounded by the processor"),
                );
            }
        }

        diagnostics
    }

    fn check_variant(&self, parsed: &ParsedInstruction, diagnostics: &mut Vec<Diagnostic>) {
        let Self::Overload(overload) = self else {
            return;
        };
        if parsed.variant != VariantSelection::Unknown {
            return;
        }
        let Some(token) = parsed.get(overload.discriminant) else {
            return;
        };
        let mut diagnostic = Diagnostic::error(
            DiagnosticCode::UnknownVariant,
            token.range,
            format!("unknown {} '{}'", overload.discriminant, token.content),
        );
        if let Some(suggestion) = nearest(&token.content, overload.variants.keys().copied()) {
            diagnostic = diagnostic.with_suggestion(suggestion);
        }
        diagnostics.push(diagnostic);
    }
}

fn check_missing(
    parsed: &ParsedInstruction,
    line: &StatementLine,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let missing = parsed.missing_slots();
    if missing.is_empty() {
        return;
    }
    let noun = if missing.len() == 1 {
        "parameter"
    } else {
        "parameters"
    };
    diagnostics.push(Diagnostic::warning(
        DiagnosticCode::MissingParameter,
        line.range(),
        format!("missing {noun}: {}", missing.join(", ")),
    ));
}

fn readonly_reason(token: &Token, builtins: &Builtins) -> Option<&'static str> {
    if !matches!(token.kind, TokenKind::Identifier) {
        return Some(match token.kind {
            TokenKind::Number(_) => "number",
            TokenKind::String(_) => "string",
            TokenKind::Color(_) => "color",
            _ => "literal",
        });
    }
    match builtins.get(&token.content) {
        Some(symbol) if symbol.flags.keyword => Some("keyword"),
        Some(symbol) if !symbol.flags.writeable => Some("read-only variable"),
        Some(_) => None,
        None if is_building_link(&token.content) => Some("building link"),
        None => None,
    }
}

/// Parameter names listed by a `missing-parameter` diagnostic.
pub fn missing_parameters(diagnostic: &Diagnostic) -> Vec<&str> {
    if diagnostic.code != DiagnosticCode::MissingParameter {
        return Vec::new();
    }
    diagnostic
        .message
        .split_once(": ")
        .map(|(_, names)| names.split(", ").collect())
        .unwrap_or_default()
}
