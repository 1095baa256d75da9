use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::config::AnalyzerConfig;
use crate::descriptor::ParamKind;
use crate::diag::{Diagnostic, DiagnosticCode, DiagnosticTag};
use crate::suggest::nearest;
use crate::syntax::SyntaxNode;
use crate::token::Token;

pub fn validate_label_usage(nodes: &[SyntaxNode], config: &AnalyzerConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut declarations: IndexMap<&str, Vec<&Token>> = IndexMap::new();
    for node in nodes {
        if let SyntaxNode::LabelDeclaration {
            name, name_token, ..
        } = node
        {
            declarations.entry(name.as_str()).or_default().push(name_token);
        }
    }

    for (name, tokens) in &declarations {
        let Some((first, rest)) = tokens.split_first() else {
            continue;
        };
        for duplicate in rest {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::DuplicateLabel,
                    duplicate.range,
                    format!("label '{name}' is already declared"),
                )
                .with_related(first.range, "first declared here"),
            );
        }
    }

    let instruction_count = nodes.iter().filter(|node| node.instruction().is_some()).count();
    let mut referenced: FxHashSet<&str> = FxHashSet::default();
    for instruction in nodes.iter().filter_map(SyntaxNode::instruction) {
        for parameter in &instruction.parsed.parameters {
            if parameter.kind != ParamKind::Label {
                continue;
            }
            let token = &parameter.token;
            if let Some(number) = token.number() {
                let in_range = number.value.fract() == 0.0
                    && number.value >= 0.0
                    && number.value < instruction_count as f64;
                if !in_range {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticCode::OutOfRangeValue,
                        token.range,
                        format!(
                            "jump target {} is outside the program (0..{instruction_count})",
                            token.content
                        ),
                    ));
                }
                diagnostics.push(
                    Diagnostic::hint(
                        DiagnosticCode::PreferLabels,
                        token.range,
                        "numeric jump targets break when instructions move",
                    )
                    .with_help("declare a label and jump to it instead"),
                );
            } else if token.is_identifier() {
                let name = token.content.as_str();
                referenced.insert(name);
                if !declarations.contains_key(name) {
                    let mut diagnostic = Diagnostic::error(
                        DiagnosticCode::UndefinedLabel,
                        token.range,
                        format!("label '{name}' is not declared"),
                    );
                    if let Some(suggestion) = nearest(name, declarations.keys().copied()) {
                        diagnostic = diagnostic.with_suggestion(suggestion);
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }
    }

    for (name, tokens) in &declarations {
        if referenced.contains(name) {
            continue;
        }
        for token in tokens {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::UnusedLabel,
                    token.range,
                    format!("label '{name}' is never jumped to"),
                )
                .with_tag(DiagnosticTag::Unnecessary),
            );
        }
    }

    let label_nodes = nodes.iter().filter(|node| node.label_name().is_some());
    for node in label_nodes.skip(config.max_labels) {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::TooManyLabels,
            node.line().first().range,
            format!("a processor holds at most {} labels", config.max_labels),
        ));
    }
    let instruction_nodes = nodes.iter().filter(|node| node.instruction().is_some());
    for node in instruction_nodes.skip(config.max_instructions) {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::TooManyInstructions,
            node.range(),
            format!(
                "a processor holds at most {} instructions",
                config.max_instructions
            ),
        ));
    }

    diagnostics
}
