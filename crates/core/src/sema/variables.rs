use rustc_hash::FxHashSet;

use crate::descriptor::ParamRole;
use crate::diag::{Diagnostic, DiagnosticCode, DiagnosticTag};
use crate::instructions::InstructionKind;
use crate::suggest::nearest;
use crate::syntax::SyntaxNode;

use super::SymbolTable;

/// Reports local writes whose name is read nowhere in the document and reads
/// of names nothing defines.
///
/// A read anywhere counts, before or after the write, since jumps can loop
/// back to an earlier read. So `print x` followed by `set x 1` is clean.
pub fn validate_variable_usage(
    nodes: &[SyntaxNode],
    symbols: &SymbolTable,
    discard_name: &str,
) -> Vec<Diagnostic> {
    let reads: FxHashSet<&str> = nodes
        .iter()
        .filter_map(SyntaxNode::instruction)
        .flat_map(|instruction| &instruction.parsed.parameters)
        .filter(|parameter| parameter.role == ParamRole::Read)
        .filter_map(|parameter| parameter.variable_name())
        .collect();

    let mut diagnostics = Vec::new();
    for instruction in nodes.iter().filter_map(SyntaxNode::instruction) {
        for parameter in &instruction.parsed.parameters {
            let Some(name) = parameter.variable_name() else {
                continue;
            };
            if name == discard_name {
                continue;
            }
            match parameter.role {
                ParamRole::Write => {
                    let is_local = symbols
                        .local(name)
                        .is_some_and(|symbol| symbol.flags.writeable);
                    if is_local && !reads.contains(name) {
                        diagnostics.push(
                            Diagnostic::warning(
                                DiagnosticCode::UnusedVariable,
                                parameter.token.range,
                                format!("'{name}' is written but never read"),
                            )
                            .with_tag(DiagnosticTag::Unnecessary)
                            .with_replacement(discard_name),
                        );
                    }
                }
                ParamRole::Read if instruction.kind != InstructionKind::Unknown => {
                    if symbols.contains(name) {
                        continue;
                    }
                    let mut diagnostic = Diagnostic::warning(
                        DiagnosticCode::UndefinedVariable,
                        parameter.token.range,
                        format!("'{name}' is never assigned"),
                    );
                    if let Some(suggestion) = nearest(name, symbols.names()) {
                        diagnostic = diagnostic.with_suggestion(suggestion);
                    }
                    diagnostics.push(diagnostic);
                }
                ParamRole::Read | ParamRole::Ignored | ParamRole::Unused => {}
            }
        }
    }
    diagnostics
}
