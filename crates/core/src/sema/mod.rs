//! Whole-document analysis over the syntax tree: symbol resolution, label
//! scoping and the usage passes.

mod labels;
mod references;
mod scope;
mod symbols;
mod variables;

pub use labels::validate_label_usage;
pub use references::{LabelReferences, VariableReference, label_references, variable_references};
pub use scope::{BlockId, LabelBlock, LabelScopeTree, labels_in_scope};
pub use symbols::{Symbol, SymbolFlags, SymbolTable};
pub use variables::validate_variable_usage;

#[cfg(test)]
mod tests;
