pub mod builtins;
pub mod config;
pub mod descriptor;
pub mod diag;
pub mod document;
pub mod instructions;
pub mod lexer;
pub mod sema;
pub mod semantic;
pub mod span;
pub mod suggest;
pub mod syntax;
pub mod token;

pub use config::{AnalyzerConfig, ConfigError};
pub use document::{Analyzer, Document, SymbolTarget};
pub use lexer::{StatementLine, Tokenized, tokenize};
pub use syntax::{SyntaxNode, SyntaxTree, build_tree};
