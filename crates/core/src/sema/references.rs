use crate::descriptor::{ParamKind, ParamRole};
use crate::span::TextRange;
use crate::syntax::{SyntaxNode, label_name_range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableReference {
    pub node_index: usize,
    pub range: TextRange,
    pub role: ParamRole,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReferences {
    /// Name ranges of every declaration, colon excluded.
    pub definitions: Vec<TextRange>,
    pub references: Vec<TextRange>,
}

impl LabelReferences {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.references.is_empty()
    }
}

pub fn variable_references(nodes: &[SyntaxNode], name: &str) -> Vec<VariableReference> {
    let mut references = Vec::new();
    for (node_index, node) in nodes.iter().enumerate() {
        let Some(instruction) = node.instruction() else {
            continue;
        };
        for parameter in &instruction.parsed.parameters {
            if parameter.role == ParamRole::Unused || parameter.variable_name() != Some(name) {
                continue;
            }
            references.push(VariableReference {
                node_index,
                range: parameter.token.range,
                role: parameter.role,
            });
        }
    }
    references
}

pub fn label_references(nodes: &[SyntaxNode], name: &str) -> LabelReferences {
    let mut result = LabelReferences::default();
    for node in nodes {
        match node {
            SyntaxNode::LabelDeclaration {
                name: declared,
                name_token,
                ..
            } if declared == name => result.definitions.push(label_name_range(name_token)),
            SyntaxNode::Instruction(instruction) => {
                result.references.extend(
                    instruction
                        .parsed
                        .parameters
                        .iter()
                        .filter(|parameter| parameter.kind == ParamKind::Label)
                        .filter(|parameter| parameter.token.is_identifier())
                        .filter(|parameter| parameter.token.content == name)
                        .map(|parameter| parameter.token.range),
                );
            }
            SyntaxNode::Comment { .. } | SyntaxNode::LabelDeclaration { .. } => {}
        }
    }
    result
}
