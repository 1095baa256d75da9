use indexmap::IndexMap;

use crate::token::Token;

use super::{Descriptor, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantSelection {
    Single,
    Selected { index: usize, key: &'static str },
    /// The discriminant operand names no variant.
    Unknown,
    /// The line ends before the discriminant.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    Read,
    Write,
    Ignored,
    Unused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Variable,
    Label,
    EnumMember,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionParameter {
    pub role: ParamRole,
    pub kind: ParamKind,
    pub token: Token,
    pub name: Option<&'static str>,
    /// Index into the descriptor layout, `None` past the end of it.
    pub slot: Option<usize>,
}

impl InstructionParameter {
    fn for_slot(slot: &Slot, index: usize, token: Token) -> Self {
        let (role, kind) = match slot {
            Slot::Discriminant(_) => (ParamRole::Read, ParamKind::EnumMember),
            Slot::Param(spec) => {
                let role = if spec.traits.is_output {
                    ParamRole::Write
                } else if spec.is_ignored() {
                    ParamRole::Ignored
                } else {
                    ParamRole::Read
                };
                let kind = if spec.traits.restricted.is_some() {
                    ParamKind::EnumMember
                } else if spec.traits.is_label {
                    ParamKind::Label
                } else {
                    ParamKind::Variable
                };
                (role, kind)
            }
        };
        Self {
            role,
            kind,
            token,
            name: Some(slot.name()),
            slot: Some(index),
        }
    }

    fn generic(token: Token, role: ParamRole) -> Self {
        Self {
            role,
            kind: ParamKind::Variable,
            token,
            name: None,
            slot: None,
        }
    }

    /// Identifier naming a variable, as opposed to a literal or an enum value.
    pub fn variable_name(&self) -> Option<&str> {
        (self.kind == ParamKind::Variable && self.token.is_identifier())
            .then_some(self.token.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInstruction {
    pub variant: VariantSelection,
    pub data: IndexMap<&'static str, Option<Token>>,
    pub parameters: Vec<InstructionParameter>,
}

impl ParsedInstruction {
    /// Operands of an instruction without a schema: every one is a plain read.
    pub fn generic(operands: &[Token]) -> Self {
        Self {
            variant: VariantSelection::Single,
            data: IndexMap::new(),
            parameters: operands
                .iter()
                .cloned()
                .map(|token| InstructionParameter::generic(token, ParamRole::Read))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Token> {
        self.data.get(name).and_then(Option::as_ref)
    }

    pub fn parameter(&self, name: &str) -> Option<&InstructionParameter> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == Some(name))
    }

    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut InstructionParameter> {
        self.parameters
            .iter_mut()
            .find(|parameter| parameter.name == Some(name))
    }

    /// Slots with no operand, in declaration order.
    pub fn missing_slots(&self) -> Vec<&'static str> {
        self.data
            .iter()
            .filter(|(_, token)| token.is_none())
            .map(|(name, _)| *name)
            .collect()
    }
}

impl Descriptor {
    pub fn select_variant(&self, operands: &[Token]) -> VariantSelection {
        let Self::Overload(overload) = self else {
            return VariantSelection::Single;
        };
        let Some(token) = operands.get(overload.prefix.len()) else {
            return VariantSelection::Missing;
        };
        match overload.variants.get_full(token.content.as_str()) {
            Some((index, key, _)) => VariantSelection::Selected { index, key },
            None => VariantSelection::Unknown,
        }
    }

    pub fn parse(&self, operands: &[Token]) -> ParsedInstruction {
        let variant = self.select_variant(operands);
        let layout = self.layout(&variant);
        let mut data = IndexMap::with_capacity(layout.len());
        let mut parameters = Vec::with_capacity(operands.len());

        for (index, slot) in layout.iter().enumerate() {
            let token = operands.get(index).cloned();
            if let Some(token) = &token {
                parameters.push(InstructionParameter::for_slot(slot, index, token.clone()));
            }
            data.insert(slot.name(), token);
        }

        // Past an unknown discriminant there is no schema to judge against.
        let overflow_role = match variant {
            VariantSelection::Unknown => ParamRole::Read,
            _ => ParamRole::Unused,
        };
        parameters.extend(
            operands
                .iter()
                .skip(layout.len())
                .cloned()
                .map(|token| InstructionParameter::generic(token, overflow_role)),
        );

        ParsedInstruction {
            variant,
            data,
            parameters,
        }
    }
}
