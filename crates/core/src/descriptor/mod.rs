//! Declarative instruction schemas.
//!
//! A [`Descriptor`] lists the named slots of an instruction. Parsing,
//! validation, completion, hover and highlighting are all derived from it, so
//! an instruction kind only has to declare its shape once.

mod parse;
mod query;
mod validate;

use indexmap::IndexMap;

pub use parse::{InstructionParameter, ParamKind, ParamRole, ParsedInstruction, VariantSelection};
pub use query::{
    CodeAction, CompletionContext, CompletionItem, CompletionKind, CursorSlot, Hover, Signature,
    SignatureHelp, SignatureParameter, TextEdit, code_actions, operand_semantics, token_index_at,
    variable_semantics,
};
pub use validate::{ValidationContext, missing_parameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamTraits {
    pub is_output: bool,
    pub is_label: bool,
    pub restricted: Option<&'static [&'static str]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub traits: ParamTraits,
}

pub const fn param(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        traits: ParamTraits {
            is_output: false,
            is_label: false,
            restricted: None,
        },
    }
}

impl ParamSpec {
    pub const fn output(mut self) -> Self {
        self.traits.is_output = true;
        self
    }

    pub const fn label(mut self) -> Self {
        self.traits.is_label = true;
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.traits.restricted = Some(values);
        self
    }

    /// Slots whose value the processor never looks at.
    pub fn is_ignored(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// Shared prefix, a discriminant operand and one parameter list per variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overload {
    pub prefix: Vec<ParamSpec>,
    pub discriminant: &'static str,
    pub variants: IndexMap<&'static str, Vec<ParamSpec>>,
}

impl Overload {
    pub fn new(discriminant: &'static str) -> Self {
        Self {
            prefix: Vec::new(),
            discriminant,
            variants: IndexMap::new(),
        }
    }

    pub fn prefix(mut self, params: impl IntoIterator<Item = ParamSpec>) -> Self {
        self.prefix.extend(params);
        self
    }

    pub fn variant(
        mut self,
        key: &'static str,
        params: impl IntoIterator<Item = ParamSpec>,
    ) -> Self {
        self.variants.insert(key, params.into_iter().collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Single(Vec<ParamSpec>),
    Overload(Overload),
}

impl From<Overload> for Descriptor {
    fn from(overload: Overload) -> Self {
        Self::Overload(overload)
    }
}

/// One position in an instruction's operand list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Param(ParamSpec),
    Discriminant(&'static str),
}

impl Slot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Param(spec) => spec.name,
            Self::Discriminant(name) => name,
        }
    }
}

impl Descriptor {
    pub fn single(params: impl IntoIterator<Item = ParamSpec>) -> Self {
        Self::Single(params.into_iter().collect())
    }

    pub fn variant_keys(&self) -> Vec<&'static str> {
        match self {
            Self::Single(_) => Vec::new(),
            Self::Overload(overload) => overload.variants.keys().copied().collect(),
        }
    }

    /// Slots in operand order. For an overload whose variant is not resolved
    /// the layout stops at the discriminant.
    pub fn layout(&self, variant: &VariantSelection) -> Vec<Slot> {
        match self {
            Self::Single(params) => params.iter().copied().map(Slot::Param).collect(),
            Self::Overload(overload) => {
                let mut slots: Vec<Slot> =
                    overload.prefix.iter().copied().map(Slot::Param).collect();
                slots.push(Slot::Discriminant(overload.discriminant));
                if let VariantSelection::Selected { key, .. } = variant
                    && let Some(params) = overload.variants.get(key)
                {
                    slots.extend(params.iter().copied().map(Slot::Param));
                }
                slots
            }
        }
    }

    /// Every complete layout: one for a single descriptor, one per variant
    /// for an overload.
    pub fn all_layouts(&self) -> Vec<(Option<&'static str>, Vec<Slot>)> {
        match self {
            Self::Single(_) => vec![(None, self.layout(&VariantSelection::Single))],
            Self::Overload(overload) => overload
                .variants
                .keys()
                .enumerate()
                .map(|(index, key)| {
                    let selection = VariantSelection::Selected { index, key };
                    (Some(*key), self.layout(&selection))
                })
                .collect(),
        }
    }
}
