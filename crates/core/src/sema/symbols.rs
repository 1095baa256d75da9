use indexmap::IndexMap;

use crate::builtins::{Builtins, LINK_BACKFILL_LIMIT, split_building_link};
use crate::descriptor::{ParamKind, ParamRole};
use crate::syntax::SyntaxNode;
use crate::token::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolFlags {
    pub keyword: bool,
    pub writeable: bool,
    pub global: bool,
    pub building_link: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub flags: SymbolFlags,
    pub color: Option<Rgba>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, flags: SymbolFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }
}

/// Names visible in one document: the processor's built-ins plus whatever
/// the program writes or links.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    builtins: &'static Builtins,
    locals: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn build(nodes: &[SyntaxNode], builtins: &'static Builtins, discard_name: &str) -> Self {
        let mut table = Self {
            builtins,
            locals: IndexMap::new(),
        };

        for instruction in nodes.iter().filter_map(SyntaxNode::instruction) {
            for parameter in &instruction.parsed.parameters {
                let Some(name) = parameter.variable_name() else {
                    continue;
                };
                if builtins.contains(name) {
                    continue;
                }
                if let Some((alias, count)) = split_building_link(name) {
                    table.register_links(alias, count);
                    continue;
                }
                if parameter.role == ParamRole::Write
                    && parameter.kind == ParamKind::Variable
                    && name != discard_name
                    && !table.locals.contains_key(name)
                {
                    let flags = SymbolFlags {
                        writeable: true,
                        ..SymbolFlags::default()
                    };
                    table
                        .locals
                        .insert(name.to_string(), Symbol::new(name, flags));
                }
            }
        }
        table
    }

    /// Seeing `cell3` implies the processor also has `cell1` and `cell2`.
    fn register_links(&mut self, alias: &str, count: u32) {
        for index in 1..=count.min(LINK_BACKFILL_LIMIT) {
            self.register_link(format!("{alias}{index}"));
        }
        if count > LINK_BACKFILL_LIMIT {
            self.register_link(format!("{alias}{count}"));
        }
    }

    fn register_link(&mut self, name: String) {
        if self.locals.contains_key(&name) {
            return;
        }
        let flags = SymbolFlags {
            global: true,
            building_link: true,
            ..SymbolFlags::default()
        };
        self.locals.insert(name.clone(), Symbol::new(name, flags));
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.builtins.get(name).or_else(|| self.locals.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn local(&self, name: &str) -> Option<&Symbol> {
        self.locals.get(name)
    }

    pub fn locals(&self) -> impl Iterator<Item = &Symbol> {
        self.locals.values()
    }

    pub fn builtins(&self) -> &'static Builtins {
        self.builtins
    }

    /// Every visible name, locals first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locals
            .keys()
            .map(String::as_str)
            .chain(self.builtins.iter().map(|symbol| symbol.name.as_str()))
    }
}
