use std::fmt::Write as _;

use crate::syntax::SyntaxNode;

pub type BlockId = usize;

/// A run of nodes owned by one label. The root block has no label and spans
/// the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelBlock {
    pub label_node: Option<usize>,
    pub label_indentation: Option<u32>,
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    pub parent: Option<BlockId>,
    pub children: Vec<BlockId>,
}

impl LabelBlock {
    pub fn contains(&self, index: usize) -> bool {
        self.start_index <= index && index < self.end_index
    }
}

/// Labels nested by indentation: a label indented deeper than the open
/// block's label opens a child block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelScopeTree {
    blocks: Vec<LabelBlock>,
}

impl LabelScopeTree {
    pub const ROOT: BlockId = 0;

    pub fn build(nodes: &[SyntaxNode]) -> Self {
        let mut blocks = vec![LabelBlock {
            label_node: None,
            label_indentation: None,
            start_index: 0,
            end_index: nodes.len(),
            parent: None,
            children: Vec::new(),
        }];
        let mut stack = vec![Self::ROOT];
        let mut previous_label: Option<usize> = None;

        for (index, node) in nodes.iter().enumerate() {
            if node.label_name().is_none() {
                continue;
            }
            let column = node.column();

            let mut closed = Vec::new();
            while let Some(&top) = stack.last()
                && top != Self::ROOT
                && blocks[top]
                    .label_indentation
                    .is_some_and(|indentation| indentation >= column)
            {
                closed.push(top);
                stack.pop();
            }
            let parent = stack.last().copied().unwrap_or(Self::ROOT);
            let parent_indentation = blocks[parent].label_indentation;

            // Documentation comments right above a label travel with it.
            let lower_bound = previous_label.map_or(0, |label| label + 1);
            let mut start = index;
            while start > lower_bound
                && nodes[start - 1].is_comment()
                && parent_indentation
                    .is_none_or(|indentation| nodes[start - 1].column() > indentation)
            {
                start -= 1;
            }

            for block in closed {
                blocks[block].end_index = start;
            }
            let id = blocks.len();
            blocks.push(LabelBlock {
                label_node: Some(index),
                label_indentation: Some(column),
                start_index: start,
                end_index: nodes.len(),
                parent: Some(parent),
                children: Vec::new(),
            });
            blocks[parent].children.push(id);
            stack.push(id);
            previous_label = Some(index);
        }

        Self { blocks }
    }

    pub fn block(&self, id: BlockId) -> &LabelBlock {
        &self.blocks[id]
    }

    pub fn root(&self) -> &LabelBlock {
        &self.blocks[Self::ROOT]
    }

    pub fn blocks(&self) -> &[LabelBlock] {
        &self.blocks
    }

    fn child_containing(&self, block: BlockId, index: usize) -> Option<BlockId> {
        self.blocks[block]
            .children
            .iter()
            .copied()
            .find(|child| self.blocks[*child].contains(index))
    }

    /// The deepest block whose span holds `index`.
    pub fn innermost_block(&self, index: usize) -> BlockId {
        let mut block = Self::ROOT;
        while let Some(child) = self.child_containing(block, index) {
            block = child;
        }
        block
    }

    /// Indented outline of the tree, one block per line.
    pub fn render(&self, nodes: &[SyntaxNode]) -> String {
        let mut output = String::new();
        self.render_block(nodes, Self::ROOT, 0, &mut output);
        output
    }

    fn render_block(&self, nodes: &[SyntaxNode], id: BlockId, depth: usize, output: &mut String) {
        let block = &self.blocks[id];
        let name = block
            .label_node
            .and_then(|index| nodes.get(index))
            .and_then(SyntaxNode::label_name)
            .unwrap_or("<root>");
        let _ = writeln!(
            output,
            "{:indent$}{name} [{}..{})",
            "",
            block.start_index,
            block.end_index,
            indent = depth * 2
        );
        for child in &block.children {
            self.render_block(nodes, *child, depth + 1, output);
        }
    }
}

/// Top-level labels plus the children of every nested block on the way down
/// to `index`.
pub fn labels_in_scope<'n>(
    nodes: &'n [SyntaxNode],
    tree: &LabelScopeTree,
    index: usize,
) -> Vec<&'n str> {
    let mut names = Vec::new();
    let mut block = Some(LabelScopeTree::ROOT);
    while let Some(id) = block {
        for child in &tree.block(id).children {
            if let Some(name) = tree
                .block(*child)
                .label_node
                .and_then(|node| nodes.get(node))
                .and_then(SyntaxNode::label_name)
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        block = tree.child_containing(id, index);
    }
    names
}
