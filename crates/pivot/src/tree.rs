//! The header tree: the nested hierarchy of grouped values along one pivot
//! axis, with bottom-up span arithmetic. Nodes live in an arena and refer to
//! each other by index, so the parent back-reference is non-owning and the
//! tree stays acyclic by construction.

use model::Facet;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAxis {
    Row,
    Column,
}

/// Per-node aggregates. `count` is always populated from the grouped query;
/// `sum` and `avg` are present only for numeric facet values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub count: i64,
    pub sum: Option<f64>,
    pub avg: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct HeaderNode {
    /// Path-joined id: `path.join("|")`.
    pub id: String,
    pub facet_id: String,
    pub value: String,
    pub label: String,
    /// `path.len() - 1`.
    pub depth: usize,
    /// Number of visible leaf positions this header occupies. Always >= 1; a
    /// collapsed or leaf node has span 1, an expanded internal node the sum
    /// of its children's spans.
    pub span: usize,
    pub start_index: usize,
    pub collapsed: bool,
    pub path: Vec<String>,
    pub aggregate: Aggregate,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl HeaderNode {
    /// A terminal occupies exactly one leaf position: either a true leaf or a
    /// collapsed subtree.
    pub fn is_terminal(&self) -> bool {
        self.collapsed || self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct HeaderTree {
    pub axis: HeaderAxis,
    pub facets: Vec<Facet>,
    pub nodes: Vec<HeaderNode>,
    pub roots: Vec<NodeId>,
    /// Equals `facets.len()`.
    pub max_depth: usize,
    pub leaf_count: usize,
    /// Visible terminals in left-to-right traversal order.
    pub leaves: Vec<NodeId>,
}

impl HeaderTree {
    pub fn node(&self, id: NodeId) -> &HeaderNode {
        &self.nodes[id]
    }

    /// Depth-first search over the roots for a node with the given
    /// path-joined id. A missing node is a value, not an error.
    pub fn find_node(&self, id: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(node_id) = stack.pop() {
            if self.nodes[node_id].id == id {
                return Some(node_id);
            }
            stack.extend(self.nodes[node_id].children.iter().rev());
        }
        None
    }

    /// Emits nodes in traversal order, skipping the children of collapsed
    /// nodes.
    pub fn flatten(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(node_id) = stack.pop() {
            out.push(node_id);
            if !self.nodes[node_id].collapsed {
                stack.extend(self.nodes[node_id].children.iter().rev());
            }
        }
        out
    }

    /// Flips the collapse state of the named node and recomputes spans,
    /// indices, and leaves. Returns false when no such node exists.
    pub fn toggle_collapse(&mut self, id: &str) -> bool {
        let node_id = match self.find_node(id) {
            Some(node_id) => node_id,
            None => return false,
        };
        self.nodes[node_id].collapsed = !self.nodes[node_id].collapsed;
        self.recalculate();
        true
    }

    /// Recomputes spans, start indices, and the leaf list without re-sorting
    /// or re-aggregating. Called after any collapse-state mutation.
    pub fn recalculate(&mut self) {
        let mut leaves = Vec::new();
        let mut cursor = 0;
        let roots = self.roots.clone();
        for root in roots {
            cursor = self.assign(root, cursor, &mut leaves);
        }
        self.leaf_count = leaves.len();
        self.leaves = leaves;
    }

    // Recursion depth is bounded by the facet count, which is small.
    fn assign(&mut self, node_id: NodeId, start: usize, leaves: &mut Vec<NodeId>) -> usize {
        self.nodes[node_id].start_index = start;
        if self.nodes[node_id].is_terminal() {
            self.nodes[node_id].span = 1;
            leaves.push(node_id);
            return start + 1;
        }
        let children = self.nodes[node_id].children.clone();
        let mut cursor = start;
        for child in children {
            cursor = self.assign(child, cursor, leaves);
        }
        self.nodes[node_id].span = cursor - start;
        cursor
    }
}
