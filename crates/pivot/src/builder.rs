//! Folds flat grouped query rows into a header tree: build, sort, then the
//! span/index pass shared with recalculation.

use crate::label;
use crate::tree::{Aggregate, HeaderAxis, HeaderNode, HeaderTree, NodeId};
use model::{DataType, Facet, SortOrder};
use std::cmp::Ordering;
use std::collections::HashMap;
use store::HeaderRow;

/// Builds the tree for one axis. Rows are walked in query order; each row
/// contributes its card count to every node on its facet path, so aggregates
/// accumulate bottom-up as a side effect of the fold.
pub fn build_tree(axis: HeaderAxis, facets: &[Facet], rows: &[HeaderRow]) -> HeaderTree {
    let mut tree = HeaderTree {
        axis,
        facets: facets.to_vec(),
        nodes: Vec::new(),
        roots: Vec::new(),
        max_depth: facets.len(),
        leaf_count: 0,
        leaves: Vec::new(),
    };

    let mut by_id: HashMap<String, NodeId> = HashMap::new();
    for row in rows {
        let mut path: Vec<String> = Vec::with_capacity(facets.len());
        let mut parent: Option<NodeId> = None;
        for facet in facets {
            let value = row.get_string(&facet.id).to_string();
            path.push(value.clone());
            let id = path.join("|");

            let node_id = match by_id.get(&id) {
                Some(&node_id) => node_id,
                None => {
                    let node_id = tree.nodes.len();
                    tree.nodes.push(HeaderNode {
                        id: id.clone(),
                        facet_id: facet.id.clone(),
                        label: label::format_label(facet, &value),
                        value,
                        depth: path.len() - 1,
                        span: 1,
                        start_index: 0,
                        collapsed: false,
                        path: path.clone(),
                        aggregate: Aggregate::default(),
                        children: Vec::new(),
                        parent,
                    });
                    by_id.insert(id, node_id);
                    match parent {
                        Some(parent_id) => tree.nodes[parent_id].children.push(node_id),
                        None => tree.roots.push(node_id),
                    }
                    node_id
                }
            };
            tree.nodes[node_id].aggregate.count += row.get_count();
            parent = Some(node_id);
        }
    }

    sort_children(&mut tree);
    numeric_aggregates(&mut tree);
    tree.recalculate();
    tracing::debug!(
        nodes = tree.nodes.len(),
        roots = tree.roots.len(),
        leaves = tree.leaf_count,
        "built header tree"
    );
    tree
}

/// Depth-first child sort. Each level is ordered by the sort order of that
/// level's facet.
fn sort_children(tree: &mut HeaderTree) {
    let facets = tree.facets.clone();
    if facets.is_empty() {
        return;
    }

    let mut roots = std::mem::take(&mut tree.roots);
    sort_level(tree, &mut roots, &facets[0]);
    tree.roots = roots;

    for node_id in 0..tree.nodes.len() {
        let child_depth = tree.nodes[node_id].depth + 1;
        if child_depth >= facets.len() || tree.nodes[node_id].children.is_empty() {
            continue;
        }
        let mut children = std::mem::take(&mut tree.nodes[node_id].children);
        sort_level(tree, &mut children, &facets[child_depth]);
        tree.nodes[node_id].children = children;
    }
}

fn sort_level(tree: &HeaderTree, siblings: &mut [NodeId], facet: &Facet) {
    match facet.sort_order {
        SortOrder::Asc => {
            siblings.sort_by(|a, b| compare_values(facet, &tree.nodes[*a].value, &tree.nodes[*b].value))
        }
        SortOrder::Desc => siblings.sort_by(|a, b| {
            compare_values(facet, &tree.nodes[*b].value, &tree.nodes[*a].value)
        }),
        // Explicit option order; unknown values keep their incoming order at
        // the end (the sort is stable).
        SortOrder::Custom => siblings.sort_by_key(|node_id| {
            facet
                .options
                .iter()
                .position(|option| option == &tree.nodes[*node_id].value)
                .unwrap_or(usize::MAX)
        }),
    }
}

fn compare_values(facet: &Facet, a: &str, b: &str) -> Ordering {
    if facet.data_type == DataType::Number {
        if let (Ok(a), Ok(b)) = (a.parse::<f64>(), b.parse::<f64>()) {
            if let Some(ordering) = a.partial_cmp(&b) {
                return ordering;
            }
        }
    }
    caseless::default_case_fold_str(a)
        .cmp(&caseless::default_case_fold_str(b))
        .then_with(|| a.cmp(b))
}

/// Fills `sum`/`avg` for numeric facet levels: a node whose own value parses
/// as a number contributes `value * count`; internal nodes on non-numeric
/// levels roll their children up.
fn numeric_aggregates(tree: &mut HeaderTree) {
    let roots = tree.roots.clone();
    for root in roots {
        fill_numeric(tree, root);
    }
}

fn fill_numeric(tree: &mut HeaderTree, node_id: NodeId) -> Option<f64> {
    let children = tree.nodes[node_id].children.clone();
    let own = tree.nodes[node_id].value.parse::<f64>().ok();

    let sum = match own {
        Some(value) => Some(value * tree.nodes[node_id].aggregate.count as f64),
        None => {
            let mut total = None;
            for child in &children {
                if let Some(child_sum) = fill_numeric(tree, *child) {
                    total = Some(total.unwrap_or(0.0) + child_sum);
                }
            }
            total
        }
    };
    // Descend even when this node contributed its own value, so deeper
    // numeric levels are filled too.
    if own.is_some() {
        for child in children {
            fill_numeric(tree, child);
        }
    }

    if let Some(sum) = sum {
        let count = tree.nodes[node_id].aggregate.count;
        let node = &mut tree.nodes[node_id];
        node.aggregate.sum = Some(sum);
        if count > 0 {
            node.aggregate.avg = Some(sum / count as f64);
        }
    }
    sum
}
