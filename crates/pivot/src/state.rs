//! The pivot state controller: owns the facet lists, both header trees, the
//! collapse set, selection, and layout dimensions. Trees are replaced
//! atomically; no observer ever sees one axis rebuilt and the other stale.
//! A controller belongs to one thread of control and must not be shared.

use crate::builder::build_tree;
use crate::tree::{HeaderAxis, HeaderTree};
use model::Facet;
use std::collections::BTreeSet;
use store::{run_header_query, HeaderQuery, QueryFilter, QueryOptions, DB};

#[derive(Debug, Clone, PartialEq)]
pub struct Dimensions {
    pub row_header_level_width: f64,
    pub col_header_level_height: f64,
    pub cell_min_width: f64,
    pub cell_min_height: f64,
    pub zoom: f64,
}

impl Default for Dimensions {
    fn default() -> Dimensions {
        Dimensions {
            row_header_level_width: 120.0,
            col_header_level_height: 28.0,
            cell_min_width: 80.0,
            cell_min_height: 28.0,
            zoom: 1.0,
        }
    }
}

/// A partial dimensions update; unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionsPatch {
    pub row_header_level_width: Option<f64>,
    pub col_header_level_height: Option<f64>,
    pub cell_min_width: Option<f64>,
    pub cell_min_height: Option<f64>,
    pub zoom: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PivotEvent {
    TreesRebuilt,
    LayoutChanged(Dimensions),
    SelectionChanged(Option<String>),
}

pub struct PivotController {
    row_facets: Vec<Facet>,
    col_facets: Vec<Facet>,
    filters: Vec<QueryFilter>,
    options: QueryOptions,
    row_tree: Option<HeaderTree>,
    col_tree: Option<HeaderTree>,
    collapsed_ids: BTreeSet<String>,
    selected_id: Option<String>,
    dimensions: Dimensions,
    observers: Vec<Box<dyn FnMut(&PivotEvent)>>,
}

impl PivotController {
    pub fn new() -> PivotController {
        PivotController {
            row_facets: Vec::new(),
            col_facets: Vec::new(),
            filters: Vec::new(),
            options: QueryOptions::default(),
            row_tree: None,
            col_tree: None,
            collapsed_ids: BTreeSet::new(),
            selected_id: None,
            dimensions: Dimensions::default(),
            observers: Vec::new(),
        }
    }

    pub fn row_tree(&self) -> Option<&HeaderTree> {
        self.row_tree.as_ref()
    }

    pub fn col_tree(&self) -> Option<&HeaderTree> {
        self.col_tree.as_ref()
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn collapsed_ids(&self) -> impl Iterator<Item = &str> {
        self.collapsed_ids.iter().map(String::as_str)
    }

    /// Registers an observer for state-change events.
    pub fn observe(&mut self, observer: impl FnMut(&PivotEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Replaces one axis's facet list and rebuilds both trees from a fresh
    /// query.
    pub fn set_facets(
        &mut self,
        db: &DB,
        axis: HeaderAxis,
        facets: Vec<Facet>,
    ) -> store::Result<()> {
        match axis {
            HeaderAxis::Row => self.row_facets = facets,
            HeaderAxis::Column => self.col_facets = facets,
        }
        self.refresh(db)
    }

    /// Replaces the filter set and rebuilds.
    pub fn set_filters(
        &mut self,
        db: &DB,
        filters: Vec<QueryFilter>,
        options: QueryOptions,
    ) -> store::Result<()> {
        self.filters = filters;
        self.options = options;
        self.refresh(db)
    }

    /// Re-queries the store and rebuilds both trees. The collapse set is
    /// re-applied by node id, so headers that survive the re-query keep their
    /// collapse state. Both trees are built fully before either is swapped in.
    pub fn refresh(&mut self, db: &DB) -> store::Result<()> {
        if self.row_facets.is_empty() && self.col_facets.is_empty() {
            self.row_tree = None;
            self.col_tree = None;
            self.emit(PivotEvent::TreesRebuilt);
            return Ok(());
        }

        let query =
            HeaderQuery::build(&self.row_facets, &self.col_facets, &self.filters, &self.options)?;
        let rows = run_header_query(db, &query)?;

        let mut row_tree = build_tree(HeaderAxis::Row, &self.row_facets, &rows);
        let mut col_tree = build_tree(HeaderAxis::Column, &self.col_facets, &rows);
        self.apply_collapsed(&mut row_tree);
        self.apply_collapsed(&mut col_tree);

        self.row_tree = Some(row_tree);
        self.col_tree = Some(col_tree);
        self.emit(PivotEvent::TreesRebuilt);
        Ok(())
    }

    fn apply_collapsed(&self, tree: &mut HeaderTree) {
        let mut touched = false;
        for id in &self.collapsed_ids {
            if let Some(node_id) = tree.find_node(id) {
                tree.nodes[node_id].collapsed = true;
                touched = true;
            }
        }
        if touched {
            tree.recalculate();
        }
    }

    /// Toggles collapse on whichever tree holds the node, mutating the tree
    /// in place. Returns false when neither tree knows the id.
    pub fn toggle_collapse(&mut self, node_id: &str) -> bool {
        let toggled_in = |tree: &mut Option<HeaderTree>| match tree {
            Some(tree) => tree.toggle_collapse(node_id),
            None => false,
        };

        let toggled = toggled_in(&mut self.row_tree) || toggled_in(&mut self.col_tree);
        if toggled {
            if !self.collapsed_ids.remove(node_id) {
                self.collapsed_ids.insert(node_id.to_string());
            }
            self.emit(PivotEvent::TreesRebuilt);
        }
        toggled
    }

    /// Pure selection state; no recomputation.
    pub fn set_selected(&mut self, node_id: Option<String>) {
        if self.selected_id != node_id {
            self.selected_id = node_id.clone();
            self.emit(PivotEvent::SelectionChanged(node_id));
        }
    }

    /// Merges a dimensions patch and announces the layout change.
    pub fn set_dimensions(&mut self, patch: DimensionsPatch) {
        let d = &mut self.dimensions;
        if let Some(v) = patch.row_header_level_width {
            d.row_header_level_width = v;
        }
        if let Some(v) = patch.col_header_level_height {
            d.col_header_level_height = v;
        }
        if let Some(v) = patch.cell_min_width {
            d.cell_min_width = v;
        }
        if let Some(v) = patch.cell_min_height {
            d.cell_min_height = v;
        }
        if let Some(v) = patch.zoom {
            d.zoom = v;
        }
        let snapshot = self.dimensions.clone();
        self.emit(PivotEvent::LayoutChanged(snapshot));
    }

    fn emit(&mut self, event: PivotEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}

impl Default for PivotController {
    fn default() -> PivotController {
        PivotController::new()
    }
}
