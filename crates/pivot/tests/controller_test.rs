//! Controller behavior against a live in-memory store: facet changes, live
//! re-query, collapse persistence across rebuilds, and layout events.

use chrono::{TimeZone, Utc};
use model::{Axis, CanonicalRecord, Facet, TimeFormat};
use pivot::{DimensionsPatch, HeaderAxis, PivotController, PivotEvent};
use std::cell::RefCell;
use std::rc::Rc;
use store::{insert_canonical, InsertOptions, DB};

fn seed(db: &DB) {
    let mut records = Vec::new();
    for (id, folder, status, month) in [
        ("c1", "Work", "open", 1),
        ("c2", "Work", "open", 2),
        ("c3", "Work", "done", 2),
        ("c4", "Home", "open", 3),
    ] {
        let created = Utc.with_ymd_and_hms(2024, month, 10, 8, 0, 0).unwrap();
        let mut r = CanonicalRecord::new(id, id, created, created);
        r.folder = Some(folder.to_string());
        r.status = Some(status.to_string());
        records.push(r);
    }
    insert_canonical(db, &records, &InsertOptions::default()).unwrap();
}

fn folder() -> Facet {
    Facet::text("folder", "Folder", Axis::Category, "folder")
}

fn status() -> Facet {
    Facet::text("status", "Status", Axis::Category, "status")
}

fn created_month() -> Facet {
    Facet::date("created_month", "Month", "created_at", TimeFormat::Month)
}

#[test]
fn set_facets_builds_both_trees_from_one_query() {
    let db = store::create(":memory:").unwrap();
    seed(&db);

    let mut controller = PivotController::new();
    controller
        .set_facets(&db, HeaderAxis::Row, vec![folder(), status()])
        .unwrap();
    controller
        .set_facets(&db, HeaderAxis::Column, vec![created_month()])
        .unwrap();

    let rows = controller.row_tree().unwrap();
    assert_eq!(2, rows.roots.len());
    let work = rows.find_node("Work").unwrap();
    assert_eq!(3, rows.node(work).aggregate.count);
    assert_eq!(2, rows.node(work).span);

    let cols = controller.col_tree().unwrap();
    // Months 01, 02, 03 — labelled Jan, Feb, Mar.
    assert_eq!(3, cols.leaf_count);
    let labels: Vec<&str> = cols
        .roots
        .iter()
        .map(|r| cols.node(*r).label.as_str())
        .collect();
    assert_eq!(vec!["Jan", "Feb", "Mar"], labels);
}

#[test]
fn refresh_reflects_new_data_and_keeps_collapse_state() {
    let db = store::create(":memory:").unwrap();
    seed(&db);

    let mut controller = PivotController::new();
    controller
        .set_facets(&db, HeaderAxis::Row, vec![folder(), status()])
        .unwrap();

    assert!(controller.toggle_collapse("Work"));
    let rows = controller.row_tree().unwrap();
    assert_eq!(1, rows.node(rows.find_node("Work").unwrap()).span);
    assert_eq!(2, rows.leaf_count);

    // New card in a new folder arrives; the tree is rebuilt but Work stays
    // collapsed.
    let created = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
    let mut r = CanonicalRecord::new("c5", "c5", created, created);
    r.folder = Some("Archive".to_string());
    r.status = Some("open".to_string());
    insert_canonical(&db, &[r], &InsertOptions::default()).unwrap();

    controller.refresh(&db).unwrap();
    let collapsed: Vec<&str> = controller.collapsed_ids().collect();
    assert_eq!(vec!["Work"], collapsed);
    let rows = controller.row_tree().unwrap();
    assert_eq!(3, rows.roots.len());
    let work = rows.find_node("Work").unwrap();
    assert!(rows.node(work).collapsed);
    assert_eq!(1, rows.node(work).span);
}

#[test]
fn events_fire_for_rebuilds_selection_and_layout() {
    let db = store::create(":memory:").unwrap();
    seed(&db);

    let events: Rc<RefCell<Vec<PivotEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();

    let mut controller = PivotController::new();
    controller.observe(move |event| sink.borrow_mut().push(event.clone()));

    controller
        .set_facets(&db, HeaderAxis::Row, vec![folder()])
        .unwrap();
    controller.set_selected(Some("Work".to_string()));
    controller.set_selected(Some("Work".to_string())); // no-op, no event
    controller.set_dimensions(DimensionsPatch {
        zoom: Some(1.5),
        ..DimensionsPatch::default()
    });

    assert_eq!(Some("Work"), controller.selected());
    assert_eq!(1.5, controller.dimensions().zoom);

    let events = events.borrow();
    assert_eq!(3, events.len());
    assert_eq!(PivotEvent::TreesRebuilt, events[0]);
    assert_eq!(
        PivotEvent::SelectionChanged(Some("Work".to_string())),
        events[1]
    );
    match &events[2] {
        PivotEvent::LayoutChanged(dimensions) => {
            assert_eq!(1.5, dimensions.zoom);
            // Untouched fields keep their defaults.
            assert_eq!(120.0, dimensions.row_header_level_width);
        }
        other => panic!("expected a layout event, got {other:?}"),
    }
}

#[test]
fn clearing_both_facet_lists_clears_the_trees() {
    let db = store::create(":memory:").unwrap();
    seed(&db);

    let mut controller = PivotController::new();
    controller
        .set_facets(&db, HeaderAxis::Row, vec![folder()])
        .unwrap();
    assert!(controller.row_tree().is_some());

    controller
        .set_facets(&db, HeaderAxis::Row, Vec::new())
        .unwrap();
    assert!(controller.row_tree().is_none());
    assert!(controller.col_tree().is_none());
}
