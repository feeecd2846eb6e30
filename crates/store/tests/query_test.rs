//! Header-discovery queries against a populated in-memory database.

use chrono::{TimeZone, Utc};
use model::{Axis, CanonicalRecord, CardType, Facet, TimeFormat};
use store::{insert_canonical, run_header_query, HeaderQuery, InsertOptions, QueryOptions};

fn seed(db: &store::DB) {
    let mut records = Vec::new();
    for (id, folder, month, deleted) in [
        ("c1", "Work", 1, false),
        ("c2", "Work", 1, false),
        ("c3", "Work", 3, false),
        ("c4", "Home", 3, false),
        ("c5", "Home", 3, true),
    ] {
        let created = Utc.with_ymd_and_hms(2024, month, 15, 12, 0, 0).unwrap();
        let mut r = CanonicalRecord::new(id, id, created, created);
        r.folder = Some(folder.to_string());
        if deleted {
            r.deleted_at = Some(created);
        }
        records.push(r);
    }
    let outcome = insert_canonical(db, &records, &InsertOptions::default()).unwrap();
    assert_eq!(5, outcome.inserted);
}

fn folder() -> Facet {
    Facet::text("folder", "Folder", Axis::Category, "folder")
}

fn created_month() -> Facet {
    Facet::date("created_month", "Month", "created_at", TimeFormat::Month)
}

#[test]
fn groups_both_axes_and_skips_soft_deleted_rows() {
    let db = store::create(":memory:").unwrap();
    seed(&db);

    let query = HeaderQuery::build(
        &[folder()],
        &[created_month()],
        &[],
        &QueryOptions::default(),
    )
    .unwrap();
    let rows = run_header_query(&db, &query).unwrap();

    // (Home, 03), (Work, 01), (Work, 03) — c5 is soft-deleted.
    assert_eq!(3, rows.len());
    assert_eq!("Home", rows[0].get_string("folder"));
    assert_eq!("03", rows[0].get_string("created_month"));
    assert_eq!(1, rows[0].get_count());
    assert_eq!("Work", rows[1].get_string("folder"));
    assert_eq!("01", rows[1].get_string("created_month"));
    assert_eq!(2, rows[1].get_count());
    assert_eq!("03", rows[2].get_string("created_month"));
    assert_eq!(1, rows[2].get_count());
}

#[test]
fn include_deleted_restores_the_full_count() {
    let db = store::create(":memory:").unwrap();
    seed(&db);

    let options = QueryOptions {
        include_deleted: true,
        ..QueryOptions::default()
    };
    let query = HeaderQuery::build(&[folder()], &[], &[], &options).unwrap();
    let rows = run_header_query(&db, &query).unwrap();

    let total: i64 = rows.iter().map(|r| r.get_count()).sum();
    assert_eq!(5, total);
}

#[test]
fn card_type_filter_narrows_the_scan() {
    let db = store::create(":memory:").unwrap();
    seed(&db);

    let options = QueryOptions {
        card_types: vec![CardType::Event],
        ..QueryOptions::default()
    };
    let query = HeaderQuery::build(&[folder()], &[], &[], &options).unwrap();
    let rows = run_header_query(&db, &query).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn null_group_values_surface_as_empty_strings() {
    let db = store::create(":memory:").unwrap();
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let r = CanonicalRecord::new("c1", "No folder", created, created);
    insert_canonical(&db, &[r], &InsertOptions::default()).unwrap();

    let query = HeaderQuery::build(&[folder()], &[], &[], &QueryOptions::default()).unwrap();
    let rows = run_header_query(&db, &query).unwrap();
    assert_eq!(1, rows.len());
    assert_eq!("", rows[0].get_string("folder"));
}
