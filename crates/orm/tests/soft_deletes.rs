//! Soft deletes: default scoping, trashed visibility toggles, restore, and
//! force deletion.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

use common::{database, Document};
use rill_orm::{Entity, ModelEvent};

#[test]
fn delete_stamps_instead_of_removing() {
    let (db, _) = database();
    let mut doc = Document::create(&db, json!({"title": "Keep me"})).unwrap();

    assert!(doc.delete().unwrap());
    assert!(doc.exists());
    assert!(doc.trashed());

    // Hidden from default queries, present under with_trashed.
    assert_eq!(Document::query(&db).count().unwrap(), 0);
    assert_eq!(Document::query(&db).with_trashed().count().unwrap(), 1);
    assert!(Document::find(&db, doc.primary_key_value()).unwrap().is_none());
}

#[test]
fn only_trashed_sees_exclusively_stamped_rows() {
    let (db, _) = database();
    let mut gone = Document::create(&db, json!({"title": "gone"})).unwrap();
    Document::create(&db, json!({"title": "kept"})).unwrap();
    gone.delete().unwrap();

    let trashed = Document::query(&db).only_trashed().get().unwrap();
    assert_eq!(trashed.len(), 1);
    assert_eq!(trashed[0].get("title"), json!("gone"));

    let live = Document::query(&db).get().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].get("title"), json!("kept"));

    assert_eq!(Document::query(&db).with_trashed().count().unwrap(), 2);
}

#[test]
fn restore_clears_the_stamp_and_fires_events() {
    let (db, _) = database();
    let restored_fired = Arc::new(AtomicUsize::new(0));
    let counter = restored_fired.clone();
    db.registry()
        .listen(Document::definition(), ModelEvent::Restored, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

    let mut doc = Document::create(&db, json!({"title": "cycle"})).unwrap();
    doc.delete().unwrap();
    assert!(doc.trashed());

    assert!(doc.restore().unwrap());
    assert!(!doc.trashed());
    assert_eq!(restored_fired.load(Ordering::SeqCst), 1);
    assert_eq!(Document::query(&db).count().unwrap(), 1);
}

#[test]
fn canceling_restoring_keeps_the_stamp() {
    let (db, _) = database();
    db.registry()
        .listen(Document::definition(), ModelEvent::Restoring, |_| false);

    let mut doc = Document::create(&db, json!({"title": "stuck"})).unwrap();
    doc.delete().unwrap();
    assert!(!doc.restore().unwrap());
    assert!(doc.trashed());
}

#[test]
fn force_delete_really_removes_the_row() {
    let (db, _) = database();
    let events = Arc::new(AtomicUsize::new(0));
    let counter = events.clone();
    db.registry()
        .listen(Document::definition(), ModelEvent::ForceDeleted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

    let mut doc = Document::create(&db, json!({"title": "purge"})).unwrap();
    assert!(doc.force_delete().unwrap());
    assert!(!doc.exists());
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(Document::query(&db).with_trashed().count().unwrap(), 0);
}

#[test]
fn soft_deleted_instances_can_still_refresh() {
    let (db, _) = database();
    let mut doc = Document::create(&db, json!({"title": "still here"})).unwrap();
    doc.delete().unwrap();

    doc.refresh().unwrap();
    assert!(doc.trashed());
    assert_eq!(doc.get("title"), json!("still here"));
}

#[test]
fn bulk_delete_stamps_soft_delete_entities() {
    let (db, _) = database();
    for i in 0..3 {
        Document::create(&db, json!({"title": format!("D{i}")})).unwrap();
    }

    let affected = Document::query(&db).bulk_delete().unwrap();
    assert_eq!(affected, 3);
    assert_eq!(Document::query(&db).count().unwrap(), 0);
    // Rows still exist, stamped.
    assert_eq!(Document::query(&db).only_trashed().count().unwrap(), 3);
}

#[test]
fn deleting_event_fires_on_soft_delete() {
    let (db, _) = database();
    let deleting = Arc::new(AtomicUsize::new(0));
    let counter = deleting.clone();
    db.registry()
        .listen(Document::definition(), ModelEvent::Deleting, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

    let mut doc = Document::create(&db, json!({"title": "observed"})).unwrap();
    doc.delete().unwrap();
    assert_eq!(deleting.load(Ordering::SeqCst), 1);
}
