use std::path::Path;

use rentadmin::storage::{JsonStorage, RegionRef, RegionSlot, SelectionProvider, Storage, UploadTracker};
use serde_json::json;

fn selection_at(path: &Path) -> SelectionProvider {
    SelectionProvider::load(Box::new(JsonStorage::new(path.to_path_buf()).unwrap())).unwrap()
}

fn uploads_at(path: &Path) -> UploadTracker {
    UploadTracker::new(Box::new(JsonStorage::new(path.to_path_buf()).unwrap()))
}

#[test]
fn selection_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selection.json");

    {
        let mut selection = selection_at(&path);
        selection
            .set_region(RegionSlot::State, Some(RegionRef::new("st-4", "Goa")))
            .unwrap();
        selection
            .set_region(RegionSlot::Country, Some(RegionRef::new("in", "India")))
            .unwrap();
        selection.set_app_country(Some(" IN ".to_string())).unwrap();
    }

    let reloaded = selection_at(&path).snapshot();
    assert_eq!(reloaded.selected_state, Some(RegionRef::new("st-4", "Goa")));
    assert_eq!(reloaded.selected_country, Some(RegionRef::new("in", "India")));
    assert_eq!(reloaded.app_country.as_deref(), Some("IN"));
    assert_eq!(reloaded.selected_parent_state, None);
    assert_eq!(reloaded.filter_defaults(), vec![("stateId", "st-4".to_string())]);
}

#[test]
fn clearing_a_slot_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selection.json");

    {
        let mut selection = selection_at(&path);
        selection
            .set_region(RegionSlot::State, Some(RegionRef::new("st-4", "Goa")))
            .unwrap();
        let snapshot = selection.set_region(RegionSlot::State, None).unwrap();
        assert!(snapshot.filter_defaults().is_empty());
    }

    assert_eq!(selection_at(&path).snapshot().selected_state, None);
}

#[test]
fn unreadable_selection_entry_is_treated_as_unset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selection.json");

    {
        let mut storage = JsonStorage::new(path.clone()).unwrap();
        storage.set("selectedState", json!(42)).unwrap();
        storage.set("appCountry", json!("IN")).unwrap();
    }

    let snapshot = selection_at(&path).snapshot();
    assert_eq!(snapshot.selected_state, None);
    assert_eq!(snapshot.app_country.as_deref(), Some("IN"));
}

#[test]
fn abandoned_uploads_are_recovered_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uploads.json");

    {
        let mut uploads = uploads_at(&path);
        uploads.record_upload("coverImage", "https://cdn/a.png").unwrap();
        uploads.record_upload("coverImage", "https://cdn/b.png").unwrap();
        uploads.record_upload("gallery", "https://cdn/g.png").unwrap();
    }

    let mut uploads = uploads_at(&path);
    let mut pending = uploads.pending_fields().unwrap();
    pending.sort();
    assert_eq!(pending, vec!["coverImage", "gallery"]);

    let orphans = uploads.abandon("coverImage").unwrap();
    assert_eq!(orphans, vec!["https://cdn/a.png", "https://cdn/b.png"]);
    assert_eq!(uploads.pending_fields().unwrap(), vec!["gallery"]);
}

#[test]
fn removals_wait_for_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uploads.json");

    {
        let mut uploads = uploads_at(&path);
        uploads.record_upload("coverImage", "https://cdn/new.png").unwrap();
        assert_eq!(
            uploads.mark_removed("coverImage", "https://cdn/new.png").unwrap(),
            Some("https://cdn/new.png".to_string())
        );
        assert_eq!(uploads.mark_removed("coverImage", "https://cdn/old.png").unwrap(), None);
    }

    let mut uploads = uploads_at(&path);
    let record = uploads.record("coverImage").unwrap();
    assert!(record.add.is_empty());
    assert_eq!(record.delete, vec!["https://cdn/old.png"]);

    assert_eq!(uploads.commit("coverImage").unwrap(), vec!["https://cdn/old.png"]);
    assert!(uploads.record("coverImage").unwrap().is_empty());
    assert!(uploads.pending_fields().unwrap().is_empty());
}
