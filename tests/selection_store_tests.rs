//! Selection persistence against the file-backed store.

use routine_builder::selection::{SELECTION_KEY, SelectionSet, SelectionStore};
use routine_builder::storage::{FileStore, KeyValueStore};

#[test]
fn selection_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let mut store = SelectionStore::open(FileStore::new(dir.path()));
        store.toggle(3).expect("toggle 3");
        store.toggle(1).expect("toggle 1");
        store.toggle(3).expect("untoggle 3");
        store.toggle(5).expect("toggle 5");
    }

    let reopened = SelectionStore::open(FileStore::new(dir.path()));
    assert_eq!(reopened.selection().ids(), &[1, 5]);
}

#[test]
fn save_then_load_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = SelectionStore::open(FileStore::new(dir.path()));

    for ids in [vec![], vec![7], vec![9, 2, 4]] {
        let wanted: SelectionSet = ids.into();
        store.save(&wanted).expect("save");
        assert_eq!(store.load(), wanted);
    }
}

#[test]
fn corrupt_file_starts_empty_and_is_repaired_on_next_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backing = FileStore::new(dir.path());
    backing.set(SELECTION_KEY, "[1, 2").expect("write corrupt slot");

    let mut store = SelectionStore::open(backing.clone());
    assert!(store.selection().is_empty());

    store.toggle(4).expect("toggle");
    assert_eq!(
        backing.get(SELECTION_KEY).expect("read").as_deref(),
        Some("[4]")
    );
}

#[test]
fn clear_persists_empty_list() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = SelectionStore::open(FileStore::new(dir.path()));
    store.toggle(1).expect("toggle");

    store.clear().expect("clear");

    let reopened = SelectionStore::open(FileStore::new(dir.path()));
    assert!(reopened.selection().is_empty());
}
