use std::io::Cursor;

use daylist_core::commands::read_confirmation;
use daylist_core::datastore::DataStore;
use daylist_core::store::AppState;
use daylist_core::task::{ActiveView, AppData};
use tempfile::tempdir;

#[test]
fn only_an_explicit_yes_confirms() {
    for input in ["y\n", "Y\n", "yes\n", "YES\n", " y \n"] {
        let mut reader = Cursor::new(input);
        assert!(
            read_confirmation(&mut reader, "Buy milk").expect("read"),
            "input {input:?} should confirm"
        );
    }

    for input in ["n\n", "no\n", "\n", "maybe\n", "yep\n", ""] {
        let mut reader = Cursor::new(input);
        assert!(
            !read_confirmation(&mut reader, "Buy milk").expect("read"),
            "input {input:?} should decline"
        );
    }
}

#[test]
fn declining_leaves_the_persisted_state_unchanged() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");

    let mut state = AppState::from_data(AppData::default(), ActiveView::default());
    state.ensure_default_list();
    let id = state.add_task("precious").expect("add task").id;
    store.save_state(&state.to_data()).expect("save state");
    let before = store.load_state().expect("load state");

    // The gate declines, so the handler contract is to stop here:
    // nothing is mutated and nothing is rewritten.
    let mut reader = Cursor::new("n\n");
    let confirmed = read_confirmation(&mut reader, "precious").expect("read");
    assert!(!confirmed);

    let after = store.load_state().expect("load state");
    assert_eq!(before, after);
    assert!(after.tasks.iter().any(|t| t.id == id));
}
