use daylist_core::store::AppState;
use daylist_core::task::{ActiveView, AppData, SmartView};

fn state_with_default_list() -> AppState {
    let mut state = AppState::from_data(AppData::default(), ActiveView::default());
    state.ensure_default_list();
    state
}

#[test]
fn every_task_always_references_an_existing_list() {
    let mut state = state_with_default_list();

    let work = state.add_list("Work").expect("add list").id;
    let home = state.add_list("Home").expect("add list").id;

    state.active_view = ActiveView::List(work);
    state.add_task("write minutes").expect("add task");
    state.active_view = ActiveView::List(home);
    state.add_task("fix faucet").expect("add task");
    state.active_view = ActiveView::Smart(SmartView::MyDay);
    state.add_task("walk").expect("add task");

    state.remove_list(work).expect("remove list");

    for task in &state.tasks {
        assert!(
            state.lists.iter().any(|l| l.id == task.list_id),
            "task {} is orphaned",
            task.id
        );
    }
}

#[test]
fn removing_a_list_cascades_to_exactly_its_tasks() {
    let mut state = state_with_default_list();
    let work = state.add_list("Work").expect("add list").id;

    state.active_view = ActiveView::Smart(SmartView::All);
    let kept = state.add_task("stays in default").expect("add task").id;
    state.active_view = ActiveView::List(work);
    state.add_task("goes away").expect("add task");
    state.add_task("also goes away").expect("add task");

    let before = state.tasks.len();
    state.remove_list(work).expect("remove list");

    assert_eq!(state.tasks.len(), before - 2);
    assert!(state.tasks.iter().any(|t| t.id == kept));
    assert!(state.tasks.iter().all(|t| t.list_id != work));
}

#[test]
fn the_default_list_can_never_be_deleted() {
    let mut state = state_with_default_list();
    let default_id = state.default_list().expect("default list").id;

    assert!(state.remove_list(default_id).is_err());
    assert_eq!(state.lists.len(), 1);

    // Still protected with more lists around.
    state.add_list("Work").expect("add list");
    assert!(state.remove_list(default_id).is_err());
    assert_eq!(state.lists.len(), 2);
}

#[test]
fn list_names_must_be_unique_and_non_empty() {
    let mut state = state_with_default_list();

    state.add_list("Work").expect("add list");
    assert!(state.add_list("Work").is_err());
    // Case-sensitive collision rule: a different casing is a new list.
    state.add_list("work").expect("add list");

    assert!(state.add_list("").is_err());
    assert!(state.add_list("   ").is_err());
}

#[test]
fn creating_a_list_switches_the_active_view_to_it() {
    let mut state = state_with_default_list();
    let work = state.add_list("Work").expect("add list").id;
    assert_eq!(state.active_view, ActiveView::List(work));
}

#[test]
fn deleting_the_active_list_resets_the_view_to_my_day() {
    let mut state = state_with_default_list();
    let work = state.add_list("Work").expect("add list").id;

    assert_eq!(state.active_view, ActiveView::List(work));
    state.remove_list(work).expect("remove list");
    assert_eq!(state.active_view, ActiveView::Smart(SmartView::MyDay));

    // Deleting a list that is not the active view leaves it alone.
    let errands = state.add_list("Errands").expect("add list").id;
    state.active_view = ActiveView::Smart(SmartView::Planned);
    state.remove_list(errands).expect("remove list");
    assert_eq!(state.active_view, ActiveView::Smart(SmartView::Planned));
}

#[test]
fn task_added_in_a_list_view_belongs_to_that_list_without_flags() {
    let mut state = state_with_default_list();
    let work = state.add_list("Work").expect("add list").id;

    // add_list switched the active view to the new list.
    let task = state.add_task("Buy milk").expect("add task");

    assert_eq!(task.list_id, work);
    assert!(!task.important);
    assert!(!task.my_day);
    assert!(task.assigned_to.is_none());
}

#[test]
fn lists_resolve_by_id_or_exact_name() {
    let mut state = state_with_default_list();
    let work = state.add_list("Work").expect("add list").id;

    assert_eq!(state.resolve_list("Work").expect("by name").id, work);
    assert_eq!(
        state.resolve_list(&work.to_string()).expect("by id").id,
        work
    );
    assert!(state.resolve_list("work?").is_err());
}
