use std::collections::BTreeMap;

use tracing::trace;

use crate::task::{ActiveView, SmartView, Task};

/// Computes the ordered subset of tasks the active view shows.
///
/// Selection happens in three steps: pick by view, narrow by the search
/// query (case-insensitive substring over the task text), then move
/// incomplete tasks ahead of completed ones. The planned view is the
/// exception to the last step: its due-date order is final.
#[tracing::instrument(skip(tasks))]
pub fn visible<'a>(tasks: &'a [Task], view: &ActiveView, query: &str) -> Vec<&'a Task> {
    let mut selected: Vec<&Task> = match view {
        ActiveView::Smart(SmartView::MyDay) => tasks.iter().filter(|t| t.my_day).collect(),
        ActiveView::Smart(SmartView::Important) => tasks.iter().filter(|t| t.important).collect(),
        ActiveView::Smart(SmartView::Planned) => {
            let mut planned: Vec<&Task> =
                tasks.iter().filter(|t| t.due_date.is_some()).collect();
            planned.sort_by_key(|t| t.due_date);
            planned
        }
        ActiveView::Smart(SmartView::Assigned) => {
            tasks.iter().filter(|t| t.is_assigned_to_me()).collect()
        }
        ActiveView::Smart(SmartView::All) => tasks.iter().collect(),
        ActiveView::List(id) => tasks.iter().filter(|t| t.list_id == *id).collect(),
    };

    let query = query.trim();
    if !query.is_empty() {
        let needle = query.to_lowercase();
        selected.retain(|t| t.text.to_lowercase().contains(&needle));
    }

    if !matches!(view, ActiveView::Smart(SmartView::Planned)) {
        selected.sort_by_key(|t| t.completed);
    }

    trace!(count = selected.len(), "computed visible tasks");
    selected
}

/// The line shown when a view comes up empty. The search message wins
/// over any view-specific one.
pub fn empty_state_message(view: &ActiveView, query: &str) -> &'static str {
    if !query.trim().is_empty() {
        return "No tasks match your search.";
    }
    match view {
        ActiveView::Smart(SmartView::Assigned) => "Tasks assigned to you will appear here.",
        ActiveView::Smart(SmartView::Planned) => "Tasks with a due date will appear here.",
        _ => "This list is empty. Add a task to get started!",
    }
}

/// Sidebar badge counts: incomplete tasks per smart view and per list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewCounts {
    pub my_day: usize,
    pub important: usize,
    pub planned: usize,
    pub assigned: usize,
    by_list: BTreeMap<u64, usize>,
}

impl ViewCounts {
    pub fn tally(tasks: &[Task]) -> Self {
        let mut counts = Self::default();
        for task in tasks.iter().filter(|t| !t.completed) {
            if task.my_day {
                counts.my_day += 1;
            }
            if task.important {
                counts.important += 1;
            }
            if task.due_date.is_some() {
                counts.planned += 1;
            }
            if task.is_assigned_to_me() {
                counts.assigned += 1;
            }
            *counts.by_list.entry(task.list_id).or_insert(0) += 1;
        }
        counts
    }

    pub fn for_list(&self, list_id: u64) -> usize {
        self.by_list.get(&list_id).copied().unwrap_or(0)
    }

    pub fn for_smart(&self, view: SmartView) -> usize {
        match view {
            SmartView::MyDay => self.my_day,
            SmartView::Important => self.important,
            SmartView::Planned => self.planned,
            SmartView::Assigned => self.assigned,
            SmartView::All => self.by_list.values().sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{ViewCounts, empty_state_message, visible};
    use crate::task::{ASSIGNED_ME, ActiveView, SmartView, Task};

    fn task(id: u64, text: &str, list_id: u64) -> Task {
        Task::new(id, text.to_string(), list_id)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn my_day_membership_follows_the_flag() {
        let mut a = task(1, "walk", 1);
        a.my_day = true;
        let b = task(2, "shop", 1);

        let tasks = vec![a, b];
        let view = ActiveView::Smart(SmartView::MyDay);
        let shown = visible(&tasks, &view, "");
        assert_eq!(shown.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);

        let mut tasks = tasks;
        tasks[1].my_day = true;
        let shown = visible(&tasks, &view, "");
        assert_eq!(shown.len(), 2);
    }

    #[test]
    fn planned_orders_by_due_date_and_skips_undated() {
        let mut a = task(1, "late", 1);
        a.due_date = Some(date(2026, 9, 1));
        let mut b = task(2, "soon", 1);
        b.due_date = Some(date(2026, 8, 10));
        b.completed = true;
        let c = task(3, "undated", 1);

        let tasks = vec![a, b, c];
        let shown = visible(&tasks, &ActiveView::Smart(SmartView::Planned), "");
        // Due-date order is final; completion does not re-partition it.
        assert_eq!(shown.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 1]);
        assert!(shown.iter().all(|t| t.due_date.is_some()));
    }

    #[test]
    fn search_is_case_insensitive() {
        let tasks = vec![task(1, "Buy MILK", 1), task(2, "call mom", 1)];
        let view = ActiveView::Smart(SmartView::All);

        let upper = visible(&tasks, &view, "MILK");
        let lower = visible(&tasks, &view, "milk");
        assert_eq!(upper, lower);
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].id, 1);
    }

    #[test]
    fn incomplete_tasks_come_first_keeping_relative_order() {
        let mut a = task(1, "done early", 1);
        a.completed = true;
        let b = task(2, "open one", 1);
        let mut c = task(3, "done late", 1);
        c.completed = true;
        let d = task(4, "open two", 1);

        let tasks = vec![a, b, c, d];
        let shown = visible(&tasks, &ActiveView::Smart(SmartView::All), "");
        assert_eq!(
            shown.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![2, 4, 1, 3]
        );
    }

    #[test]
    fn list_view_selects_by_owning_list() {
        let tasks = vec![task(1, "a", 1), task(2, "b", 2), task(3, "c", 2)];
        let shown = visible(&tasks, &ActiveView::List(2), "");
        assert_eq!(shown.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn assigned_view_matches_the_me_marker() {
        let mut a = task(1, "mine", 1);
        a.assigned_to = Some(ASSIGNED_ME.to_string());
        let mut b = task(2, "someone else", 1);
        b.assigned_to = Some("alex".to_string());

        let tasks = vec![a, b];
        let shown = visible(&tasks, &ActiveView::Smart(SmartView::Assigned), "");
        assert_eq!(shown.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn empty_state_messages_depend_on_view_and_search() {
        let planned = ActiveView::Smart(SmartView::Planned);
        assert_eq!(
            empty_state_message(&planned, "milk"),
            "No tasks match your search."
        );
        assert_eq!(
            empty_state_message(&planned, ""),
            "Tasks with a due date will appear here."
        );
        assert_eq!(
            empty_state_message(&ActiveView::Smart(SmartView::Assigned), ""),
            "Tasks assigned to you will appear here."
        );
        assert_eq!(
            empty_state_message(&ActiveView::List(7), ""),
            "This list is empty. Add a task to get started!"
        );
    }

    #[test]
    fn counts_ignore_completed_tasks() {
        let mut a = task(1, "a", 1);
        a.my_day = true;
        a.important = true;
        let mut b = task(2, "b", 2);
        b.my_day = true;
        b.completed = true;
        b.due_date = Some(date(2026, 8, 20));

        let counts = ViewCounts::tally(&[a, b]);
        assert_eq!(counts.my_day, 1);
        assert_eq!(counts.important, 1);
        assert_eq!(counts.planned, 0);
        assert_eq!(counts.for_list(1), 1);
        assert_eq!(counts.for_list(2), 0);
    }
}
