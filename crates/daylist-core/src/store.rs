use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::task::{
    ASSIGNED_ME, ActiveView, AppData, DEFAULT_LIST_NAME, List, Settings, SmartView, Task,
};

/// In-memory holder of the full application state. Single source of
/// truth: action handlers mutate it, the view filter reads it, the
/// persistence layer serializes it.
///
/// Invariants upheld here:
/// - every task's `list_id` references an existing list;
/// - list names are unique (case-sensitive);
/// - the first list in creation order is the default list and is never
///   removed.
#[derive(Debug, Clone)]
pub struct AppState {
    pub tasks: Vec<Task>,
    pub lists: Vec<List>,
    pub settings: Settings,
    pub active_view: ActiveView,
}

impl AppState {
    pub fn from_data(data: AppData, active_view: ActiveView) -> Self {
        Self {
            tasks: data.tasks,
            lists: data.lists,
            settings: data.settings,
            active_view,
        }
    }

    pub fn to_data(&self) -> AppData {
        AppData {
            tasks: self.tasks.clone(),
            lists: self.lists.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Creates the default list when none exists. Returns whether the
    /// state changed.
    pub fn ensure_default_list(&mut self) -> bool {
        if !self.lists.is_empty() {
            return false;
        }
        let id = self.next_list_id();
        info!(id, name = DEFAULT_LIST_NAME, "creating default list");
        self.lists.push(List {
            id,
            name: DEFAULT_LIST_NAME.to_string(),
        });
        true
    }

    pub fn default_list(&self) -> anyhow::Result<&List> {
        self.lists.first().ok_or_else(|| anyhow!("no lists exist"))
    }

    fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    fn next_list_id(&self) -> u64 {
        self.lists.iter().map(|l| l.id).max().unwrap_or(0) + 1
    }

    pub fn find_task(&self, id: u64) -> anyhow::Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("no task with id {id}"))
    }

    fn task_mut(&mut self, id: u64) -> anyhow::Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("no task with id {id}"))
    }

    pub fn find_list(&self, id: u64) -> anyhow::Result<&List> {
        self.lists
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| anyhow!("no list with id {id}"))
    }

    /// Resolves a CLI token to a list: a numeric id or an exact name.
    pub fn resolve_list(&self, token: &str) -> anyhow::Result<&List> {
        if let Ok(id) = token.parse::<u64>()
            && let Some(list) = self.lists.iter().find(|l| l.id == id)
        {
            return Ok(list);
        }
        self.lists
            .iter()
            .find(|l| l.name == token)
            .ok_or_else(|| anyhow!("no list named or numbered '{token}'"))
    }

    /// Appends a new task. Smart-view flags are pre-set from the active
    /// view; the owning list is the active list, or the default list
    /// when a smart view is active.
    #[tracing::instrument(skip(self, text))]
    pub fn add_task(&mut self, text: &str) -> anyhow::Result<Task> {
        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow!("task text is empty"));
        }

        let list_id = match self.active_view.list_id() {
            Some(id) => self.find_list(id)?.id,
            None => self.default_list()?.id,
        };

        let mut task = Task::new(self.next_task_id(), text.to_string(), list_id);
        match self.active_view {
            ActiveView::Smart(SmartView::Important) => task.important = true,
            ActiveView::Smart(SmartView::MyDay) => task.my_day = true,
            ActiveView::Smart(SmartView::Assigned) => {
                task.assigned_to = Some(ASSIGNED_ME.to_string());
            }
            _ => {}
        }

        debug!(id = task.id, list_id, "adding task");
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn toggle_completed(&mut self, id: u64) -> anyhow::Result<&Task> {
        let task = self.task_mut(id)?;
        task.completed = !task.completed;
        Ok(task)
    }

    pub fn toggle_important(&mut self, id: u64) -> anyhow::Result<&Task> {
        let task = self.task_mut(id)?;
        task.important = !task.important;
        Ok(task)
    }

    pub fn toggle_my_day(&mut self, id: u64) -> anyhow::Result<&Task> {
        let task = self.task_mut(id)?;
        task.my_day = !task.my_day;
        Ok(task)
    }

    pub fn toggle_assigned(&mut self, id: u64) -> anyhow::Result<&Task> {
        let task = self.task_mut(id)?;
        task.assigned_to = if task.assigned_to.is_some() {
            None
        } else {
            Some(ASSIGNED_ME.to_string())
        };
        Ok(task)
    }

    /// Sets a task's due date. Dates before `today` are rejected, the
    /// same floor the original date picker enforces.
    pub fn set_due_date(&mut self, id: u64, date: NaiveDate, today: NaiveDate) -> anyhow::Result<&Task> {
        if date < today {
            return Err(anyhow!("due date {date} is in the past"));
        }
        let task = self.task_mut(id)?;
        task.due_date = Some(date);
        Ok(task)
    }

    pub fn remove_task(&mut self, id: u64) -> anyhow::Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| anyhow!("no task with id {id}"))?;
        Ok(self.tasks.remove(idx))
    }

    /// Appends a new list and makes it the active view.
    #[tracing::instrument(skip(self, name))]
    pub fn add_list(&mut self, name: &str) -> anyhow::Result<List> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("list name is empty"));
        }
        if self.lists.iter().any(|l| l.name == name) {
            return Err(anyhow!("a list named '{name}' already exists"));
        }

        let list = List {
            id: self.next_list_id(),
            name: name.to_string(),
        };
        info!(id = list.id, name = %list.name, "adding list");
        self.active_view = ActiveView::List(list.id);
        self.lists.push(list.clone());
        Ok(list)
    }

    /// Removes a list and cascades to its tasks. The default list (the
    /// first ever created) is rejected regardless of how it is
    /// addressed. An active view pointing at the victim resets to
    /// My Day.
    #[tracing::instrument(skip(self))]
    pub fn remove_list(&mut self, id: u64) -> anyhow::Result<List> {
        let idx = self
            .lists
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| anyhow!("no list with id {id}"))?;
        if idx == 0 {
            return Err(anyhow!("the default list cannot be deleted"));
        }

        let list = self.lists.remove(idx);
        let before = self.tasks.len();
        self.tasks.retain(|t| t.list_id != list.id);
        info!(
            id = list.id,
            name = %list.name,
            cascaded = before - self.tasks.len(),
            "removed list"
        );

        if self.active_view == ActiveView::List(list.id) {
            self.active_view = ActiveView::Smart(SmartView::MyDay);
        }
        Ok(list)
    }

    pub fn set_confirm_delete(&mut self, value: bool) {
        self.settings.confirm_delete = value;
    }
}
