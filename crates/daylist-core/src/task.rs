use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Marker stored in `assigned_to` for tasks assigned to the local user.
pub const ASSIGNED_ME: &str = "me";

/// Name of the list created when no list exists yet. The first list in
/// creation order is the default list and can never be deleted.
pub const DEFAULT_LIST_NAME: &str = "My Tasks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,

    pub text: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub important: bool,

    #[serde(default)]
    pub my_day: bool,

    #[serde(default)]
    pub assigned_to: Option<String>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    pub list_id: u64,
}

impl Task {
    pub fn new(id: u64, text: String, list_id: u64) -> Self {
        Self {
            id,
            text,
            completed: false,
            important: false,
            my_day: false,
            assigned_to: None,
            due_date: None,
            list_id,
        }
    }

    pub fn is_assigned_to_me(&self) -> bool {
        self.assigned_to.as_deref() == Some(ASSIGNED_ME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_confirm_delete")]
    pub confirm_delete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confirm_delete: default_confirm_delete(),
        }
    }
}

fn default_confirm_delete() -> bool {
    true
}

/// The whole application state as persisted by the local datastore:
/// one blob, rewritten wholesale after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default)]
    pub lists: Vec<List>,

    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartView {
    MyDay,
    Important,
    Planned,
    Assigned,
    All,
}

impl SmartView {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmartView::MyDay => "my-day",
            SmartView::Important => "important",
            SmartView::Planned => "planned",
            SmartView::Assigned => "assigned",
            SmartView::All => "all",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "my-day" | "myday" => Some(SmartView::MyDay),
            "important" => Some(SmartView::Important),
            "planned" => Some(SmartView::Planned),
            "assigned" => Some(SmartView::Assigned),
            "all" => Some(SmartView::All),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SmartView::MyDay => "My Day",
            SmartView::Important => "Important",
            SmartView::Planned => "Planned",
            SmartView::Assigned => "Assigned to me",
            SmartView::All => "All tasks",
        }
    }
}

impl std::fmt::Display for SmartView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the main panel shows: a named smart view or a concrete list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Smart(SmartView),
    List(u64),
}

impl Default for ActiveView {
    fn default() -> Self {
        ActiveView::Smart(SmartView::MyDay)
    }
}

impl ActiveView {
    /// Parses the persisted view token. Numeric tokens are list ids,
    /// known names are smart views, anything else falls back to the
    /// all-tasks view.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        if let Ok(id) = token.parse::<u64>() {
            return ActiveView::List(id);
        }
        match SmartView::from_name(token) {
            Some(view) => ActiveView::Smart(view),
            None => ActiveView::Smart(SmartView::All),
        }
    }

    pub fn to_token(self) -> String {
        match self {
            ActiveView::Smart(view) => view.as_str().to_string(),
            ActiveView::List(id) => id.to_string(),
        }
    }

    pub fn list_id(self) -> Option<u64> {
        match self {
            ActiveView::List(id) => Some(id),
            ActiveView::Smart(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_token_roundtrip() {
        for token in ["my-day", "important", "planned", "assigned", "all", "42"] {
            assert_eq!(ActiveView::from_token(token).to_token(), token);
        }
    }

    #[test]
    fn unknown_view_token_falls_back_to_all() {
        assert_eq!(
            ActiveView::from_token("someday"),
            ActiveView::Smart(SmartView::All)
        );
    }

    #[test]
    fn settings_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str("{}").expect("parse settings");
        assert!(settings.confirm_delete);
    }
}
