use anyhow::{Context, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::task::{DEFAULT_LIST_NAME, List, Task};

/// Task record as the service returns it. Flag fields are camelCase on
/// the wire; the owning list is `list_id`. Extra fields (timestamps)
/// are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "isImportant", default)]
    pub important: bool,
    #[serde(rename = "myDay", default)]
    pub my_day: bool,
    #[serde(rename = "dueDate", default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(rename = "assignedTo", default)]
    pub assigned_to: Option<String>,
    pub list_id: u64,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Task {
            id: record.id,
            text: record.text,
            completed: record.completed,
            important: record.important,
            my_day: record.my_day,
            assigned_to: record.assigned_to,
            due_date: record.due_date.map(|dt| dt.date()),
            list_id: record.list_id,
        }
    }
}

/// List record with its embedded tasks, as `GET /lists/` returns them.
#[derive(Debug, Clone, Deserialize)]
pub struct ListRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Serialize)]
struct NewListBody<'a> {
    name: &'a str,
}

/// Creation payload. The service accepts only these fields at creation;
/// assignment happens through a later patch.
#[derive(Debug, Serialize)]
pub struct NewTaskBody<'a> {
    pub text: &'a str,
    pub list_id: u64,
    #[serde(rename = "isImportant")]
    pub important: bool,
    #[serde(rename = "myDay")]
    pub my_day: bool,
}

/// Partial update. Absent fields are left untouched server-side, so
/// every field only serializes when set; `assigned_to` is doubly
/// optional because clearing an assignment means sending an explicit
/// null.
#[derive(Debug, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(rename = "isImportant", skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
    #[serde(rename = "myDay", skip_serializing_if = "Option::is_none")]
    pub my_day: Option<bool>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(rename = "assignedTo", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<String>>,
}

impl TaskPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Self::default()
        }
    }

    pub fn important(value: bool) -> Self {
        Self {
            important: Some(value),
            ..Self::default()
        }
    }

    pub fn my_day(value: bool) -> Self {
        Self {
            my_day: Some(value),
            ..Self::default()
        }
    }

    pub fn assigned_to(value: Option<String>) -> Self {
        Self {
            assigned_to: Some(value),
            ..Self::default()
        }
    }

    pub fn due_date(date: NaiveDate) -> Self {
        Self {
            due_date: Some(date.and_time(chrono::NaiveTime::MIN)),
            ..Self::default()
        }
    }
}

/// Remote persistence: every mutation is a request, and local state is
/// only replaced by re-fetching after a success response.
pub struct RemoteStore {
    base_url: String,
    http: Client,
}

impl RemoteStore {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[tracing::instrument(skip(self))]
    pub fn fetch_lists(&self) -> anyhow::Result<Vec<ListRecord>> {
        let url = self.url("/lists/");
        let resp = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("GET {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("GET {url} returned {status}"));
        }

        let records: Vec<ListRecord> = resp.json().context("failed parsing lists payload")?;
        debug!(count = records.len(), "fetched lists");
        Ok(records)
    }

    #[tracing::instrument(skip(self))]
    pub fn create_list(&self, name: &str) -> anyhow::Result<ListRecord> {
        let url = self.url("/lists/");
        let resp = self
            .http
            .post(&url)
            .json(&NewListBody { name })
            .send()
            .with_context(|| format!("POST {url} failed"))?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            return Err(anyhow!("a list named '{name}' already exists"));
        }
        if !status.is_success() {
            return Err(anyhow!("POST {url} returned {status}"));
        }

        resp.json().context("failed parsing created list")
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_list(&self, id: u64) -> anyhow::Result<()> {
        let url = self.url(&format!("/lists/{id}"));
        let resp = self
            .http
            .delete(&url)
            .send()
            .with_context(|| format!("DELETE {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("DELETE {url} returned {status}"));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, body), fields(list_id = body.list_id))]
    pub fn create_task(&self, body: &NewTaskBody<'_>) -> anyhow::Result<TaskRecord> {
        let url = self.url("/tasks/");
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("POST {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("POST {url} returned {status}"));
        }

        resp.json().context("failed parsing created task")
    }

    #[tracing::instrument(skip(self, patch))]
    pub fn update_task(&self, id: u64, patch: &TaskPatch) -> anyhow::Result<TaskRecord> {
        let url = self.url(&format!("/tasks/{id}"));
        let resp = self
            .http
            .patch(&url)
            .json(patch)
            .send()
            .with_context(|| format!("PATCH {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("PATCH {url} returned {status}"));
        }

        resp.json().context("failed parsing updated task")
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_task(&self, id: u64) -> anyhow::Result<()> {
        let url = self.url(&format!("/tasks/{id}"));
        let resp = self
            .http
            .delete(&url)
            .send()
            .with_context(|| format!("DELETE {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("DELETE {url} returned {status}"));
        }
        Ok(())
    }

    /// Fetches the full state, creating the default list first when the
    /// service reports none. Returns lists in server order, so the
    /// first one is the default list.
    #[tracing::instrument(skip(self))]
    pub fn load_data(&self) -> anyhow::Result<(Vec<List>, Vec<Task>)> {
        let mut records = self.fetch_lists()?;
        if records.is_empty() {
            info!(name = DEFAULT_LIST_NAME, "empty service, bootstrapping");
            let created = self.create_list(DEFAULT_LIST_NAME)?;
            records = vec![created];
        }

        let lists = records
            .iter()
            .map(|r| List {
                id: r.id,
                name: r.name.clone(),
            })
            .collect();
        let tasks = records
            .into_iter()
            .flat_map(|r| r.tasks)
            .map(Task::from)
            .collect();
        Ok((lists, tasks))
    }
}
