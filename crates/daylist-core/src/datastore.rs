use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::task::{ActiveView, AppData, Settings};

/// Local persistence: the whole application state lives in one JSON
/// blob that is read once and rewritten wholesale after every mutation.
/// Settings keep a dedicated file so they survive independently of the
/// remote service, and the active-view selection is a plain text token.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub state_path: PathBuf,
    pub settings_path: PathBuf,
    pub view_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let state_path = data_dir.join("state.json");
        let settings_path = data_dir.join("settings.json");
        let view_path = data_dir.join("view.data");

        info!(
            data_dir = %data_dir.display(),
            state = %state_path.display(),
            settings = %settings_path.display(),
            view = %view_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            state_path,
            settings_path,
            view_path,
        })
    }

    /// Loads the state blob. A missing file is an empty application,
    /// not an error; a corrupt one is.
    #[tracing::instrument(skip(self))]
    pub fn load_state(&self) -> anyhow::Result<AppData> {
        load_json_or_default(&self.state_path).context("failed to load state.json")
    }

    #[tracing::instrument(skip(self, data))]
    pub fn save_state(&self, data: &AppData) -> anyhow::Result<()> {
        save_json_atomic(&self.state_path, data).context("failed to save state.json")
    }

    /// Loads settings from their dedicated file, merging missing fields
    /// with defaults so older files keep working.
    #[tracing::instrument(skip(self))]
    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        load_json_or_default(&self.settings_path).context("failed to load settings.json")
    }

    #[tracing::instrument(skip(self, settings))]
    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        save_json_atomic(&self.settings_path, settings).context("failed to save settings.json")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_active_view(&self) -> anyhow::Result<ActiveView> {
        if !self.view_path.exists() {
            return Ok(ActiveView::default());
        }
        let raw = fs::read_to_string(&self.view_path)
            .with_context(|| format!("failed reading {}", self.view_path.display()))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Ok(ActiveView::default())
        } else {
            Ok(ActiveView::from_token(trimmed))
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn save_active_view(&self, view: ActiveView) -> anyhow::Result<()> {
        fs::write(&self.view_path, view.to_token())
            .with_context(|| format!("failed writing {}", self.view_path.display()))?;
        Ok(())
    }
}

#[tracing::instrument(skip(path))]
fn load_json_or_default<T>(path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        debug!(file = %path.display(), "file missing, using defaults");
        return Ok(T::default());
    }

    let raw =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&raw).with_context(|| format!("failed parsing {}", path.display()))
}

#[tracing::instrument(skip(path, value))]
fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    debug!(file = %path.display(), "saving json atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    let serialized = serde_json::to_string(value)?;
    temp.write_all(serialized.as_bytes())?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
