use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::ScoreError;
use crate::snapshot::{ClientSnapshot, ProjectSnapshot};
use crate::sync::{validate_settings, WorkspaceSettings};

pub const WORKSPACE_FILE_VERSION: u32 = 1;

/// Everything the scorer needs about one workspace, as a single document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceData {
    pub version: u32,
    pub id: String,

    #[serde(default)]
    pub settings: WorkspaceSettings,

    #[serde(default)]
    pub projects: Vec<ProjectSnapshot>,

    #[serde(default)]
    pub clients: Vec<ClientSnapshot>,
}

impl WorkspaceData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            version: WORKSPACE_FILE_VERSION,
            id: id.into(),
            settings: WorkspaceSettings::default(),
            projects: Vec::new(),
            clients: Vec::new(),
        }
    }
}

/// Get the default workspace file path (~/.config/healthscore/workspace.json)
pub fn get_workspace_path() -> PathBuf {
    crate::config::get_config_dir().join("workspace.json")
}

/// Load a workspace document from a JSON file
///
/// Structurally invalid snapshots are reported as invalid input, and files
/// written by an unknown version or carrying invalid settings are rejected.
pub fn load_workspace(path: &Path) -> Result<WorkspaceData> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open workspace file at {}", path.display()))?;

    let data: WorkspaceData = serde_json::from_reader(file)
        .map_err(|e| ScoreError::invalid_input("workspace", e))
        .with_context(|| format!("Failed to load workspace from {}", path.display()))?;

    if data.version != WORKSPACE_FILE_VERSION {
        return Err(ScoreError::UnsupportedVersion(data.version).into());
    }

    if let Err(errors) = validate_settings(&data.settings) {
        return Err(ScoreError::Config(errors.join("; ")))
            .with_context(|| format!("Invalid settings in {}", path.display()));
    }

    Ok(data)
}

/// Save a workspace document to a JSON file atomically
///
/// The file is never left half-written: readers see the old or the new
/// document.
pub fn save_workspace(path: &Path, data: &WorkspaceData) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, data).context("Failed to serialize workspace")?;

    file.commit().context("Failed to save workspace")?;

    Ok(())
}
