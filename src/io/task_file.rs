use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::model::{TaskMeta, TaskRecord};

/// File name of the task store inside the data directory
pub const STORE_FILE: &str = "tasks.json";

/// Error type for the on-disk task store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything the local store keeps: every scope's tasks plus the id counter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreFile {
    /// Last number handed out for `TASK-NNNN` ids
    #[serde(default)]
    pub last_seq: u32,
    #[serde(default)]
    pub scopes: IndexMap<String, ScopeData>,
}

impl StoreFile {
    /// Scope that holds task `id`
    pub fn scope_of(&self, id: &str) -> Option<&str> {
        self.scopes
            .iter()
            .find(|(_, data)| data.tasks.iter().any(|t| t.id == id))
            .map(|(scope, _)| scope.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeData {
    #[serde(default)]
    pub meta: ScopeMeta,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

/// Meta as stored; empty option lists fall back to the defaults on read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_options: Vec<String>,
}

impl ScopeMeta {
    pub fn to_task_meta(&self) -> TaskMeta {
        TaskMeta {
            currency: self.currency.clone(),
            status_options: self.status_options.clone(),
            priority_options: self.priority_options.clone(),
        }
        .with_fallbacks()
    }
}

pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE)
}

/// Read the store. A missing file is an empty store.
pub fn read_store(path: &Path) -> Result<StoreFile, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreFile::default()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&text).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the store atomically, creating the data directory if needed
pub fn write_store(path: &Path, store: &StoreFile) -> Result<(), StoreError> {
    let mut json = serde_json::to_string_pretty(store)?;
    json.push('\n');
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    atomic_write(path, json.as_bytes()).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write via a temp file in the same directory, then rename over the target
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
