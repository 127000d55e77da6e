use std::fs;
use std::path::{Path, PathBuf};

use crate::io::task_file::atomic_write;
use crate::model::config::{AppConfig, ScopeConfig};

/// File name of the configuration, looked up in the working directory
pub const CONFIG_FILE: &str = "tasktree.toml";

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("could not parse {path}: {source}")]
    Document {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
    #[error("scope already exists: {0}")]
    DuplicateScope(String),
}

/// A loaded config together with where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// `None` when no file exists and defaults are in use
    pub path: Option<PathBuf>,
    /// Directory relative paths in the config resolve against
    pub base_dir: PathBuf,
}

impl LoadedConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.store.data_dir)
    }
}

/// Load `path` if given, else `<dir>/tasktree.toml`. A missing default file
/// yields the default config; a missing explicit file is an error.
pub fn load_config(dir: &Path, path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let (config_path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (dir.join(CONFIG_FILE), false),
    };
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
    if !required && !config_path.exists() {
        return Ok(LoadedConfig {
            config: AppConfig::default(),
            path: None,
            base_dir,
        });
    }
    let (config, _doc) = read_config(&config_path)?;
    Ok(LoadedConfig {
        config,
        path: Some(config_path),
        base_dir,
    })
}

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for format-preserving edits.
pub fn read_config(path: &Path) -> Result<(AppConfig, toml_edit::DocumentMut), ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: AppConfig = toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    let doc: toml_edit::DocumentMut = text.parse().map_err(|e| ConfigError::Document {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok((config, doc))
}

/// Write the document back, preserving formatting
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    atomic_write(path, doc.to_string().as_bytes()).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Append a `[[scopes]]` entry
pub fn add_scope_to_config(
    doc: &mut toml_edit::DocumentMut,
    scope: &ScopeConfig,
) -> Result<(), ConfigError> {
    let exists = doc
        .get("scopes")
        .and_then(|item| item.as_array_of_tables())
        .is_some_and(|scopes| {
            scopes
                .iter()
                .any(|t| t.get("id").and_then(|v| v.as_str()) == Some(scope.id.as_str()))
        });
    if exists {
        return Err(ConfigError::DuplicateScope(scope.id.clone()));
    }

    let mut table = toml_edit::Table::new();
    // Comments at the end of the file would otherwise print after the entry
    if let Some(comments) = take_trailing_comments(doc) {
        table.decor_mut().set_prefix(comments);
    }
    table["id"] = toml_edit::value(&scope.id);
    table["name"] = toml_edit::value(&scope.name);
    if let Some(currency) = &scope.currency {
        table["currency"] = toml_edit::value(currency);
    }

    if !doc.contains_key("scopes") {
        doc["scopes"] = toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new());
    }
    if let Some(scopes) = doc["scopes"].as_array_of_tables_mut() {
        scopes.push(table);
    }
    Ok(())
}

/// Detach the comments after the last table, if any
fn take_trailing_comments(doc: &mut toml_edit::DocumentMut) -> Option<String> {
    let trailing = doc.trailing().as_str().unwrap_or_default();
    if trailing.trim().is_empty() {
        return None;
    }
    let mut comments = trailing.to_string();
    if !comments.ends_with('\n') {
        comments.push('\n');
    }
    doc.set_trailing("");
    Some(comments)
}

/// Set the top-level `default_scope`. A new key goes below the file's
/// header comment, which is stored in front of the first table.
pub fn set_default_scope(doc: &mut toml_edit::DocumentMut, scope_id: &str) {
    if doc.contains_key("default_scope") {
        doc["default_scope"] = toml_edit::value(scope_id);
        return;
    }
    let header = doc
        .as_table_mut()
        .iter_mut()
        .filter_map(|(_, item)| item.as_table_mut())
        .min_by_key(|t| t.position().unwrap_or(usize::MAX))
        .and_then(|first| {
            let prefix = first.decor().prefix()?.as_str()?.to_string();
            if !prefix.trim_start().starts_with('#') {
                return None;
            }
            first.decor_mut().set_prefix("\n");
            Some(prefix)
        });
    doc["default_scope"] = toml_edit::value(scope_id);
    if let Some(header) = header
        && let Some(mut key) = doc.key_mut("default_scope")
    {
        key.leaf_decor_mut()
            .set_prefix(format!("{}\n", header.trim_end()));
    }
}
