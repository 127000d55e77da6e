use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from tasktree.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Scope opened when none is given on the command line
    #[serde(default)]
    pub default_scope: Option<String>,
    #[serde(default)]
    pub scopes: Vec<ScopeConfig>,
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Display name for a scope, falling back to its ID
    pub fn scope_name<'a>(&'a self, scope_id: &'a str) -> &'a str {
        self.scopes
            .iter()
            .find(|s| s.id == scope_id)
            .map(|s| s.name.as_str())
            .unwrap_or(scope_id)
    }

    /// Pick the scope to open: explicit, then configured default, then the first listed
    pub fn resolve_scope(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.default_scope.clone().filter(|s| !s.is_empty()))
            .or_else(|| self.scopes.first().map(|s| s.id.clone()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per scope, relative to the config file
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    ".tasktree".to_string()
}

/// A scope (project) whose tasks are listed and mutated as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub id: String,
    pub name: String,
    /// Currency code shown in the cost column
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// chrono format string for date cells
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Delay between losing focus and committing an inline edit
    #[serde(default = "default_blur_grace_ms")]
    pub blur_grace_ms: u64,
    /// Indentation per tree level, in cells
    #[serde(default = "default_indent")]
    pub indent: usize,
    #[serde(default)]
    pub show_key_hints: bool,
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            date_format: default_date_format(),
            blur_grace_ms: default_blur_grace_ms(),
            indent: default_indent(),
            show_key_hints: false,
            colors: HashMap::new(),
        }
    }
}

fn default_date_format() -> String {
    "%d-%m-%Y".to_string()
}

fn default_blur_grace_ms() -> u64 {
    100
}

fn default_indent() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.data_dir, ".tasktree");
        assert_eq!(config.ui.date_format, "%d-%m-%Y");
        assert_eq!(config.ui.blur_grace_ms, 100);
        assert!(config.resolve_scope(None).is_none());
    }

    #[test]
    fn resolve_scope_order() {
        let config: AppConfig = toml::from_str(
            r#"
default_scope = "PROJ-2"

[[scopes]]
id = "PROJ-1"
name = "Tower A"

[[scopes]]
id = "PROJ-2"
name = "Tower B"
"#,
        )
        .unwrap();
        assert_eq!(config.resolve_scope(Some("X")).as_deref(), Some("X"));
        assert_eq!(config.resolve_scope(None).as_deref(), Some("PROJ-2"));
        assert_eq!(config.scope_name("PROJ-1"), "Tower A");
        assert_eq!(config.scope_name("nope"), "nope");
    }
}
