use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, CONFIG_FILE};
use crate::model::ScopeConfig;
use crate::service::LocalTaskService;

use super::runtime;

const CONFIG_TEMPLATE: &str = r##"# tasktree configuration

[store]
# Directory holding tasks.json, relative to this file
data_dir = ".tasktree"

# --- UI Customization ---
# Uncomment and edit to override defaults.

[ui]
# date_format = "%d-%m-%Y"
# blur_grace_ms = 100
# indent = 2
# show_key_hints = false
#
# [ui.colors]
# background = "#0C001B"
# text = "#B0AAFF"
# highlight = "#FB4196"
# checked_bg = "#221A44"
# edit_bg = "#2A2A55"

# --- Scopes ---
# One [[scopes]] entry per project; add more with:
#   tasktree init --scope <id> "name"
"##;

/// Validate that a scope ID is non-empty and free of whitespace.
fn validate_scope_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("scope id cannot be empty".to_string());
    }
    if id.chars().any(char::is_whitespace) {
        return Err(format!("invalid scope id \"{}\": no spaces allowed", id));
    }
    Ok(())
}

pub fn cmd_init(
    dir: &Path,
    config_path: Option<&Path>,
    args: InitArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let [id, name] = args.scope.as_slice() else {
        return Err("--scope takes an id and a name".into());
    };
    validate_scope_id(id)?;

    let path = config_path.map_or_else(|| dir.join(CONFIG_FILE), Path::to_path_buf);
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, CONFIG_TEMPLATE)?;
        println!("Created {}", path.display());
    }

    let (config, mut doc) = config_io::read_config(&path)?;
    let scope = ScopeConfig {
        id: id.clone(),
        name: name.clone(),
        currency: args.currency.clone(),
    };
    config_io::add_scope_to_config(&mut doc, &scope)?;
    if args.default || config.default_scope.is_none() {
        config_io::set_default_scope(&mut doc, id);
    }
    config_io::write_config(&path, &doc)?;

    let loaded = config_io::load_config(dir, Some(&path))?;
    let service = LocalTaskService::open(&loaded.data_dir());
    runtime()?.block_on(service.ensure_scope(id, args.currency.as_deref()))?;

    println!("Registered scope {} ({})", id, name);
    Ok(())
}
