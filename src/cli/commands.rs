use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tasktree", about = concat!("tasktree v", env!("CARGO_PKG_VERSION"), " - project tasks as an editable tree"), version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Scope to open in the TUI (default: configured default scope)
    pub scope: Option<String>,

    /// Run against a different directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    /// Config file to use instead of ./tasktree.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a scope (creates tasktree.toml if needed)
    Init(InitArgs),
    /// Print a scope's task tree
    List(ListArgs),
    /// Create a task
    Add(AddArgs),
    /// Change one field of a task
    Set(SetArgs),
    /// Delete tasks together with their children and dependents
    Delete(DeleteArgs),
    /// Roll child dates, hours and status up into parent tasks
    Recalc(RecalcArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Register a scope: --scope <ID> "name"
    #[arg(long, num_args = 2, value_names = ["ID", "NAME"], required = true)]
    pub scope: Vec<String>,
    /// Currency code shown in the cost column
    #[arg(long)]
    pub currency: Option<String>,
    /// Make this the default scope even if one is already set
    #[arg(long)]
    pub default: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Scope to list (default: configured default scope)
    pub scope: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Scope followed by the subject; the scope may be omitted
    #[arg(num_args = 1..=2, value_names = ["SCOPE", "SUBJECT"], required = true)]
    pub words: Vec<String>,
    /// Parent task ID
    #[arg(long)]
    pub parent: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    /// Create a group task (never has a parent)
    #[arg(long)]
    pub group: bool,
}

impl AddArgs {
    /// (scope, subject) from the positional words
    pub fn scope_and_subject(&self) -> (Option<&str>, &str) {
        match self.words.as_slice() {
            [scope, subject] => (Some(scope.as_str()), subject.as_str()),
            [subject] => (None, subject.as_str()),
            _ => (None, ""),
        }
    }
}

#[derive(Args)]
pub struct SetArgs {
    /// Task ID
    pub id: String,
    /// Field name (status, priority, planned_start, ...)
    pub field: String,
    /// New value; an empty string clears the field
    pub value: String,
    /// Scope used to validate options (default: the task's own scope)
    #[arg(long)]
    pub scope: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task IDs
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Confirm the cascading delete
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct RecalcArgs {
    /// Scope to recalculate (default: configured default scope)
    pub scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_scope_is_optional() {
        let cli = Cli::parse_from(["tasktree", "add", "Pour slab", "--parent", "TASK-0001"]);
        let Some(Commands::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.scope_and_subject(), (None, "Pour slab"));
        assert_eq!(args.parent.as_deref(), Some("TASK-0001"));

        let cli = Cli::parse_from(["tasktree", "add", "PROJ-1", "Pour slab"]);
        let Some(Commands::Add(args)) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.scope_and_subject(), (Some("PROJ-1"), "Pour slab"));
    }

    #[test]
    fn bare_scope_opens_tui() {
        let cli = Cli::parse_from(["tasktree", "-C", "/tmp/site", "PROJ-1"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.scope.as_deref(), Some("PROJ-1"));
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/site")));
    }

    #[test]
    fn init_takes_id_and_name() {
        let cli = Cli::parse_from(["tasktree", "init", "--scope", "PROJ-1", "Tower A"]);
        let Some(Commands::Init(args)) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(args.scope, vec!["PROJ-1", "Tower A"]);
    }
}
