mod init;
pub use init::cmd_init;

use std::error::Error;
use std::path::Path;

use tokio::runtime::Runtime;
use tracing::info;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::controller::{LoadState, NoticeLevel, TaskTreeController};
use crate::io::config_io::{self, LoadedConfig};
use crate::model::{FieldKind, FieldValue, TaskField, TaskFields};
use crate::service::{LocalTaskService, ServiceError, TaskService};
use crate::sync;
use crate::table::DisplayFormat;

type CmdResult = Result<(), Box<dyn Error>>;

/// Single-threaded runtime for one CLI command
pub(super) fn runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let dir = match &cli.dir {
        Some(d) => std::fs::canonicalize(d)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", d.display(), e))?,
        None => std::env::current_dir()?,
    };
    let Some(command) = cli.command else {
        return Err("no command given (try `tasktree --help`)".into());
    };
    if let Commands::Init(args) = command {
        return cmd_init(&dir, cli.config.as_deref(), args);
    }

    let loaded = config_io::load_config(&dir, cli.config.as_deref())?;
    let ctx = Context::new(&loaded)?;
    match command {
        Commands::Init(_) => Ok(()),
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Set(args) => cmd_set(&ctx, args),
        Commands::Delete(args) => cmd_delete(&ctx, args),
        Commands::Recalc(args) => cmd_recalc(&ctx, args),
    }
}

/// What every command needs: config, service and a runtime to drive it
struct Context<'a> {
    loaded: &'a LoadedConfig,
    service: LocalTaskService,
    rt: Runtime,
}

impl<'a> Context<'a> {
    fn new(loaded: &'a LoadedConfig) -> Result<Self, Box<dyn Error>> {
        Ok(Context {
            loaded,
            service: LocalTaskService::open(&loaded.data_dir()),
            rt: runtime()?,
        })
    }

    fn scope(&self, explicit: Option<&str>) -> Result<String, Box<dyn Error>> {
        self.loaded
            .config
            .resolve_scope(explicit)
            .ok_or_else(|| "no scope given and none configured (try `tasktree init`)".into())
    }

    fn format(&self) -> DisplayFormat {
        DisplayFormat {
            date_format: self.loaded.config.ui.date_format.clone(),
            currency: None,
            indent: self.loaded.config.ui.indent,
        }
    }

    /// A controller for `scope` with its first listing loaded
    fn mount(&self, scope: &str) -> Result<TaskTreeController, Box<dyn Error>> {
        let mut controller = TaskTreeController::mount(scope, self.format());
        self.rt.block_on(sync::drain(&mut controller, &self.service));
        if let LoadState::Failed(reason) = controller.load_state() {
            return Err(reason.clone().into());
        }
        Ok(controller)
    }
}

/// Print the controller's notices; an error notice fails the command
fn report(controller: &mut TaskTreeController) -> CmdResult {
    let mut failure = None;
    for notice in controller.take_notices() {
        match notice.level {
            NoticeLevel::Error => failure = Some(notice.text),
            NoticeLevel::Warning => eprintln!("{}", format_notice(&notice)),
            NoticeLevel::Info | NoticeLevel::Success => println!("{}", format_notice(&notice)),
        }
    }
    match failure {
        Some(text) => Err(text.into()),
        None => Ok(()),
    }
}

/// Parse a CLI value for `field` against the scope's option lists
fn parse_value(
    field: TaskField,
    raw: &str,
    meta: &crate::model::TaskMeta,
) -> Result<FieldValue, Box<dyn Error>> {
    FieldKind::for_field(field, meta)
        .parse(raw)
        .map_err(|e| format!("{}: {}", field.label(), e).into())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let scope = ctx.scope(args.scope.as_deref())?;
    let controller = ctx.mount(&scope)?;
    let name = ctx.loaded.config.scope_name(&scope);
    if args.json {
        let json = listing_json(&scope, name, controller.tree());
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        for line in format_listing(name, &scope, controller.surface()) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let (scope, subject) = args.scope_and_subject();
    let scope = ctx.scope(scope)?;
    if args.group && args.parent.is_some() {
        return Err("a group task cannot have a parent".into());
    }
    let meta = ctx.rt.block_on(ctx.service.list_tasks(&scope))?.meta.with_fallbacks();

    let mut fields = TaskFields::new();
    fields.insert(TaskField::Subject, FieldValue::text(subject.trim()));
    if let Some(parent) = &args.parent {
        fields.insert(TaskField::Parent, FieldValue::text(parent));
    }
    if let Some(status) = &args.status {
        fields.insert(TaskField::Status, parse_value(TaskField::Status, status, &meta)?);
    }
    if let Some(priority) = &args.priority {
        fields.insert(TaskField::Priority, parse_value(TaskField::Priority, priority, &meta)?);
    }
    if args.group {
        fields.insert(TaskField::IsGroup, FieldValue::Flag(true));
    }

    let record = ctx.rt.block_on(ctx.service.create_task(&scope, &fields))?;
    info!(id = %record.id, scope = %scope, "task created from cli");
    println!("{}", record.id);
    Ok(())
}

fn cmd_set(ctx: &Context, args: SetArgs) -> CmdResult {
    let field: TaskField = args.field.parse()?;
    let scope = match args.scope {
        Some(s) => s,
        None => {
            let store = ctx.rt.block_on(ctx.service.snapshot())?;
            store
                .scope_of(&args.id)
                .map(str::to_string)
                .ok_or(ServiceError::NotFound(args.id.clone()))?
        }
    };
    let meta = ctx.rt.block_on(ctx.service.list_tasks(&scope))?.meta.with_fallbacks();
    let value = parse_value(field, &args.value, &meta)?;

    let mut fields = TaskFields::new();
    fields.insert(field, value);
    ctx.rt.block_on(ctx.service.update_task(&args.id, &fields))?;
    println!("{}: {} = {}", args.id, field, args.value);
    Ok(())
}

fn cmd_delete(ctx: &Context, args: DeleteArgs) -> CmdResult {
    if !args.yes {
        return Err(
            "refusing to delete without --yes (child and dependent tasks are deleted too)".into(),
        );
    }
    let store = ctx.rt.block_on(ctx.service.snapshot())?;
    let scope = store
        .scope_of(&args.ids[0])
        .ok_or(ServiceError::NotFound(args.ids[0].clone()))?
        .to_string();

    let mut controller = ctx.mount(&scope)?;
    for id in &args.ids {
        if controller.record(id).is_none() {
            return Err(ServiceError::NotFound(id.clone()).into());
        }
        controller.set_row_checked(id, true);
    }
    if controller.request_delete_selected() {
        controller.confirm();
    }
    ctx.rt.block_on(sync::drain(&mut controller, &ctx.service));
    report(&mut controller)
}

fn cmd_recalc(ctx: &Context, args: RecalcArgs) -> CmdResult {
    let scope = ctx.scope(args.scope.as_deref())?;
    let mut controller = ctx.mount(&scope)?;
    controller.recalculate();
    ctx.rt.block_on(sync::drain(&mut controller, &ctx.service));
    report(&mut controller)
}
