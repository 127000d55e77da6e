use std::io;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::controller::{Notice, TaskTreeController};
use crate::io::config_io::LoadedConfig;
use crate::io::watcher::StoreWatcher;
use crate::logging;
use crate::service::{LocalTaskService, ServiceError, TaskService};
use crate::sync::{self, RemoteOp, Reply, Request, Ticket};
use crate::table::{Column, DisplayFormat};

use super::input;
use super::render;
use super::theme::Theme;

/// Log file inside the data directory
pub const LOG_FILE: &str = "tasktree.log";

/// Longest wait for terminal input between redraws
const FRAME_POLL: Duration = Duration::from_millis(250);

/// Current interaction mode, derived from controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// A cell editor has focus
    Edit,
    /// The task form is open
    Dialog,
    /// A delete confirmation is pending
    Confirm,
}

/// Main application state
pub struct App {
    pub controller: TaskTreeController,
    pub theme: Theme,
    /// Display name of the open scope
    pub scope_name: String,
    /// Index into the visible rows
    pub cursor: usize,
    /// Column the cursor sits on; always an editable one
    pub column: Column,
    /// First visible row shown
    pub scroll_offset: usize,
    pub show_help: bool,
    pub show_key_hints: bool,
    pub should_quit: bool,
    /// Most recent notice, shown in the status row
    pub status: Option<Notice>,
}

impl App {
    pub fn new(controller: TaskTreeController, theme: Theme, scope_name: String) -> Self {
        App {
            controller,
            theme,
            scope_name,
            cursor: 0,
            column: Column::Status,
            scroll_offset: 0,
            show_help: false,
            show_key_hints: false,
            should_quit: false,
            status: None,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.controller.confirmation().is_some() {
            Mode::Confirm
        } else if self.controller.dialog().is_some() {
            Mode::Dialog
        } else if self.controller.editing().is_some() {
            Mode::Edit
        } else {
            Mode::Navigate
        }
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.controller
            .surface()
            .visible_ids()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Task under the cursor
    pub fn cursor_id(&self) -> Option<String> {
        self.visible_ids().into_iter().nth(self.cursor)
    }

    /// Put the cursor on `id` if it is visible
    pub fn focus_task(&mut self, id: &str) {
        if let Some(pos) = self.visible_ids().iter().position(|v| v == id) {
            self.cursor = pos;
        }
    }

    pub fn clamp_cursor(&mut self) {
        let n = self.controller.surface().visible_positions().len();
        self.cursor = self.cursor.min(n.saturating_sub(1));
    }

    /// Move the latest controller notice into the status row
    pub fn absorb_notices(&mut self) {
        if let Some(last) = self.controller.take_notices().pop() {
            self.status = Some(last);
        }
    }
}

/// A finished request on its way back to the UI thread
struct Completion {
    ticket: Ticket,
    mutated: bool,
    result: Result<Reply, ServiceError>,
}

/// Runs requests on the tokio runtime and reports back over a channel
struct Dispatcher {
    runtime: Runtime,
    service: Arc<dyn TaskService>,
    tx: mpsc::Sender<Completion>,
}

impl Dispatcher {
    fn dispatch(&self, req: Request) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let mutated = !matches!(req.op, RemoteOp::List { .. });
            let result = sync::execute(service.as_ref(), &req.op).await;
            let _ = tx.send(Completion {
                ticket: req.ticket,
                mutated,
                result,
            });
        });
    }
}

/// Run the TUI application
pub fn run(loaded: &LoadedConfig, scope: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = &loaded.config;
    let scope = config
        .resolve_scope(scope)
        .ok_or("no scope given and none configured (try `tasktree init`)")?;
    let data_dir = loaded.data_dir();
    logging::init_file(&data_dir.join(LOG_FILE))?;
    info!(scope = %scope, data_dir = %data_dir.display(), "starting tui");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let (tx, rx) = mpsc::channel();
    let dispatcher = Dispatcher {
        runtime,
        service: Arc::new(LocalTaskService::open(&data_dir)),
        tx,
    };

    let format = DisplayFormat {
        date_format: config.ui.date_format.clone(),
        currency: None,
        indent: config.ui.indent,
    };
    let controller = TaskTreeController::mount_with_grace(
        scope.clone(),
        format,
        Duration::from_millis(config.ui.blur_grace_ms),
    );
    let mut app = App::new(
        controller,
        Theme::from_config(&config.ui),
        config.scope_name(&scope).to_string(),
    );
    app.show_key_hints = config.ui.show_key_hints;

    let mut watcher = match StoreWatcher::start(&data_dir) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!(error = %e, "not watching the task store");
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, &dispatcher, &rx, &mut watcher);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("tui closed");

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    dispatcher: &Dispatcher,
    rx: &mpsc::Receiver<Completion>,
    watcher: &mut Option<StoreWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        for req in app.controller.take_requests() {
            if let Some(w) = watcher.as_mut()
                && !matches!(req.op, RemoteOp::List { .. })
            {
                w.note_own_write(Instant::now());
            }
            dispatcher.dispatch(req);
        }

        terminal.draw(|frame| render::render(frame, app))?;

        let timeout = poll_timeout(app.controller.next_deadline(), Instant::now());
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key, Instant::now());
        }

        while let Ok(done) = rx.try_recv() {
            if done.mutated
                && let Some(w) = watcher.as_mut()
            {
                w.note_own_write(Instant::now());
            }
            app.controller.complete(done.ticket, done.result);
        }

        let now = Instant::now();
        app.controller.tick(now);
        if let Some(w) = watcher.as_mut()
            && w.poll(now)
        {
            info!("task store changed on disk, reloading");
            app.controller.refresh();
        }

        app.absorb_notices();
        app.clamp_cursor();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Wake up in time for the next blur deadline
fn poll_timeout(deadline: Option<Instant>, now: Instant) -> Duration {
    deadline.map_or(FRAME_POLL, |d| {
        d.saturating_duration_since(now).min(FRAME_POLL)
    })
}
