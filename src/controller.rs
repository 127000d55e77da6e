use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::model::{TaskFields, TaskMeta, TaskRecord};
use crate::ops::{
    Activation, CellEditor, CellKey, DEFAULT_BLUR_GRACE, EditControl, EditSession, FormMode,
    Resolution, Selection, Settled, TaskForm,
};
use crate::service::ServiceError;
use crate::sync::{DeleteOrigin, Reply, RemoteOp, Request, SyncLayer, Ticket, UpdateOrigin};
use crate::table::{CellState, Column, DisplayFormat, RowSurface, SAVING_PLACEHOLDER, render_rows};
use crate::tree::{self, TaskTree, build_tree};

/// Empty-state text when a scope has no tasks
pub const EMPTY_MESSAGE: &str = "No tasks yet";
/// Empty-state text when the first load failed
pub const LOAD_FAILED_MESSAGE: &str = "Unable to load tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Notice {
            level,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No listing has arrived yet
    Loading,
    Ready,
    /// The first listing failed; nothing to show
    Failed(String),
}

/// Buttons of the table toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    AddTask,
    Refresh,
    ExpandAll,
    CollapseAll,
    Recalculate,
    DeleteSelected,
}

/// A destructive action waiting for an explicit yes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    DeleteSelected { ids: Vec<String> },
    DeleteTask { id: String, subject: String },
}

impl Confirmation {
    pub fn message(&self) -> String {
        match self {
            Confirmation::DeleteSelected { ids } => format!(
                "Are you sure you want to FORCE delete {} selected task(s) AND all connected tasks (children + dependent tasks)? This action cannot be undone.",
                ids.len()
            ),
            Confirmation::DeleteTask { subject, .. } => format!(
                "Are you sure you want to FORCE delete the task '{}' AND all connected tasks (children + dependent tasks)? This action cannot be undone.",
                subject
            ),
        }
    }

    fn ids(&self) -> Vec<String> {
        match self {
            Confirmation::DeleteSelected { ids } => ids.clone(),
            Confirmation::DeleteTask { id, .. } => vec![id.clone()],
        }
    }

    fn origin(&self) -> DeleteOrigin {
        match self {
            Confirmation::DeleteSelected { .. } => DeleteOrigin::Selection,
            Confirmation::DeleteTask { .. } => DeleteOrigin::Row,
        }
    }
}

/// One mounted task table: the last fetched records, the tree and rows built
/// from them, and every piece of interaction state layered on top.
pub struct TaskTreeController {
    scope: String,
    format: DisplayFormat,
    records: IndexMap<String, TaskRecord>,
    meta: TaskMeta,
    tree: TaskTree,
    surface: RowSurface,
    selection: Selection,
    editor: CellEditor,
    sync: SyncLayer,
    notices: Vec<Notice>,
    confirmation: Option<Confirmation>,
    dialog: Option<TaskForm>,
    /// Ticket of the dialog submit in flight, if any
    dialog_ticket: Option<Ticket>,
    load_state: LoadState,
}

impl TaskTreeController {
    /// Create the controller for `scope` and queue the initial listing
    pub fn mount(scope: impl Into<String>, format: DisplayFormat) -> Self {
        TaskTreeController::mount_with_grace(scope, format, DEFAULT_BLUR_GRACE)
    }

    pub fn mount_with_grace(scope: impl Into<String>, format: DisplayFormat, grace: Duration) -> Self {
        let mut controller = TaskTreeController {
            scope: scope.into(),
            format,
            records: IndexMap::new(),
            meta: TaskMeta::default(),
            tree: TaskTree::default(),
            surface: RowSurface::default(),
            selection: Selection::default(),
            editor: CellEditor::new(grace),
            sync: SyncLayer::default(),
            notices: Vec::new(),
            confirmation: None,
            dialog: None,
            dialog_ticket: None,
            load_state: LoadState::Loading,
        };
        info!(scope = %controller.scope, "mounting task table");
        controller.refresh();
        controller
    }

    // -- accessors ---------------------------------------------------------

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    pub fn format(&self) -> &DisplayFormat {
        &self.format
    }

    pub fn tree(&self) -> &TaskTree {
        &self.tree
    }

    pub fn surface(&self) -> &RowSurface {
        &self.surface
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn editor(&self) -> &CellEditor {
        &self.editor
    }

    pub fn record(&self, id: &str) -> Option<&TaskRecord> {
        self.records.get(id)
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    pub fn dialog(&self) -> Option<&TaskForm> {
        self.dialog.as_ref()
    }

    pub fn dialog_mut(&mut self) -> Option<&mut TaskForm> {
        self.dialog.as_mut()
    }

    /// Whether a dialog submit is waiting for the service
    pub fn dialog_busy(&self) -> bool {
        self.dialog_ticket.is_some()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Text to show instead of the table, if any
    pub fn empty_message(&self) -> Option<&'static str> {
        match &self.load_state {
            LoadState::Failed(_) => Some(LOAD_FAILED_MESSAGE),
            LoadState::Ready if self.surface.is_empty() => Some(EMPTY_MESSAGE),
            _ => None,
        }
    }

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice::new(level, text));
    }

    // -- remote plumbing ---------------------------------------------------

    /// Requests queued since the last call
    pub fn take_requests(&mut self) -> Vec<Request> {
        self.sync.take_requests()
    }

    pub fn requests_in_flight(&self) -> usize {
        self.sync.in_flight()
    }

    pub fn is_idle(&self) -> bool {
        self.sync.is_idle()
    }

    /// Queue a full reload
    pub fn refresh(&mut self) -> Ticket {
        let scope = self.scope.clone();
        self.sync.issue(RemoteOp::List { scope })
    }

    /// Deliver the result of a request taken from [`take_requests`]
    ///
    /// [`take_requests`]: TaskTreeController::take_requests
    pub fn complete(&mut self, ticket: Ticket, result: Result<Reply, ServiceError>) {
        let Some(op) = self.sync.settle(ticket) else {
            warn!(%ticket, "completion for unknown request ignored");
            return;
        };
        if self.dialog_ticket == Some(ticket) {
            self.dialog_ticket = None;
        }
        match (op, result) {
            (RemoteOp::List { .. }, result) => self.on_listing(ticket, result),
            (op, Err(e)) => self.on_failure(op, e),
            (_, Ok(Reply::Created(record))) => {
                info!(id = %record.id, "task created");
                if matches!(
                    self.dialog.as_ref().map(|d| &d.mode),
                    Some(FormMode::Create { .. })
                ) {
                    self.dialog = None;
                }
                self.notify(NoticeLevel::Success, "Task created");
                self.refresh();
            }
            (RemoteOp::Update { task_id, origin, .. }, Ok(_)) => {
                info!(id = %task_id, "task updated");
                if origin == UpdateOrigin::Dialog
                    && matches!(
                        self.dialog.as_ref().map(|d| &d.mode),
                        Some(FormMode::Edit { task_id: open }) if *open == task_id
                    )
                {
                    self.dialog = None;
                }
                self.notify(NoticeLevel::Success, "Task updated");
                self.refresh();
            }
            (RemoteOp::Delete { ids, origin, .. }, Ok(Reply::Deleted(outcome))) => {
                info!(requested = ids.len(), deleted = outcome.deleted_count, "tasks deleted");
                if let Some(FormMode::Edit { task_id }) = self.dialog.as_ref().map(|d| &d.mode)
                    && ids.contains(task_id)
                {
                    self.dialog = None;
                }
                let text = match origin {
                    DeleteOrigin::Selection => format!(
                        "{} task(s) deleted successfully (including connected tasks)",
                        outcome.deleted_count
                    ),
                    DeleteOrigin::Row => format!(
                        "Deleted {} task(s) (including connected tasks)",
                        outcome.deleted_count
                    ),
                };
                self.notify(NoticeLevel::Success, text);
                self.refresh();
            }
            (_, Ok(Reply::Recalculated(outcome))) => {
                info!(updated = outcome.updated_count, total = outcome.total_parents, "parents recalculated");
                self.notify(
                    NoticeLevel::Success,
                    format!("Updated {} parent tasks", outcome.updated_count),
                );
                self.refresh();
            }
            (op, Ok(reply)) => {
                warn!(op = op.name(), ?reply, "unexpected reply");
                self.refresh();
            }
        }
    }

    fn on_listing(&mut self, ticket: Ticket, result: Result<Reply, ServiceError>) {
        if self.sync.is_stale_listing(ticket) {
            debug!(%ticket, "discarding stale listing");
            return;
        }
        match result {
            Ok(Reply::Listing(listing)) => self.apply_listing(listing.tasks, listing.meta),
            Ok(other) => warn!(?other, "listing request returned a different reply"),
            Err(e) => {
                warn!(error = %e, "loading tasks failed");
                if self.load_state != LoadState::Ready {
                    self.load_state = LoadState::Failed(e.to_string());
                }
                self.notify(NoticeLevel::Error, format!("{}: {}", LOAD_FAILED_MESSAGE, e));
            }
        }
    }

    fn on_failure(&mut self, op: RemoteOp, e: ServiceError) {
        warn!(op = op.name(), error = %e, "request failed");
        match op {
            RemoteOp::Update {
                origin: UpdateOrigin::Cell {
                    key,
                    original_display,
                },
                ..
            } => {
                self.surface
                    .set_cell(&key.task_id, key.column, &original_display, CellState::Display);
                self.notify(NoticeLevel::Error, format!("Failed to update task: {}", e));
            }
            RemoteOp::Create { .. } => self.dialog_failed("create", e),
            RemoteOp::Update { .. } => self.dialog_failed("update", e),
            RemoteOp::Delete { .. } => {
                self.notify(NoticeLevel::Error, format!("Failed to delete tasks: {}", e));
            }
            RemoteOp::Recalculate { .. } => {
                self.notify(NoticeLevel::Error, format!("Failed to recalculate parents: {}", e));
            }
            RemoteOp::List { .. } => {}
        }
    }

    /// The dialog stays open with the error shown
    fn dialog_failed(&mut self, verb: &str, e: ServiceError) {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.error = Some(e.to_string());
        }
        self.notify(NoticeLevel::Error, format!("Failed to {} task: {}", verb, e));
    }

    /// Replace everything derived from the previous snapshot
    fn apply_listing(&mut self, tasks: Vec<TaskRecord>, meta: TaskMeta) {
        self.meta = meta.with_fallbacks();
        self.format.currency = self.meta.currency.clone();
        self.tree = build_tree(&tasks);
        for anomaly in self.tree.anomalies() {
            warn!(scope = %self.scope, %anomaly, "task list anomaly");
        }
        self.records = IndexMap::with_capacity(tasks.len());
        for task in tasks {
            self.records.entry(task.id.clone()).or_insert(task);
        }
        self.surface = render_rows(&self.tree, &self.format);
        self.selection.clear();
        self.selection.reconcile(&mut self.surface);
        let dropped = self.editor.discard_all();
        if dropped > 0 {
            debug!(dropped, "edit sessions discarded by reload");
        }
        self.load_state = LoadState::Ready;
        debug!(scope = %self.scope, tasks = self.records.len(), "tasks loaded");
    }

    // -- expand / collapse -------------------------------------------------

    pub fn toggle(&mut self, id: &str) {
        if let Some(out) = tree::toggle(&mut self.tree, &mut self.surface, id) {
            let text = if out.expanded {
                format!("\u{25bc} {} child tasks expanded", out.child_count)
            } else {
                format!("\u{25b6} {} child tasks collapsed", out.child_count)
            };
            self.notify(NoticeLevel::Info, text);
        }
    }

    pub fn expand_all(&mut self) {
        tree::expand_all(&mut self.tree, &mut self.surface);
        self.notify(NoticeLevel::Info, "All tasks expanded");
    }

    pub fn collapse_all(&mut self) {
        tree::collapse_all(&mut self.tree, &mut self.surface);
        self.notify(NoticeLevel::Info, "All tasks collapsed");
    }

    // -- selection ---------------------------------------------------------

    pub fn set_row_checked(&mut self, id: &str, checked: bool) {
        self.selection.on_row_checkbox(&mut self.surface, id, checked);
    }

    pub fn set_select_all(&mut self, checked: bool) {
        self.selection.on_select_all(&mut self.surface, checked);
    }

    // -- inline editing ----------------------------------------------------

    /// Activate the editor on a cell. Returns `None` when the cell cannot be
    /// edited.
    pub fn begin_edit(&mut self, id: &str, column: Column, now: Instant) -> Option<Activation> {
        let record = self.records.get(id)?;
        let display = self.surface.cell_text(id, column)?.to_string();
        let key = CellKey {
            task_id: id.to_string(),
            column,
        };
        if self.editor.has_session(&key) {
            return Some(Activation::AlreadyEditing);
        }
        let session = EditSession::open(record, column, &display, &self.meta)?;
        let activation = self.editor.activate(session, now);
        self.surface.set_cell(id, column, &display, CellState::Editing);
        Some(activation)
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editor.focused()
    }

    /// The focused control, for typing into
    pub fn edit_control_mut(&mut self) -> Option<&mut EditControl> {
        self.editor.focused_mut().map(|s| &mut s.control)
    }

    /// Enter in the focused editor
    pub fn commit_edit(&mut self) {
        if let Some(settled) = self.editor.commit_focused() {
            self.apply_settled(settled);
        }
    }

    /// Escape in the focused editor
    pub fn cancel_edit(&mut self) {
        if let Some(settled) = self.editor.cancel_focused() {
            self.apply_settled(settled);
        }
    }

    /// Enter in the focused editor. Text controls commit; a dropdown picks
    /// its highlighted option, which commits only when it differs.
    pub fn confirm_edit(&mut self) {
        let highlighted = match self.editing().map(|s| &s.control) {
            Some(EditControl::Choice { selected, .. }) => Some(*selected),
            Some(EditControl::Text(_)) => None,
            None => return,
        };
        match highlighted {
            Some(Some(index)) => self.choose_option(index),
            Some(None) => {}
            None => self.commit_edit(),
        }
    }

    /// Pick an option in a focused dropdown; a different value commits at once
    pub fn choose_option(&mut self, index: usize) {
        let Some(session) = self.editor.focused_mut() else {
            return;
        };
        let changed = match &mut session.control {
            EditControl::Choice { options, selected } if index < options.len() => {
                *selected = Some(index);
                session.original_value.as_text() != Some(options[index].as_str())
            }
            _ => false,
        };
        if changed {
            self.commit_edit();
        }
    }

    /// Focus left the table (or moved elsewhere)
    pub fn blur(&mut self, now: Instant) {
        self.editor.blur(now);
    }

    /// Advance timers: settle blurred sessions whose grace delay has passed
    pub fn tick(&mut self, now: Instant) {
        for settled in self.editor.tick(now) {
            self.apply_settled(settled);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.editor.next_deadline()
    }

    fn apply_settled(&mut self, settled: Settled) {
        let Settled {
            key,
            field,
            original_display,
            resolution,
        } = settled;
        match resolution {
            Resolution::Revert => {
                self.surface
                    .set_cell(&key.task_id, key.column, &original_display, CellState::Display);
            }
            Resolution::Invalid(e) => {
                self.surface
                    .set_cell(&key.task_id, key.column, &original_display, CellState::Display);
                self.notify(NoticeLevel::Warning, e.to_string());
            }
            Resolution::Commit(value) => {
                if !self.surface.set_cell(
                    &key.task_id,
                    key.column,
                    SAVING_PLACEHOLDER,
                    CellState::Saving,
                ) {
                    debug!(id = %key.task_id, "cell vanished before commit");
                    return;
                }
                let mut fields = TaskFields::new();
                fields.insert(field, value);
                info!(id = %key.task_id, field = %field, "inline update");
                self.sync.issue(RemoteOp::Update {
                    task_id: key.task_id.clone(),
                    fields,
                    origin: UpdateOrigin::Cell {
                        key,
                        original_display,
                    },
                });
            }
        }
    }

    // -- dialogs -----------------------------------------------------------

    pub fn open_create_dialog(&mut self, parent: Option<&str>) {
        self.dialog = Some(TaskForm::create(&self.meta, parent));
    }

    pub fn open_edit_dialog(&mut self, id: &str) -> bool {
        match self.records.get(id) {
            Some(record) => {
                self.dialog = Some(TaskForm::edit(record, &self.meta));
                true
            }
            None => false,
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
        self.dialog_ticket = None;
    }

    /// Validate the dialog and send it. Validation failures stay local.
    pub fn submit_dialog(&mut self) -> Option<Ticket> {
        if self.dialog_ticket.is_some() {
            return None;
        }
        let dialog = self.dialog.as_mut()?;
        let fields = match dialog.collect() {
            Ok(fields) => fields,
            Err(e) => {
                dialog.error = Some(e.to_string());
                self.notify(NoticeLevel::Warning, e.to_string());
                return None;
            }
        };
        dialog.error = None;
        let op = match &dialog.mode {
            FormMode::Create { .. } => RemoteOp::Create {
                scope: self.scope.clone(),
                fields,
            },
            FormMode::Edit { task_id } => RemoteOp::Update {
                task_id: task_id.clone(),
                fields,
                origin: UpdateOrigin::Dialog,
            },
        };
        let ticket = self.sync.issue(op);
        self.dialog_ticket = Some(ticket);
        Some(ticket)
    }

    /// The edit dialog's delete action
    pub fn delete_from_dialog(&mut self) {
        if let Some(FormMode::Edit { task_id }) = self.dialog.as_ref().map(|d| d.mode.clone()) {
            self.request_delete_task(&task_id);
        }
    }

    // -- deletion ----------------------------------------------------------

    /// Ask to delete the selection. Refused when nothing is selected.
    pub fn request_delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            self.notify(
                NoticeLevel::Warning,
                "Please select at least one task to delete.",
            );
            return false;
        }
        self.confirmation = Some(Confirmation::DeleteSelected {
            ids: self.selection.ids(),
        });
        true
    }

    pub fn request_delete_task(&mut self, id: &str) -> bool {
        let Some(record) = self.records.get(id) else {
            return false;
        };
        let subject = if record.subject.is_empty() {
            record.id.clone()
        } else {
            record.subject.clone()
        };
        self.confirmation = Some(Confirmation::DeleteTask {
            id: id.to_string(),
            subject,
        });
        true
    }

    /// Yes on the confirmation prompt
    pub fn confirm(&mut self) -> Option<Ticket> {
        let confirmation = self.confirmation.take()?;
        let ids = confirmation.ids();
        info!(count = ids.len(), "deleting tasks with connected tasks");
        Some(self.sync.issue(RemoteOp::Delete {
            ids,
            force: true,
            delete_connected: true,
            origin: confirmation.origin(),
        }))
    }

    /// No on the confirmation prompt
    pub fn cancel_confirmation(&mut self) {
        self.confirmation = None;
    }

    // -- toolbar -----------------------------------------------------------

    pub fn recalculate(&mut self) -> Ticket {
        let scope = self.scope.clone();
        self.sync.issue(RemoteOp::Recalculate { scope })
    }

    pub fn invoke(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::AddTask => self.open_create_dialog(None),
            ToolbarAction::Refresh => {
                self.refresh();
            }
            ToolbarAction::ExpandAll => self.expand_all(),
            ToolbarAction::CollapseAll => self.collapse_all(),
            ToolbarAction::Recalculate => {
                self.recalculate();
            }
            ToolbarAction::DeleteSelected => {
                self.request_delete_selected();
            }
        }
    }
}
