use std::time::{Duration, Instant};

use crate::model::{FieldError, FieldKind, FieldValue, TaskField, TaskMeta, TaskRecord};
use crate::table::Column;
use crate::util::unicode;

/// Default delay between losing focus and committing
pub const DEFAULT_BLUR_GRACE: Duration = Duration::from_millis(100);

/// Single-line text buffer with a grapheme-aware byte cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub buffer: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn new(text: &str) -> Self {
        TextInput {
            buffer: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn insert(&mut self, c: char) {
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.buffer, self.cursor) {
            self.buffer.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.buffer, self.cursor) {
            self.buffer.drain(self.cursor..next);
        }
    }

    pub fn left(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.buffer, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.buffer, self.cursor) {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

/// The control a cell shows while editing
#[derive(Debug, Clone, PartialEq)]
pub enum EditControl {
    /// Dropdown: `selected` is the highlighted option. `None` until the
    /// user moves the highlight when the current value is not an option.
    Choice {
        options: Vec<String>,
        selected: Option<usize>,
    },
    Text(TextInput),
}

impl EditControl {
    fn for_kind(kind: &FieldKind, current: &FieldValue) -> Self {
        match kind {
            FieldKind::Choice(options) => {
                let current = current.as_text().unwrap_or_default();
                let selected = options.iter().position(|o| o == current);
                EditControl::Choice {
                    options: options.clone(),
                    selected,
                }
            }
            _ => EditControl::Text(TextInput::new(&current.to_input())),
        }
    }

    /// Raw value the control currently holds; empty for an untouched
    /// dropdown with no matching option
    pub fn raw(&self) -> &str {
        match self {
            EditControl::Choice { options, selected } => selected
                .and_then(|i| options.get(i))
                .map_or("", String::as_str),
            EditControl::Text(input) => input.as_str(),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, EditControl::Choice { .. })
    }

    /// Move a dropdown highlight; starts from either end when nothing is
    /// highlighted yet
    pub fn step(&mut self, forward: bool) {
        if let EditControl::Choice { options, selected } = self
            && !options.is_empty()
        {
            let n = options.len();
            *selected = Some(match (*selected, forward) {
                (Some(i), true) => (i + 1) % n,
                (Some(i), false) => (i + n - 1) % n,
                (None, true) => 0,
                (None, false) => n - 1,
            });
        }
    }
}

/// Identifies one editable cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub task_id: String,
    pub column: Column,
}

/// Live editing state of one cell
#[derive(Debug, Clone)]
pub struct EditSession {
    pub key: CellKey,
    pub field: TaskField,
    pub kind: FieldKind,
    /// Cell text before editing, restored on revert
    pub original_display: String,
    pub original_value: FieldValue,
    pub control: EditControl,
    /// Set once the session has committed or cancelled
    pub saved: bool,
    /// When a blurred session settles
    pub blur_deadline: Option<Instant>,
}

impl EditSession {
    /// Open a session on `column` of `record`; `None` when the column is not
    /// inline-editable.
    pub fn open(
        record: &TaskRecord,
        column: Column,
        original_display: &str,
        meta: &TaskMeta,
    ) -> Option<Self> {
        let field = column.field()?;
        let kind = FieldKind::inline_for(field, meta)?;
        let original_value = record.value(field);
        let control = EditControl::for_kind(&kind, &original_value);
        Some(EditSession {
            key: CellKey {
                task_id: record.id.clone(),
                column,
            },
            field,
            kind,
            original_display: original_display.to_string(),
            original_value,
            control,
            saved: false,
            blur_deadline: None,
        })
    }

    /// Decide what committing now would do. Only the first call settles.
    fn settle(&mut self, cancel: bool) -> Option<Settled> {
        if self.saved {
            return None;
        }
        self.saved = true;
        let resolution = if cancel {
            Resolution::Revert
        } else {
            match self.kind.parse(self.control.raw()) {
                Ok(FieldValue::Empty) => Resolution::Revert,
                Ok(value) if value == self.original_value => Resolution::Revert,
                Ok(value) => Resolution::Commit(value),
                Err(e) => Resolution::Invalid(e),
            }
        };
        Some(Settled {
            key: self.key.clone(),
            field: self.field,
            original_display: self.original_display.clone(),
            resolution,
        })
    }
}

/// What a settled session asks the caller to do
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Restore the pre-edit display; nothing is sent
    Revert,
    /// Send a single-field update
    Commit(FieldValue),
    /// The typed value did not parse; restore and report
    Invalid(FieldError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    pub key: CellKey,
    pub field: TaskField,
    pub original_display: String,
    pub resolution: Resolution,
}

/// Outcome of activating a cell
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    Opened,
    /// The cell already has a session
    AlreadyEditing,
}

/// All open edit sessions. At most one has focus; blurred sessions wait out
/// the grace delay and then settle.
#[derive(Debug, Clone)]
pub struct CellEditor {
    sessions: Vec<EditSession>,
    focused: Option<CellKey>,
    grace: Duration,
}

impl Default for CellEditor {
    fn default() -> Self {
        CellEditor::new(DEFAULT_BLUR_GRACE)
    }
}

impl CellEditor {
    pub fn new(grace: Duration) -> Self {
        CellEditor {
            sessions: Vec::new(),
            focused: None,
            grace,
        }
    }

    pub fn has_session(&self, key: &CellKey) -> bool {
        self.sessions.iter().any(|s| &s.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session(&self, key: &CellKey) -> Option<&EditSession> {
        self.sessions.iter().find(|s| &s.key == key)
    }

    pub fn focused(&self) -> Option<&EditSession> {
        let key = self.focused.as_ref()?;
        self.session(key)
    }

    pub fn focused_mut(&mut self) -> Option<&mut EditSession> {
        let key = self.focused.clone()?;
        self.sessions.iter_mut().find(|s| s.key == key)
    }

    /// Start editing `session.key`. The previously focused session is blurred.
    pub fn activate(&mut self, session: EditSession, now: Instant) -> Activation {
        if self.has_session(&session.key) {
            return Activation::AlreadyEditing;
        }
        self.blur(now);
        self.focused = Some(session.key.clone());
        self.sessions.push(session);
        Activation::Opened
    }

    /// The focused session loses focus and will settle after the grace delay
    pub fn blur(&mut self, now: Instant) {
        let deadline = now + self.grace;
        if let Some(session) = self.focused_mut() {
            session.blur_deadline = Some(deadline);
        }
        self.focused = None;
    }

    /// Enter: settle the focused session as a commit
    pub fn commit_focused(&mut self) -> Option<Settled> {
        self.settle_focused(false)
    }

    /// Escape: settle the focused session as a revert
    pub fn cancel_focused(&mut self) -> Option<Settled> {
        self.settle_focused(true)
    }

    fn settle_focused(&mut self, cancel: bool) -> Option<Settled> {
        let key = self.focused.take()?;
        let pos = self.sessions.iter().position(|s| s.key == key)?;
        let mut session = self.sessions.remove(pos);
        session.settle(cancel)
    }

    /// Settle every blurred session whose grace delay has passed
    pub fn tick(&mut self, now: Instant) -> Vec<Settled> {
        let mut settled = Vec::new();
        let mut i = 0;
        while i < self.sessions.len() {
            let due = self.sessions[i].blur_deadline.is_some_and(|d| d <= now);
            if due {
                let mut session = self.sessions.remove(i);
                settled.extend(session.settle(false));
            } else {
                i += 1;
            }
        }
        settled
    }

    /// Earliest pending blur deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions.iter().filter_map(|s| s.blur_deadline).min()
    }

    /// Drop every session without settling; returns how many were open
    pub fn discard_all(&mut self) -> usize {
        self.focused = None;
        let n = self.sessions.len();
        self.sessions.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn record() -> TaskRecord {
        let mut r = TaskRecord::new("T1", "Formwork");
        r.planned_start = NaiveDate::from_ymd_opt(2025, 4, 1);
        r.planned_hours = 8.0;
        r
    }

    fn open(column: Column, display: &str) -> EditSession {
        EditSession::open(&record(), column, display, &TaskMeta::default()).unwrap()
    }

    fn type_into(editor: &mut CellEditor, text: &str) {
        if let Some(EditControl::Text(input)) = editor.focused_mut().map(|s| &mut s.control) {
            input.clear();
            for c in text.chars() {
                input.insert(c);
            }
        }
    }

    #[test]
    fn non_editable_columns_have_no_session() {
        assert!(EditSession::open(&record(), Column::Cost, "0.00", &TaskMeta::default()).is_none());
        assert!(EditSession::open(&record(), Column::Subject, "x", &TaskMeta::default()).is_none());
    }

    #[test]
    fn choice_control_starts_on_current_value() {
        let session = open(Column::Priority, "Medium");
        match &session.control {
            EditControl::Choice { options, selected } => {
                assert_eq!(selected.map(|i| options[i].as_str()), Some("Medium"));
            }
            other => panic!("expected choice, got {:?}", other),
        }
    }

    #[test]
    fn value_outside_options_is_not_highlighted() {
        let mut rec = record();
        rec.status = "Template".into();
        let mut editor = CellEditor::default();
        let t0 = Instant::now();
        let session =
            EditSession::open(&rec, Column::Status, "Template", &TaskMeta::default()).unwrap();
        assert!(matches!(session.control, EditControl::Choice { selected: None, .. }));
        assert_eq!(session.control.raw(), "");
        editor.activate(session, t0);
        editor.blur(t0);
        let settled = editor.tick(t0 + Duration::from_millis(200));
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].resolution, Resolution::Revert);
        assert_eq!(settled[0].original_display, "Template");
    }

    #[test]
    fn stepping_an_unhighlighted_choice_starts_at_an_end() {
        let mut control = EditControl::Choice {
            options: vec!["Low".into(), "High".into()],
            selected: None,
        };
        control.step(false);
        assert_eq!(control.raw(), "High");
        control.step(true);
        assert_eq!(control.raw(), "Low");
    }

    #[test]
    fn enter_without_change_reverts() {
        let mut editor = CellEditor::default();
        let now = Instant::now();
        editor.activate(open(Column::PlannedHours, "8.00"), now);
        let settled = editor.commit_focused().unwrap();
        assert_eq!(settled.resolution, Resolution::Revert);
        assert_eq!(settled.original_display, "8.00");
        assert!(editor.is_empty());
    }

    #[test]
    fn enter_with_new_value_commits() {
        let mut editor = CellEditor::default();
        editor.activate(open(Column::PlannedHours, "8.00"), Instant::now());
        type_into(&mut editor, "12.5");
        let settled = editor.commit_focused().unwrap();
        assert_eq!(settled.resolution, Resolution::Commit(FieldValue::Hours(12.5)));
        assert_eq!(settled.field, TaskField::PlannedHours);
    }

    #[test]
    fn empty_control_reverts() {
        let mut editor = CellEditor::default();
        editor.activate(open(Column::PlannedStart, "01-04-2025"), Instant::now());
        type_into(&mut editor, "");
        assert_eq!(editor.commit_focused().unwrap().resolution, Resolution::Revert);
    }

    #[test]
    fn unparsable_value_is_invalid() {
        let mut editor = CellEditor::default();
        editor.activate(open(Column::PlannedStart, "01-04-2025"), Instant::now());
        type_into(&mut editor, "2025-13-01");
        assert!(matches!(
            editor.commit_focused().unwrap().resolution,
            Resolution::Invalid(FieldError::InvalidDate(_))
        ));
    }

    #[test]
    fn escape_reverts_even_after_typing() {
        let mut editor = CellEditor::default();
        editor.activate(open(Column::PlannedHours, "8.00"), Instant::now());
        type_into(&mut editor, "40");
        assert_eq!(editor.cancel_focused().unwrap().resolution, Resolution::Revert);
        assert!(editor.cancel_focused().is_none());
    }

    #[test]
    fn activating_same_cell_twice_is_a_no_op() {
        let mut editor = CellEditor::default();
        let now = Instant::now();
        assert_eq!(editor.activate(open(Column::Status, "Open"), now), Activation::Opened);
        assert_eq!(
            editor.activate(open(Column::Status, "Open"), now),
            Activation::AlreadyEditing
        );
        assert_eq!(editor.focused().unwrap().key.column, Column::Status);
    }

    #[test]
    fn blur_settles_after_grace_delay_only_once() {
        let mut editor = CellEditor::new(Duration::from_millis(100));
        let t0 = Instant::now();
        editor.activate(open(Column::PlannedHours, "8.00"), t0);
        type_into(&mut editor, "9");
        editor.activate(open(Column::Priority, "Medium"), t0);
        assert!(editor.tick(t0 + Duration::from_millis(50)).is_empty());

        let settled = editor.tick(t0 + Duration::from_millis(100));
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].resolution, Resolution::Commit(FieldValue::Hours(9.0)));
        assert!(editor.tick(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(editor.focused().unwrap().key.column, Column::Priority);
    }

    #[test]
    fn discard_drops_sessions() {
        let mut editor = CellEditor::default();
        editor.activate(open(Column::Status, "Open"), Instant::now());
        assert_eq!(editor.discard_all(), 1);
        assert!(editor.focused().is_none());
    }

    #[test]
    fn text_input_moves_by_grapheme() {
        let mut input = TextInput::new("ab\u{e9}");
        input.left();
        assert_eq!(input.cursor, 2);
        input.backspace();
        assert_eq!(input.as_str(), "a\u{e9}");
        input.home();
        input.delete();
        assert_eq!(input.as_str(), "\u{e9}");
        input.end();
        input.insert('!');
        assert_eq!(input.as_str(), "\u{e9}!");
    }
}
