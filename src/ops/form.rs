use crate::model::{FieldError, FieldKind, FieldValue, TaskField, TaskFields, TaskMeta, TaskRecord};

use super::editor::TextInput;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("Subject is required")]
    SubjectRequired,
    #[error("{label}: {source}")]
    Field {
        label: &'static str,
        #[source]
        source: FieldError,
    },
}

/// Fields shown in the task dialog, top to bottom
pub const FORM_FIELDS: [TaskField; 10] = [
    TaskField::Subject,
    TaskField::IsGroup,
    TaskField::Status,
    TaskField::Priority,
    TaskField::PlannedStart,
    TaskField::PlannedEnd,
    TaskField::PlannedHours,
    TaskField::ActualStart,
    TaskField::ActualEnd,
    TaskField::Parent,
];

/// Appended after [`FORM_FIELDS`]
const DESCRIPTION: TaskField = TaskField::Description;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// New task; `parent` is fixed when opened from a row's "add child"
    Create { parent: Option<String> },
    Edit { task_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormInput {
    Text(TextInput),
    /// `current` is the record's value, kept when no option was picked
    Choice {
        options: Vec<String>,
        selected: Option<usize>,
        current: String,
    },
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub field: TaskField,
    pub kind: FieldKind,
    pub input: FormInput,
    pub read_only: bool,
}

impl FormField {
    fn new(field: TaskField, meta: &TaskMeta, value: &FieldValue) -> Self {
        let kind = FieldKind::for_field(field, meta);
        let input = match &kind {
            FieldKind::Choice(options) => {
                let current = value.as_text().unwrap_or_default().to_string();
                FormInput::Choice {
                    selected: options.iter().position(|o| *o == current),
                    options: options.clone(),
                    current,
                }
            }
            FieldKind::Flag => FormInput::Flag(value.as_flag()),
            _ => FormInput::Text(TextInput::new(&value.to_input())),
        };
        FormField {
            field,
            kind,
            input,
            read_only: false,
        }
    }

    pub fn display(&self) -> String {
        match &self.input {
            FormInput::Text(t) => t.buffer.clone(),
            FormInput::Choice { .. } => self.raw(),
            FormInput::Flag(on) => if *on { "[x]" } else { "[ ]" }.to_string(),
        }
    }

    fn raw(&self) -> String {
        match &self.input {
            FormInput::Text(t) => t.buffer.clone(),
            FormInput::Choice {
                options,
                selected,
                current,
            } => selected
                .and_then(|i| options.get(i))
                .unwrap_or(current)
                .clone(),
            FormInput::Flag(on) => if *on { "1" } else { "0" }.to_string(),
        }
    }
}

/// The create / add-child / edit dialog
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub mode: FormMode,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl TaskForm {
    pub fn create(meta: &TaskMeta, parent: Option<&str>) -> Self {
        // New tasks start Open / Medium when the scope offers those options
        let mut seed = TaskRecord::new("", "");
        if !meta.status_options.contains(&seed.status) {
            seed.status = meta.status_options.first().cloned().unwrap_or_default();
        }
        if !meta.priority_options.contains(&seed.priority) {
            seed.priority = meta.priority_options.first().cloned().unwrap_or_default();
        }
        seed.parent = parent.map(str::to_string);
        let mut form = TaskForm::from_record(&seed, meta, FormMode::Create {
            parent: parent.map(str::to_string),
        });
        if parent.is_some()
            && let Some(f) = form.field_mut(TaskField::Parent)
        {
            f.read_only = true;
        }
        form
    }

    pub fn edit(record: &TaskRecord, meta: &TaskMeta) -> Self {
        TaskForm::from_record(record, meta, FormMode::Edit {
            task_id: record.id.clone(),
        })
    }

    fn from_record(record: &TaskRecord, meta: &TaskMeta, mode: FormMode) -> Self {
        let fields = FORM_FIELDS
            .iter()
            .chain(std::iter::once(&DESCRIPTION))
            .map(|&f| FormField::new(f, meta, &record.value(f)))
            .collect();
        TaskForm {
            mode,
            fields,
            focus: 0,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match &self.mode {
            FormMode::Create { parent: Some(_) } => "Add Child Task",
            FormMode::Create { parent: None } => "Add New Task",
            FormMode::Edit { .. } => "Edit Task",
        }
    }

    /// Only the edit dialog offers a delete action
    pub fn can_delete(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn field(&self, field: TaskField) -> Option<&FormField> {
        self.fields.iter().find(|f| f.field == field)
    }

    pub fn field_mut(&mut self, field: TaskField) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.field == field)
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    fn focused_input(&mut self) -> Option<&mut FormInput> {
        self.fields
            .get_mut(self.focus)
            .filter(|f| !f.read_only)
            .map(|f| &mut f.input)
    }

    /// Type into the focused text field
    pub fn insert(&mut self, c: char) {
        if let Some(FormInput::Text(t)) = self.focused_input() {
            t.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(FormInput::Text(t)) = self.focused_input() {
            t.backspace();
        }
    }

    pub fn cursor_left(&mut self) {
        if let Some(FormInput::Text(t)) = self.focused_input() {
            t.left();
        }
    }

    pub fn cursor_right(&mut self) {
        if let Some(FormInput::Text(t)) = self.focused_input() {
            t.right();
        }
    }

    /// Cycle a choice or flip a flag. Turning on "is group" clears the parent.
    pub fn cycle(&mut self, forward: bool) {
        let mut cleared_parent = false;
        match self.focused_input() {
            Some(FormInput::Choice {
                options, selected, ..
            }) if !options.is_empty() => {
                let n = options.len();
                *selected = Some(match (*selected, forward) {
                    (Some(i), true) => (i + 1) % n,
                    (Some(i), false) => (i + n - 1) % n,
                    (None, true) => 0,
                    (None, false) => n - 1,
                });
            }
            Some(FormInput::Flag(on)) => {
                *on = !*on;
                cleared_parent = *on;
            }
            _ => {}
        }
        let is_group_focused = self.focused().is_some_and(|f| f.field == TaskField::IsGroup);
        if cleared_parent
            && is_group_focused
            && let Some(parent) = self.field_mut(TaskField::Parent)
        {
            parent.input = FormInput::Text(TextInput::default());
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(
            self.field(TaskField::IsGroup).map(|f| &f.input),
            Some(FormInput::Flag(true))
        )
    }

    /// Validate and collect the values to send. Create sends only filled
    /// fields; edit sends the whole form.
    pub fn collect(&self) -> Result<TaskFields, FormError> {
        let mut out = TaskFields::new();
        for f in &self.fields {
            // an unpicked dropdown keeps whatever the task already has
            if matches!(f.input, FormInput::Choice { selected: None, .. }) {
                continue;
            }
            let value = f.kind.parse(&f.raw()).map_err(|source| FormError::Field {
                label: f.field.label(),
                source,
            })?;
            if f.field == TaskField::Subject && value.is_empty() {
                return Err(FormError::SubjectRequired);
            }
            let value = if f.field == TaskField::Parent && self.is_group() {
                FieldValue::Empty
            } else {
                value
            };
            let keep = match &self.mode {
                FormMode::Create { .. } => !value.is_empty() && value != FieldValue::Flag(false),
                FormMode::Edit { .. } => true,
            };
            if keep {
                out.insert(f.field, value);
            }
        }
        Ok(out)
    }
}
