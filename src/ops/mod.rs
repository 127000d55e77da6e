pub mod editor;
pub mod form;
pub mod selection;

pub use editor::{
    Activation, CellEditor, CellKey, DEFAULT_BLUR_GRACE, EditControl, EditSession, Resolution,
    Settled, TextInput,
};
pub use form::{FormError, FormField, FormInput, FormMode, TaskForm};
pub use selection::Selection;
