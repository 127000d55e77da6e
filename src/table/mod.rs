pub mod format;
pub mod row;
pub mod surface;

pub use format::DisplayFormat;
pub use row::{
    CellState, CellView, Column, ROW_ACTIONS, RowAction, RowView, SAVING_PLACEHOLDER, cell_text,
    render_row, render_rows,
};
pub use surface::{RowSurface, SelectAll};
