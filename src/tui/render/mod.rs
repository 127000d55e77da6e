pub mod confirm_popup;
pub mod dialog;
pub mod help_overlay;
mod helpers;
pub mod status_row;
pub mod table_view;
pub mod toolbar;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::App;

/// Main render function; dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: toolbar (1 row) | table | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    toolbar::render_toolbar(frame, app, chunks[0]);
    table_view::render_table_view(frame, app, chunks[1]);
    status_row::render_status_row(frame, app, chunks[2]);

    if app.controller.dialog().is_some() {
        dialog::render_dialog(frame, app, area);
    }
    if app.controller.confirmation().is_some() {
        confirm_popup::render_confirm_popup(frame, app, area);
    }
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, area);
    }
}
