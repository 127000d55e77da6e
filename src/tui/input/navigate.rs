use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::ToolbarAction;
use crate::table::{Column, RowAction, SelectAll};
use crate::tui::app::App;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent, now: Instant) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => app.should_quit = true,
        (_, KeyCode::Char('?')) => app.show_help = true,

        (_, KeyCode::Down | KeyCode::Char('j')) => move_cursor(app, 1),
        (_, KeyCode::Up | KeyCode::Char('k')) => move_cursor(app, -1),
        (_, KeyCode::PageDown) => move_cursor(app, 10),
        (_, KeyCode::PageUp) => move_cursor(app, -10),
        (_, KeyCode::Home | KeyCode::Char('g')) => app.cursor = 0,
        (_, KeyCode::End | KeyCode::Char('G')) => {
            app.cursor = app.visible_ids().len().saturating_sub(1);
        }
        (_, KeyCode::Left | KeyCode::Char('h')) => collapse_or_parent(app),
        (_, KeyCode::Right | KeyCode::Char('l')) => expand_or_child(app),

        (_, KeyCode::Tab) => cycle_column(app, true),
        (_, KeyCode::BackTab) => cycle_column(app, false),
        (_, KeyCode::Enter | KeyCode::Char('e')) => {
            if let Some(id) = app.cursor_id() {
                app.controller.begin_edit(&id, app.column, now);
            }
        }
        (_, KeyCode::Char('E')) => row_action(app, RowAction::Edit),

        (_, KeyCode::Char(' ')) => {
            if let Some(id) = app.cursor_id() {
                let checked = app.controller.selection().contains(&id);
                app.controller.set_row_checked(&id, !checked);
            }
        }
        (_, KeyCode::Char('a')) => {
            let all = app.controller.surface().select_all() == SelectAll::Checked;
            app.controller.set_select_all(!all);
        }

        (_, KeyCode::Char('n')) => app.controller.invoke(ToolbarAction::AddTask),
        (_, KeyCode::Char('c')) => row_action(app, RowAction::AddChild),
        (_, KeyCode::Char('d')) => row_action(app, RowAction::Delete),
        (_, KeyCode::Char('D')) => app.controller.invoke(ToolbarAction::DeleteSelected),
        (KeyModifiers::NONE, KeyCode::Char('r')) => app.controller.invoke(ToolbarAction::Refresh),
        (_, KeyCode::Char('R')) => app.controller.invoke(ToolbarAction::Recalculate),
        (_, KeyCode::Char('+') | KeyCode::Char('=')) => {
            app.controller.invoke(ToolbarAction::ExpandAll)
        }
        (_, KeyCode::Char('-')) => app.controller.invoke(ToolbarAction::CollapseAll),
        _ => {}
    }
}

/// Run one of the cursor row's action controls
fn row_action(app: &mut App, action: RowAction) {
    let Some(id) = app.cursor_id() else {
        return;
    };
    let offered = app
        .controller
        .surface()
        .row(&id)
        .is_some_and(|row| row.actions.contains(&action));
    if !offered {
        return;
    }
    match action {
        RowAction::AddChild => app.controller.open_create_dialog(Some(&id)),
        RowAction::Edit => {
            app.controller.open_edit_dialog(&id);
        }
        RowAction::Delete => {
            app.controller.request_delete_task(&id);
        }
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    let n = app.visible_ids().len();
    if n == 0 {
        return;
    }
    app.cursor = app.cursor.saturating_add_signed(delta).min(n - 1);
}

/// Left: collapse an open parent, otherwise jump to the parent row
fn collapse_or_parent(app: &mut App) {
    let Some(id) = app.cursor_id() else {
        return;
    };
    let Some(row) = app.controller.surface().row(&id) else {
        return;
    };
    if row.has_children && row.expanded {
        app.controller.toggle(&id);
    } else if let Some(parent) = row.parent_id.clone() {
        app.focus_task(&parent);
    }
}

/// Right: expand a closed parent, otherwise step into its first child
fn expand_or_child(app: &mut App) {
    let Some(id) = app.cursor_id() else {
        return;
    };
    let Some(row) = app.controller.surface().row(&id) else {
        return;
    };
    if !row.has_children {
        return;
    }
    if row.expanded {
        move_cursor(app, 1);
    } else {
        app.controller.toggle(&id);
    }
}

fn cycle_column(app: &mut App, forward: bool) {
    let editable: Vec<Column> = Column::editable().collect();
    let pos = editable.iter().position(|c| *c == app.column).unwrap_or(0);
    let n = editable.len();
    let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
    app.column = editable[next];
}
