use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::controller::{LOAD_FAILED_MESSAGE, LoadState};
use crate::ops::{CellKey, EditControl};
use crate::table::{CellState, CellView, Column, RowView};
use crate::tui::app::App;

use super::helpers::{checkbox, fit, select_all_box, tree_glyph};

/// Width of the checkbox column including its trailing space
const CHECKBOX_W: usize = 4;

/// Text while the first listing is outstanding
const LOADING_MESSAGE: &str = "Loading tasks...";
const EMPTY_TITLE: &str = "No Tasks Yet";
const EMPTY_HINT: &str = "Press n to create the first task for this scope.";

/// Columns that fit in `width`. The task column is always shown; the rest
/// scroll so that `focus` stays on screen.
pub(super) fn visible_columns(width: usize, focus: Column) -> Vec<Column> {
    let rest = &Column::ALL[1..];
    let budget = width.saturating_sub(CHECKBOX_W + Column::Subject.width());
    let fitting = |cols: &[Column]| -> Vec<Column> {
        let mut used = 0;
        cols.iter()
            .copied()
            .take_while(|c| {
                used += c.width() + 1;
                used <= budget
            })
            .collect()
    };
    let mut shown = (0..rest.len())
        .map(|start| fitting(&rest[start..]))
        .find(|cols| cols.contains(&focus))
        .unwrap_or_else(|| fitting(rest));
    shown.insert(0, Column::Subject);
    shown
}

/// Render the task table: header line then one line per visible row
pub fn render_table_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    if let Some(lines) = placeholder_lines(app) {
        let lines: Vec<Line> = lines
            .into_iter()
            .map(|(text, style)| Line::from(Span::styled(text, style)))
            .collect();
        frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
        return;
    }

    let columns = visible_columns(width, app.column);
    let body_h = (area.height as usize).saturating_sub(1);

    // Keep the cursor on screen
    if app.cursor < app.scroll_offset {
        app.scroll_offset = app.cursor;
    } else if body_h > 0 && app.cursor >= app.scroll_offset + body_h {
        app.scroll_offset = app.cursor + 1 - body_h;
    }

    let mut lines = vec![header_line(app, &columns, width)];
    let surface = app.controller.surface();
    let visible = surface.visible_positions();
    for (i, &pos) in visible.iter().enumerate().skip(app.scroll_offset).take(body_h) {
        let row = &surface.rows()[pos];
        lines.push(row_line(app, row, &columns, i == app.cursor, width));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

/// Loading, failure and empty states replace the table
fn placeholder_lines(app: &App) -> Option<Vec<(String, Style)>> {
    let bg = app.theme.background;
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let bright = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    match app.controller.load_state() {
        LoadState::Loading => Some(vec![(String::new(), dim), (format!(" {}", LOADING_MESSAGE), dim)]),
        LoadState::Failed(reason) => Some(vec![
            (String::new(), dim),
            (format!(" {}", LOAD_FAILED_MESSAGE), Style::default().fg(app.theme.red).bg(bg)),
            (format!(" {}", reason), dim),
            (" Press r to retry.".to_string(), dim),
        ]),
        LoadState::Ready if app.controller.surface().is_empty() => Some(vec![
            (String::new(), dim),
            (format!(" {}", EMPTY_TITLE), bright),
            (format!(" {}", EMPTY_HINT), dim),
        ]),
        LoadState::Ready => None,
    }
}

fn header_line(app: &App, columns: &[Column], width: usize) -> Line<'static> {
    let style = Style::default()
        .fg(app.theme.text_bright)
        .bg(app.theme.header_bg)
        .add_modifier(Modifier::BOLD);
    let mut text = format!("{} ", select_all_box(app.controller.surface().select_all()));
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(&fit(col.header(), col.width()));
    }
    Line::from(Span::styled(fit(&text, width), style))
}

fn row_line(
    app: &App,
    row: &RowView,
    columns: &[Column],
    is_cursor: bool,
    width: usize,
) -> Line<'static> {
    let theme = &app.theme;
    let row_bg = if is_cursor {
        theme.selection_bg
    } else if row.checked {
        theme.checked_bg
    } else {
        theme.background
    };
    let base = Style::default().fg(theme.text).bg(row_bg);

    let mut spans = vec![Span::styled(format!("{} ", checkbox(row.checked)), base)];
    let mut used = CHECKBOX_W;
    for (i, &col) in columns.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" ", base));
            used += 1;
        }
        let Some(cell) = row.cell(col) else {
            continue;
        };
        let text = if col == Column::Subject {
            format!(
                "{}{}{}",
                " ".repeat(row.indent),
                tree_glyph(row.has_children, row.expanded),
                cell.text
            )
        } else {
            cell_display(app, row, cell)
        };
        let mut style = cell_style(app, cell, base);
        if is_cursor && col == app.column && cell.is_editable() {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(fit(&text, col.width()), style));
        used += col.width();
    }
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), base));
    }
    Line::from(spans)
}

/// Text of a non-task cell; an open editor shows its control
fn cell_display(app: &App, row: &RowView, cell: &CellView) -> String {
    if cell.state != CellState::Editing {
        return cell.text.clone();
    }
    let key = CellKey {
        task_id: row.task_id.clone(),
        column: cell.column,
    };
    let Some(session) = app.controller.editor().session(&key) else {
        return cell.text.clone();
    };
    match &session.control {
        EditControl::Text(input) => format!("{}\u{258C}", input.as_str()),
        EditControl::Choice { options, selected } => {
            let current = selected
                .and_then(|i| options.get(i))
                .map_or(session.original_display.as_str(), String::as_str);
            format!("\u{2039}{}\u{203a}", current)
        }
    }
}

fn cell_style(app: &App, cell: &CellView, base: Style) -> Style {
    match cell.state {
        CellState::Editing => base.fg(app.theme.text_bright).bg(app.theme.edit_bg),
        CellState::Saving => base.fg(app.theme.dim).add_modifier(Modifier::ITALIC),
        CellState::Display if cell.column == Column::Status => {
            base.fg(app.theme.status_color(&cell.text))
        }
        CellState::Display => base,
    }
}
