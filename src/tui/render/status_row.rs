use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::table::RowAction;
use crate::tui::app::{App, Mode};

use super::helpers::spans_width;

fn mode_hint(mode: Mode) -> &'static str {
    match mode {
        Mode::Navigate => "? help  Enter edit  n add  q quit",
        Mode::Edit => "Enter save  Esc cancel  Tab leave",
        Mode::Dialog => "Tab next  Enter save  Ctrl+D delete  Esc close",
        Mode::Confirm => "y confirm  n cancel",
    }
}

pub(super) fn action_hint(action: RowAction) -> &'static str {
    match action {
        RowAction::AddChild => "c add child",
        RowAction::Edit => "E edit",
        RowAction::Delete => "d delete",
    }
}

/// Hints on the right: the cursor row's actions while navigating, plus the
/// mode's keys when key hints are on or another mode is active
fn right_hint(app: &App) -> String {
    let mode = app.mode();
    let mut parts = Vec::new();
    if mode == Mode::Navigate
        && let Some(id) = app.cursor_id()
        && let Some(row) = app.controller.surface().row(&id)
    {
        parts.extend(row.actions.iter().map(|&a| action_hint(a)));
    }
    if app.show_key_hints || mode != Mode::Navigate {
        parts.push(mode_hint(mode));
    }
    parts.join("  ")
}

/// Render the status row (bottom of screen): last notice on the left,
/// hints on the right
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans = Vec::new();
    if let Some(notice) = &app.status {
        let style = Style::default()
            .fg(app.theme.notice_color(notice.level))
            .bg(bg);
        let text = format!(" {}", notice.text);
        spans.push(Span::styled(text.trim_end().to_string(), style));
    }

    let hint = right_hint(app);
    if !hint.is_empty() {
        let used = spans_width(&spans);
        let hint_w = hint.chars().count() + 1;
        if used + hint_w < width {
            spans.push(Span::styled(" ".repeat(width - used - hint_w), Style::default().bg(bg)));
            spans.push(Span::styled(
                format!("{} ", hint),
                Style::default().fg(app.theme.dim).bg(bg),
            ));
        }
    }

    if spans.is_empty() {
        spans.push(Span::styled(" ".repeat(width), Style::default().bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use crate::tui::render::test_helpers::*;
    use std::time::Instant;

    fn status(app: &App) -> String {
        render_to_string(TERM_W, 1, |frame, area| {
            render_status_row(frame, app, area);
        })
    }

    #[test]
    fn navigate_shows_cursor_row_actions() {
        let app = app_with_tasks(site_tasks());
        assert!(status(&app).ends_with("c add child  E edit  d delete"));

        let app = app_with_tasks(vec![]);
        assert_eq!(status(&app), "");
    }

    #[test]
    fn shows_latest_notice() {
        let mut app = app_with_tasks(site_tasks());
        app.controller.collapse_all();
        app.absorb_notices();
        let out = status(&app);
        assert!(out.starts_with(" All tasks collapsed  "));
        assert!(out.ends_with("d delete"));
    }

    #[test]
    fn edit_mode_shows_hints() {
        let mut app = app_with_tasks(site_tasks());
        app.controller.begin_edit("A", Column::Status, Instant::now());
        let out = status(&app);
        assert!(out.ends_with("Enter save  Esc cancel  Tab leave"));
    }
}
