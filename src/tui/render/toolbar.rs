use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;

use super::helpers::spans_width;

/// Toolbar buttons as (key, label)
const BUTTONS: [(&str, &str); 6] = [
    ("n", "Add Task"),
    ("r", "Refresh"),
    ("+", "Expand All"),
    ("-", "Collapse All"),
    ("R", "Recalculate"),
    ("D", "Delete Selected"),
];

/// Render the scope title and toolbar (top line)
pub fn render_toolbar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let title_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let key_style = Style::default().fg(app.theme.highlight).bg(bg);
    let label_style = Style::default().fg(app.theme.text).bg(bg);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);

    let mut spans = vec![Span::styled(format!(" {} ", app.scope_name), title_style)];
    let selected = app.controller.selection().len();
    for (key, label) in BUTTONS {
        spans.push(Span::styled(" ", label_style));
        spans.push(Span::styled(key, key_style));
        let label = if key == "D" && selected > 0 {
            format!(" {} ({})", label, selected)
        } else {
            format!(" {}", label)
        };
        spans.push(Span::styled(label, label_style));
    }

    let pending = app.controller.requests_in_flight();
    if pending > 0 {
        let busy = format!("\u{27f3} {} ", pending);
        let used = spans_width(&spans);
        let busy_w = busy.chars().count();
        if used + busy_w < width {
            spans.push(Span::styled(" ".repeat(width - used - busy_w), label_style));
            spans.push(Span::styled(busy, dim_style));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;
    use insta::assert_snapshot;

    #[test]
    fn toolbar_counts_selection() {
        let mut app = app_with_tasks(site_tasks());
        app.controller.set_row_checked("A", true);
        app.controller.set_row_checked("C", true);
        let output = render_to_string(140, 1, |frame, area| {
            render_toolbar(frame, &app, area);
        });
        assert_snapshot!(output, @" Pilot  n Add Task r Refresh + Expand All - Collapse All R Recalculate D Delete Selected (2)");
    }

    #[test]
    fn toolbar_shows_pending_requests() {
        let mut app = app_with_tasks(site_tasks());
        app.controller.refresh();
        let output = render_to_string(120, 1, |frame, area| {
            render_toolbar(frame, &app, area);
        });
        assert!(output.ends_with("\u{27f3} 1"));
    }
}
