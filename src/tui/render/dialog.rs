use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ops::{FormField, FormInput};
use crate::tui::app::App;

use super::helpers::{centered_rect_fixed, fit, wrap_text};

const DIALOG_W: u16 = 60;
const LABEL_W: usize = 16;

/// Render the task form popup
pub fn render_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = app.controller.dialog() else {
        return;
    };
    let busy = app.controller.dialog_busy();
    let bg = app.theme.background;
    let inner_w = DIALOG_W.saturating_sub(2) as usize;

    let label_style = Style::default().fg(app.theme.dim).bg(bg);
    let value_style = Style::default().fg(app.theme.text).bg(bg);
    let focus_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(app.theme.edit_bg);

    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus && !busy;
        let marker = if focused { "\u{25b8}" } else { " " };
        let label = format!("{}{}", marker, field.field.label());
        let value_w = inner_w.saturating_sub(LABEL_W + 1);
        let style = if focused {
            focus_style
        } else if field.read_only {
            label_style
        } else {
            value_style
        };
        lines.push(Line::from(vec![
            Span::styled(fit(&label, LABEL_W), label_style),
            Span::styled(" ", value_style),
            Span::styled(fit(&field_text(field, focused), value_w), style),
        ]));
    }

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        let style = Style::default().fg(app.theme.red).bg(bg);
        for l in wrap_text(" ", error, inner_w) {
            lines.push(Line::from(Span::styled(l, style)));
        }
    }
    let footer = if busy {
        " Saving...".to_string()
    } else if form.can_delete() {
        " Enter save  Ctrl+D delete  Esc cancel".to_string()
    } else {
        " Enter save  Esc cancel".to_string()
    };
    lines.push(Line::from(Span::styled(
        footer,
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    let height = (lines.len() + 2) as u16;
    let popup = centered_rect_fixed(DIALOG_W, height, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", form.title()),
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn field_text(field: &FormField, focused: bool) -> String {
    match &field.input {
        FormInput::Text(t) if focused && !field.read_only => {
            let (before, after) = t.buffer.split_at(t.cursor.min(t.buffer.len()));
            format!("{}\u{258C}{}", before, after)
        }
        FormInput::Choice { .. } if focused => format!("\u{2039}{}\u{203a}", field.display()),
        _ => field.display(),
    }
}
