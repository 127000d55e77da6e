use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

use super::helpers::{centered_rect_fixed, wrap_text};

const POPUP_W: u16 = 56;

/// Render the pending delete confirmation
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(confirmation) = app.controller.confirmation() else {
        return;
    };
    let bg = app.theme.background;
    let text_style = Style::default().fg(app.theme.text_bright).bg(bg);
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);

    let inner_w = POPUP_W.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = wrap_text(" ", &confirmation.message(), inner_w.saturating_sub(1))
        .into_iter()
        .map(|l| Line::from(Span::styled(l, text_style)))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" y", key_style),
        Span::styled(" delete   ", dim_style),
        Span::styled("n", key_style),
        Span::styled(" cancel", dim_style),
    ]));

    let popup = centered_rect_fixed(POPUP_W, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Confirm Delete ", key_style))
        .border_style(Style::default().fg(app.theme.red).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
