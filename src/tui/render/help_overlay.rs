use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

use super::helpers::centered_rect;

const NAVIGATION: &[(&str, &str)] = &[
    (" \u{2191}\u{2193}/jk", "Move cursor up/down"),
    (" \u{2190}/h", "Collapse / go to parent"),
    (" \u{2192}/l", "Expand / go to first child"),
    (" g/G", "Jump to top/bottom"),
    (" Tab/S-Tab", "Next/previous column"),
    (" +/-", "Expand/collapse all"),
];

const EDITING: &[(&str, &str)] = &[
    (" Enter/e", "Edit cell"),
    (" 1-9", "Pick option while editing"),
    (" E", "Edit task in dialog"),
    (" n", "Add task"),
    (" c", "Add child task"),
];

const SELECTION: &[(&str, &str)] = &[
    (" Space", "Check / uncheck row"),
    (" a", "Check / uncheck all"),
    (" d", "Delete task"),
    (" D", "Delete checked tasks"),
    (" r", "Reload"),
    (" R", "Recalculate parents"),
];

const GLOBAL: &[(&str, &str)] = &[
    (" ?", "Toggle this help"),
    (" q", "Quit"),
    (" Ctrl+Q", "Quit (immediate)"),
];

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(" Key Bindings", header_style)),
        Line::from(""),
    ];
    let sections = [
        (" Navigation", NAVIGATION),
        (" Editing", EDITING),
        (" Selection", SELECTION),
        (" Global", GLOBAL),
    ];
    for (i, (title, bindings)) in sections.into_iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(title, header_style)));
        for &(key, desc) in bindings {
            add_binding(&mut lines, key, desc, key_style, desc_style);
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));

    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let padded_key = format!("{:<width$}", key, width = 14);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}
