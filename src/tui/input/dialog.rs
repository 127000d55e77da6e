use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::FormInput;
use crate::tui::app::App;

pub(super) fn handle_dialog(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => app.controller.close_dialog(),
        (_, KeyCode::Enter) | (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
            app.controller.submit_dialog();
        }
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => app.controller.delete_from_dialog(),
        (_, code) => {
            // Typing is ignored while a submit is in flight
            if app.controller.dialog_busy() {
                return;
            }
            let Some(form) = app.controller.dialog_mut() else {
                return;
            };
            let is_text = matches!(form.focused().map(|f| &f.input), Some(FormInput::Text(_)));
            match code {
                KeyCode::Tab | KeyCode::Down => form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
                KeyCode::Left if is_text => form.cursor_left(),
                KeyCode::Right if is_text => form.cursor_right(),
                KeyCode::Left => form.cycle(false),
                KeyCode::Right | KeyCode::Char(' ') if !is_text => form.cycle(true),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.insert(c),
                _ => {}
            }
        }
    }
}
