use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::EditControl;
use crate::tui::app::App;

pub(super) fn handle_edit(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc => app.controller.cancel_edit(),
        KeyCode::Enter => app.controller.confirm_edit(),
        // Focus leaves the cell; it settles after the grace delay
        KeyCode::Tab | KeyCode::BackTab => app.controller.blur(now),
        code => {
            let is_choice = app
                .controller
                .editing()
                .is_some_and(|s| s.control.is_choice());
            if is_choice {
                handle_choice_key(app, code);
            } else {
                handle_text_key(app, code);
            }
        }
    }
}

fn handle_choice_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => step_choice(app, false),
        KeyCode::Down | KeyCode::Char('j') => step_choice(app, true),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            app.controller.choose_option(index);
        }
        _ => {}
    }
}

/// Move the highlight without committing
fn step_choice(app: &mut App, forward: bool) {
    if let Some(control) = app.controller.edit_control_mut() {
        control.step(forward);
    }
}

fn handle_text_key(app: &mut App, code: KeyCode) {
    let Some(EditControl::Text(input)) = app.controller.edit_control_mut() else {
        return;
    };
    match code {
        KeyCode::Char(c) => input.insert(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        _ => {}
    }
}
