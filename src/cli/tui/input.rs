//! Input handling for the TUI.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{Action, InputMode};

/// Keys on the job list and detail views.
fn browse_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('n') => Some(Action::NewJob),
        KeyCode::Char('x') | KeyCode::Char(' ') => Some(Action::RunNow),
        KeyCode::Char('c') => Some(Action::CancelJob),
        KeyCode::PageDown | KeyCode::Char(']') => Some(Action::NextPage),
        KeyCode::PageUp | KeyCode::Char('[') => Some(Action::PrevPage),
        _ => None,
    }
}

/// Keys while the creation form is open. Printable characters edit text.
fn form_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => Some(Action::Submit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(Action::Back),
        KeyCode::F(2) => Some(Action::Submit),
        KeyCode::Tab | KeyCode::Down => Some(Action::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(Action::PrevField),
        KeyCode::Left => Some(Action::Left),
        KeyCode::Right => Some(Action::Right),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) => Some(Action::Input(c)),
        _ => None,
    }
}

fn notice_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(Action::Select),
        _ => None,
    }
}

/// Convert a crossterm key event to an Action for the given mode.
pub fn handle_key_event(key: KeyEvent, mode: InputMode) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match mode {
        InputMode::Browse => browse_key(key),
        InputMode::Form => form_key(key),
        InputMode::Notice => notice_key(key),
    }
}

/// Convert a crossterm Event to an Action.
pub fn handle_event(event: Event, mode: InputMode) -> Option<Action> {
    match event {
        Event::Key(key) => handle_key_event(key, mode),
        _ => None,
    }
}
