use crossterm::event::{KeyCode, KeyEvent};

use vaultdesk_core::session::View;

use crate::app::{is_valid_input_char, App, AppState, LoginFocus, PAGE_SCROLL_SIZE};

/// Handle a key press. Returns true when the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    match app.view() {
        View::Login => handle_login_input(app, key),
        View::Vaults => handle_vault_input(app, key),
    }
    matches!(app.state, AppState::Quitting)
}

fn handle_login_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.state = AppState::Quitting,
        KeyCode::Tab | KeyCode::Down => app.login_focus = app.login_focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.login_focus = app.login_focus.prev(),
        KeyCode::Enter => {
            if app.login_focus == LoginFocus::Identifier {
                app.login_focus = app.login_focus.next();
            } else {
                app.submit_login();
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = app.focused_field_mut() {
                field.pop();
            }
        }
        KeyCode::Char(c) if is_valid_input_char(c) => {
            if let Some(field) = app.focused_field_mut() {
                field.push(c);
            }
        }
        _ => {}
    }
}

fn handle_vault_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::Quitting,
        KeyCode::Char('r') | KeyCode::F(5) => app.request_refresh(),
        KeyCode::Char('l') => app.logout(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        _ => {}
    }
}
