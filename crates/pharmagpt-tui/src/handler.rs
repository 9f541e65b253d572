use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode, Tab};
use crate::tui::AppEvent;

const PAGE: u16 = 10;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if key.code == KeyCode::Tab {
        app.switch_tab();
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('1') => app.tab = Tab::Search,
        KeyCode::Char('2') => app.tab = Tab::Chat,
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        _ => match app.tab {
            Tab::Search => handle_search_normal(app, key),
            Tab::Chat => handle_chat_normal(app, key),
        },
    }
}

fn handle_search_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.search_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.search_nav_up(),
        KeyCode::Char('g') | KeyCode::Home => {
            if !app.search.results().is_empty() {
                app.search_state.select(Some(0));
            }
        }
        KeyCode::Char('G') | KeyCode::End => {
            let len = app.search.results().len();
            if len > 0 {
                app.search_state.select(Some(len - 1));
            }
        }
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::PageDown => app.scroll_chat_down(PAGE),
        KeyCode::PageUp => app.scroll_chat_up(PAGE),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_chat_up(u16::MAX),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => match app.tab {
            Tab::Search => {
                if app.can_submit_search() {
                    app.submit_search();
                }
            }
            Tab::Chat => {
                if app.can_submit_chat() {
                    app.submit_chat();
                }
            }
        },
        code => match app.tab {
            Tab::Search => {
                let cursor = &mut app.search_cursor;
                if is_edit_key(code) {
                    app.search.edit_query(|query| edit_line(query, cursor, code));
                } else {
                    move_cursor(app.search.query(), cursor, code);
                }
            }
            Tab::Chat => {
                let cursor = &mut app.chat_cursor;
                if is_edit_key(code) {
                    app.chat.edit_draft(|draft| edit_line(draft, cursor, code));
                } else {
                    move_cursor(app.chat.draft(), cursor, code);
                }
            }
        },
    }
}

fn is_edit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Backspace | KeyCode::Delete | KeyCode::Char(_))
}

fn edit_line(text: &mut String, cursor: &mut usize, code: KeyCode) {
    let char_count = text.chars().count();
    *cursor = (*cursor).min(char_count);

    match code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn move_cursor(text: &str, cursor: &mut usize, code: KeyCode) {
    let char_count = text.chars().count();
    match code {
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(char_count),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = char_count,
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match (mouse.kind, app.tab) {
        (MouseEventKind::ScrollDown, Tab::Chat) => app.scroll_chat_down(3),
        (MouseEventKind::ScrollUp, Tab::Chat) => app.scroll_chat_up(3),
        (MouseEventKind::ScrollDown, Tab::Search) => app.search_nav_down(),
        (MouseEventKind::ScrollUp, Tab::Search) => app.search_nav_up(),
        _ => {}
    }
}
