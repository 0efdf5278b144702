use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use promptmaster_core::orchestrator::stream_turn;
use promptmaster_core::playground;

use crate::app::{App, BuilderField, InputMode, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Chat(turn_event) => {
            app.chat.apply(turn_event);
            app.scroll_chat_to_bottom();
        }
        AppEvent::Generated(outcome) => {
            app.builder_error = app.builder.finish_generate(outcome).err().map(|e| e.to_string());
        }
        AppEvent::Executed(output) => app.builder.finish_execute(output),
        AppEvent::Refined { text, elapsed_ms } => {
            app.refine_output = Some(text);
            app.refine_elapsed_ms = Some(elapsed_ms);
            app.refine_loading = false;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_api_key_input {
        handle_api_key_input(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Screen switching and app-level keys
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('1') => {
            app.screen = Screen::Tutor;
            return;
        }
        KeyCode::Char('2') => {
            app.screen = Screen::Builder;
            return;
        }
        KeyCode::Char('3') => {
            app.screen = Screen::Refine;
            return;
        }
        KeyCode::Tab => {
            app.screen = app.screen.next();
            return;
        }
        KeyCode::Char('K') => {
            app.show_api_key_input = true;
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Tutor => handle_tutor_normal(app, key),
        Screen::Builder => handle_builder_normal(app, key),
        Screen::Refine => handle_refine_normal(app, key),
    }
}

fn handle_tutor_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('t') => {
            let enabled = app.chat.toggle_thinking();
            tracing::debug!(enabled, "Deep thinking toggled");
        }
        KeyCode::Char('n') => {
            app.chat.reset();
            app.chat_scroll = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        _ => {}
    }
}

fn handle_builder_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.builder_field = app.builder_field.next(),
        KeyCode::Char('k') | KeyCode::Up => app.builder_field = app.builder_field.prev(),
        KeyCode::Char('i') | KeyCode::Enter => {
            // The prompt field only exists once something was generated
            if app.builder_value(app.builder_field).is_some() {
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char('g') => start_generate(app),
        KeyCode::Char('r') => start_playground(app),
        _ => {}
    }
}

fn handle_refine_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('r') => start_refine(app),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Tutor => handle_tutor_editing(app, key),
        Screen::Builder => handle_builder_editing(app, key),
        Screen::Refine => handle_refine_editing(app, key),
    }
}

fn handle_tutor_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => send_chat(app),
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => app.chat_cursor = app.chat_cursor.saturating_sub(1),
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.chat_cursor = 0,
        KeyCode::End => app.chat_cursor = app.chat_input.chars().count(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_builder_editing(app: &mut App, key: KeyEvent) {
    let field = app.builder_field;
    // Inputs are locked while a request built from them is in flight
    if app.is_busy() && field != BuilderField::TestInput {
        app.input_mode = InputMode::Normal;
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Tab => app.input_mode = InputMode::Normal,
        // Alt+Enter for multi-line fields, plain Enter finishes editing
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            if let Some(value) = app.builder_value_mut(field) {
                value.push('\n');
            }
        }
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Backspace => {
            if let Some(value) = app.builder_value_mut(field) {
                value.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(value) = app.builder_value_mut(field) {
                value.push(c);
            }
        }
        _ => {}
    }
}

fn handle_refine_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => app.refine_input.push('\n'),
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            start_refine(app);
        }
        KeyCode::Backspace => {
            app.refine_input.pop();
        }
        KeyCode::Char(c) => app.refine_input.push(c),
        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_api_key_input = false;
            app.api_key_input.clear();
        }
        KeyCode::Enter => {
            if let Err(e) = app.apply_api_key() {
                tracing::error!(error = %e, "Failed to save API key");
            }
        }
        KeyCode::Backspace => {
            app.api_key_input.pop();
        }
        KeyCode::Char(c) => app.api_key_input.push(c),
        _ => {}
    }
}

/// Start a tutor turn; the stream runs on a background task and reports
/// back through the event channel.
fn send_chat(app: &mut App) {
    let Some(turn) = app.chat.begin_turn(&mut app.chat_input) else {
        return;
    };

    app.chat_cursor = 0;
    app.input_mode = InputMode::Normal;

    // Scroll to bottom so the placeholder is visible
    app.scroll_chat_to_bottom();

    let gateway = Arc::clone(&app.gateway);
    let tx = app.events.clone();
    tokio::spawn(async move {
        stream_turn(&gateway, turn, |event| {
            let _ = tx.send(AppEvent::Chat(event));
        })
        .await;
    });
}

fn start_generate(app: &mut App) {
    let inputs = match app.builder.begin_generate() {
        Ok(inputs) => inputs,
        Err(e) => {
            app.builder_error = Some(e.to_string());
            return;
        }
    };
    app.builder_error = None;

    let gateway = Arc::clone(&app.gateway);
    let tx = app.events.clone();
    tokio::spawn(async move {
        let outcome = gateway.structured_generate(&inputs).await;
        let _ = tx.send(AppEvent::Generated(outcome));
    });
}

fn start_playground(app: &mut App) {
    let Some((prompt, test_input)) = app.builder.begin_execute() else {
        return;
    };

    let gateway = Arc::clone(&app.gateway);
    let tx = app.events.clone();
    tokio::spawn(async move {
        let output = playground::execute(&gateway, &prompt, &test_input).await;
        let _ = tx.send(AppEvent::Executed(output));
    });
}

fn start_refine(app: &mut App) {
    if app.refine_loading || app.refine_input.trim().is_empty() {
        return;
    }
    app.refine_loading = true;

    let draft = app.refine_input.clone();
    let gateway = Arc::clone(&app.gateway);
    let tx = app.events.clone();
    tokio::spawn(async move {
        let start = Instant::now();
        let text = gateway.refine(&draft).await;
        let elapsed_ms = start.elapsed().as_millis();
        let _ = tx.send(AppEvent::Refined { text, elapsed_ms });
    });
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Tutor {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_chat_down(),
        MouseEventKind::ScrollUp => app.scroll_chat_up(),
        _ => {}
    }
}
