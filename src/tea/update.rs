//! Pure update function for the TEA (The Elm Architecture) pattern.
//!
//! The update function takes a model and a message, mutates the model,
//! and returns a list of commands to execute.

use crossterm::event::{KeyCode, KeyEvent};

use crate::{clog, clog_debug, clog_warn};

use super::command::Command;
use super::message::Message;
use super::model::{Model, Notification, NotificationLevel};

fn set_error(model: &mut Model, message: String) {
    clog_warn!("UI Error: {}", message);
    model.notification = Some(Notification {
        level: NotificationLevel::Error,
        message,
    });
    model.dirty = true;
}

fn set_info(model: &mut Model, message: String) {
    model.notification = Some(Notification {
        level: NotificationLevel::Info,
        message,
    });
    model.dirty = true;
}

/// Pure update function: Model + Message → Commands
///
/// The function itself has no side effects - all I/O happens via returned Commands.
pub fn update(model: &mut Model, msg: Message) -> Vec<Command> {
    let mut cmds = Vec::new();

    match msg {
        Message::Key(key) => {
            model.notification = None; // Clear notification on any key press
            model.dirty = true;
            update_list(model, key, &mut cmds);
        }

        Message::Resize(_, _) => {
            model.dirty = true;
        }

        Message::ConfigChanged => {
            clog_debug!("Message::ConfigChanged");
            cmds.push(Command::ReloadConfig);
        }

        Message::ConfigReloaded(config) => {
            clog!(
                "Message::ConfigReloaded commands={} patterns={}",
                config.commands.len(),
                config.restricted_patterns.len()
            );
            model.replace_config(config);
            set_info(
                model,
                format!("Reloaded {} command(s)", model.catalog.len()),
            );
        }

        Message::ConfigReloadFailed(err) => {
            set_error(model, format!("Failed to reload config: {}", err));
        }

        Message::Dispatched(report) => {
            // One row per denied or failed line.
            let messages = report.messages();
            if messages.is_empty() {
                set_info(model, report.summary());
            } else {
                set_error(model, messages.join("\n"));
            }
        }

        Message::DispatchFailed(label, err) => {
            set_error(model, format!("Cannot run '{}': {}", label, err));
        }

        Message::AttachFailed(err) => {
            set_error(model, format!("Cannot attach: {}", err));
        }
    }

    cmds
}

fn update_list(model: &mut Model, key: KeyEvent, cmds: &mut Vec<Command>) {
    let len = model.catalog.len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if len > 0 {
                model.select((model.selected + 1) % len);
            }
        }

        KeyCode::Char('k') | KeyCode::Up => {
            if len > 0 {
                model.select(model.selected.checked_sub(1).unwrap_or(len - 1));
            }
        }

        KeyCode::Enter => {
            if let Some(def) = model.catalog.get(model.selected) {
                cmds.push(Command::Dispatch(def.clone()));
            }
        }

        KeyCode::Char('o') => {
            cmds.push(Command::AttachTmux {
                session: model.config.effective_session().to_string(),
            });
        }

        KeyCode::Char('r') => {
            cmds.push(Command::ReloadConfig);
        }

        KeyCode::Char('q') | KeyCode::Esc => {
            cmds.push(Command::Quit);
        }

        KeyCode::Char('?') => {
            model.show_keymap = !model.show_keymap;
        }

        _ => {}
    }
}
