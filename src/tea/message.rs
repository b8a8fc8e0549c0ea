//! Messages for the TEA (The Elm Architecture) pattern.
//!
//! Messages are inputs to the update function - they come from the keyboard,
//! the config watcher, or command completion callbacks.

use crossterm::event::KeyEvent;

use crate::config::Config;
use crate::dispatcher::DispatchReport;

#[derive(Debug)]
pub enum Message {
    // Keyboard/terminal events
    Key(KeyEvent),
    Resize(u16, u16),

    /// The config file changed on disk.
    ConfigChanged,

    // Command completion callbacks
    ConfigReloaded(Config),
    ConfigReloadFailed(String),
    Dispatched(DispatchReport),
    DispatchFailed(String, String),
    AttachFailed(String),
}
