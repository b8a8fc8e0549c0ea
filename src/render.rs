use std::sync::atomic::{AtomicU64, Ordering};

use crate::tea::Notification;

/// One row of the command list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandView {
    pub label: String,
    pub mode: &'static str,
    pub summary: String,
    pub override_security: bool,
}

/// One line of the selected definition, as the dispatcher would judge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePreview {
    pub text: String,
    /// Restricted pattern that would block this line.
    pub blocked_by: Option<String>,
}

static VERSION_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn next_version() -> u64 {
    VERSION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub version: u64,
    pub commands: Vec<CommandView>,
    pub selected: usize,
    pub preview: Vec<LinePreview>,
    pub notification: Option<Notification>,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,
    pub tmux_session: String,
    pub config_path: String,
}
