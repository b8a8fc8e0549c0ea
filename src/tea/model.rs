//! Model for the TEA (The Elm Architecture) pattern.
//!
//! The Model is pure application state - no channels, no handles, no runtime infrastructure.

use std::path::PathBuf;

use crate::command::Catalog;
use crate::config::Config;
use crate::render::{next_version, CommandView, LinePreview, RenderState};
use crate::validator::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Error notification - displayed in red with "Error:" prefix
    Error,
    /// Informational notification - displayed in green
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Pure application state - the single source of truth.
pub struct Model {
    /// Replaced whole on every reload, never edited in place.
    pub catalog: Catalog,
    pub selected: usize,
    /// Validation preview of the selected definition; see [`Model::select`].
    preview: Vec<LinePreview>,

    pub notification: Option<Notification>,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,

    // Dirty flag - set when state changes and render is needed
    pub dirty: bool,

    pub config: Config,
    pub config_path: PathBuf,
}

impl Model {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        let mut model = Self {
            catalog: config.catalog(),
            selected: 0,
            preview: Vec::new(),
            notification: None,
            show_keymap: false,
            dirty: true,
            config,
            config_path,
        };
        model.refresh_preview();
        model
    }

    /// Swap in a freshly loaded config and rebuild the catalog from it.
    pub fn replace_config(&mut self, config: Config) {
        self.catalog = config.catalog();
        self.config = config;
        if self.selected >= self.catalog.len() {
            self.selected = self.catalog.len().saturating_sub(1);
        }
        self.refresh_preview();
        self.dirty = true;
    }

    /// Move the selection and revalidate the lines shown in the preview.
    pub fn select(&mut self, index: usize) {
        self.selected = index;
        self.refresh_preview();
        self.dirty = true;
    }

    pub fn validator(&self) -> Validator {
        Validator::new(self.config.restricted_patterns.clone())
    }

    /// Patterns are compiled here, once per selection or config change,
    /// never per frame.
    fn refresh_preview(&mut self) {
        let validator = self.validator();
        self.preview = self
            .catalog
            .get(self.selected)
            .map(|def| {
                def.command
                    .lines()
                    .into_iter()
                    .map(|line| LinePreview {
                        text: line.to_string(),
                        blocked_by: if def.override_security {
                            None
                        } else {
                            validator.check(line).pattern().map(str::to_string)
                        },
                    })
                    .collect()
            })
            .unwrap_or_default();
    }

    /// Create an immutable snapshot for the render thread.
    ///
    /// Each snapshot gets a monotonically increasing version number so the
    /// render thread can skip redundant draws.
    pub fn snapshot(&self) -> RenderState {
        let commands = self
            .catalog
            .iter()
            .map(|def| CommandView {
                label: def.label.clone(),
                mode: def.mode(),
                summary: def.command.summary(),
                override_security: def.override_security,
            })
            .collect();

        RenderState {
            version: next_version(),
            commands,
            selected: self.selected,
            preview: self.preview.clone(),
            notification: self.notification.clone(),
            show_keymap: self.show_keymap,
            tmux_session: self.config.effective_session().to_string(),
            config_path: self.config_path.display().to_string(),
        }
    }
}
