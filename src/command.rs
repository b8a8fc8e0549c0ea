//! Command definitions and the immutable catalog built from configuration.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Either one command line or an ordered sequence of command lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandLine {
    Single(String),
    Sequence(Vec<String>),
}

impl CommandLine {
    /// Coerce to a sequence; a single line becomes a one-element sequence.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            CommandLine::Single(line) => vec![line.as_str()],
            CommandLine::Sequence(lines) => lines.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, CommandLine::Sequence(_))
    }

    /// One-line summary used by the list view and `commander list`.
    pub fn summary(&self) -> String {
        match self {
            CommandLine::Single(line) => line.clone(),
            CommandLine::Sequence(lines) => lines.join(" ; "),
        }
    }
}

impl From<&str> for CommandLine {
    fn from(line: &str) -> Self {
        CommandLine::Single(line.to_string())
    }
}

impl From<Vec<String>> for CommandLine {
    fn from(mut lines: Vec<String>) -> Self {
        if lines.len() == 1 {
            CommandLine::Single(lines.remove(0))
        } else {
            CommandLine::Sequence(lines)
        }
    }
}

/// A named unit of work to dispatch to the terminal host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub label: String,
    pub command: CommandLine,
    #[serde(default)]
    pub split: bool,
    #[serde(default, alias = "reuseTerminal")]
    pub reuse_terminal: bool,
    #[serde(default, alias = "overrideSecurity")]
    pub override_security: bool,
}

impl CommandDefinition {
    pub fn new(label: impl Into<String>, command: impl Into<CommandLine>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
            split: false,
            reuse_terminal: false,
            override_security: false,
        }
    }

    pub fn split(mut self) -> Self {
        self.split = true;
        self
    }

    pub fn reuse_terminal(mut self) -> Self {
        self.reuse_terminal = true;
        self
    }

    pub fn override_security(mut self) -> Self {
        self.override_security = true;
        self
    }

    /// Short description of how the definition will be dispatched.
    pub fn mode(&self) -> &'static str {
        if self.split {
            "split"
        } else if self.command.is_sequence() {
            "sequence"
        } else if self.reuse_terminal {
            "reuse"
        } else {
            "single"
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "command label cannot be empty".to_string(),
            ));
        }
        if let CommandLine::Sequence(lines) = &self.command {
            if lines.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "command '{}' has an empty command list",
                    self.label
                )));
            }
        }
        Ok(())
    }
}

/// Immutable, ordered set of definitions from one configuration read.
///
/// A refresh builds a new catalog and swaps it in whole; clones share the
/// same backing slice.
#[derive(Debug, Clone, Default)]
pub struct Catalog(Arc<[CommandDefinition]>);

impl Catalog {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        Self(definitions.into())
    }

    /// First definition whose label matches exactly.
    pub fn find(&self, label: &str) -> Result<&CommandDefinition> {
        self.0
            .iter()
            .find(|def| def.label == label)
            .ok_or_else(|| Error::CommandNotFound(label.to_string()))
    }
}

impl Deref for Catalog {
    type Target = [CommandDefinition];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
