//! Commands for the TEA (The Elm Architecture) pattern.
//!
//! Commands are outputs from the update function - they represent side effects
//! to be executed by the runtime.

use crate::command::CommandDefinition;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a definition through the dispatcher. Carries the definition by
    /// value so a concurrent reload cannot change what gets dispatched.
    Dispatch(CommandDefinition),

    /// Re-read the config file and rebuild the catalog.
    ReloadConfig,

    AttachTmux {
        session: String,
    },

    Quit,
}
