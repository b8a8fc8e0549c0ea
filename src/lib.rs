pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod log;
pub mod tmux;
pub mod validator;
pub mod watcher;

// Decoupled game loop architecture
pub mod app;
pub mod render;
pub mod tea;
pub mod ui;

pub use command::{Catalog, CommandDefinition, CommandLine};
pub use config::Config;
pub use dispatcher::{ActionOutcome, DispatchReport, Dispatcher};
pub use error::{Error, Result};
pub use host::{SessionHandle, SessionOptions, TerminalHost};
pub use validator::{Denial, DenialReason, ValidationOutcome, Validator};
