//! The terminal host capability consumed by the dispatcher.

use std::fmt;

use crate::Result;

/// Opaque reference to a session owned by the terminal host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub String);

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options for [`TerminalHost::create_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub name: String,
    /// Create the session linked under this one instead of standalone.
    pub parent: Option<SessionHandle>,
}

impl SessionOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Option<SessionHandle>) -> Self {
        self.parent = parent;
        self
    }
}

/// Something that can create, show and type into terminal sessions.
///
/// Calls are synchronous from the caller's point of view. `send_text` is
/// fire-and-forget: it submits the line and does not wait for it to finish.
pub trait TerminalHost {
    fn create_session(&mut self, options: &SessionOptions) -> Result<SessionHandle>;

    /// The session the user last interacted with, if it still exists.
    fn active_session(&self) -> Option<SessionHandle>;

    /// Bring the session to the foreground.
    fn show(&mut self, session: &SessionHandle) -> Result<()>;

    /// Type `text` into the session and submit it.
    fn send_text(&mut self, session: &SessionHandle, text: &str) -> Result<()>;
}
