//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - A terminal host double that records every call
//! - Temporary config files

use std::collections::HashSet;
use std::path::PathBuf;

use tempfile::TempDir;

use commander::host::{SessionHandle, SessionOptions, TerminalHost};
use commander::{Error, Result};

/// One call made against [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Create {
        id: SessionHandle,
        name: String,
        parent: Option<SessionHandle>,
    },
    Show(SessionHandle),
    Send(SessionHandle, String),
}

/// Terminal host that hands out `s1`, `s2`, ... and records every call.
///
/// Failures can be injected per call: the n-th `create_session` (1-based),
/// `show` on a given handle, or any `send_text` whose text matches.
#[derive(Default)]
pub struct RecordingHost {
    pub events: Vec<HostEvent>,
    pub active: Option<SessionHandle>,
    created: usize,
    pub fail_create: HashSet<usize>,
    pub fail_show: HashSet<SessionHandle>,
    pub fail_send: HashSet<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose last shown session is `id`.
    pub fn with_active(id: &str) -> Self {
        Self {
            active: Some(SessionHandle::new(id)),
            ..Default::default()
        }
    }

    pub fn creates(&self) -> Vec<(SessionHandle, String, Option<SessionHandle>)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::Create { id, name, parent } => {
                    Some((id.clone(), name.clone(), parent.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn sends(&self) -> Vec<(SessionHandle, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::Send(id, text) => Some((id.clone(), text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Index of the first event matching `pred`.
    pub fn position(&self, pred: impl Fn(&HostEvent) -> bool) -> Option<usize> {
        self.events.iter().position(pred)
    }
}

impl TerminalHost for RecordingHost {
    fn create_session(&mut self, options: &SessionOptions) -> Result<SessionHandle> {
        self.created += 1;
        if self.fail_create.contains(&self.created) {
            return Err(Error::Tmux(format!("create #{} refused", self.created)));
        }
        let id = SessionHandle::new(format!("s{}", self.created));
        self.events.push(HostEvent::Create {
            id: id.clone(),
            name: options.name.clone(),
            parent: options.parent.clone(),
        });
        Ok(id)
    }

    fn active_session(&self) -> Option<SessionHandle> {
        self.active.clone()
    }

    fn show(&mut self, session: &SessionHandle) -> Result<()> {
        if self.fail_show.contains(session) {
            return Err(Error::Tmux(format!("cannot show {}", session)));
        }
        self.events.push(HostEvent::Show(session.clone()));
        self.active = Some(session.clone());
        Ok(())
    }

    fn send_text(&mut self, session: &SessionHandle, text: &str) -> Result<()> {
        if self.fail_send.contains(text) {
            return Err(Error::Tmux(format!("send to {} refused", session)));
        }
        self.events
            .push(HostEvent::Send(session.clone(), text.to_string()));
        Ok(())
    }
}

/// A config file inside a temporary directory that lives as long as this value.
pub struct TestConfig {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestConfig {
    /// Write `contents` to `<tmp>/commander.toml`.
    pub fn with_contents(contents: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("commander.toml");
        std::fs::write(&path, contents).expect("Failed to write config");
        Self { temp_dir, path }
    }

    /// A path inside a fresh temporary directory with no file behind it.
    pub fn missing() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("commander.toml");
        Self { temp_dir, path }
    }

    pub fn write(&self, contents: &str) {
        std::fs::write(&self.path, contents).expect("Failed to rewrite config");
    }
}

/// A config exercising every dispatch mode.
pub const SAMPLE_CONFIG: &str = r#"
tmux_session = "it"
restricted_patterns = ["npm\\s+publish"]

[[commands]]
label = "Build"
command = "cargo build"
reuse_terminal = true

[[commands]]
label = "Dev servers"
command = ["npm run api", "npm run web", "npm run worker"]
split = true

[[commands]]
label = "Release"
command = ["cargo test", "npm publish", "git push"]

[[commands]]
label = "Force unmount"
command = "umount /mnt/scratch"
overrideSecurity = true
"#;
