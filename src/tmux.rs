use std::process::{Command, Output};

use crate::host::{SessionHandle, SessionOptions, TerminalHost};
use crate::{clog_debug, clog_trace, clog_warn, Error, Result};

/// Thin wrappers over the tmux CLI.
pub struct Tmux;

impl Tmux {
    fn run(args: &[&str]) -> Result<Output> {
        clog_trace!("tmux {}", args.join(" "));
        Ok(Command::new("tmux").args(args).output()?)
    }

    fn run_checked(args: &[&str], what: &str) -> Result<String> {
        let output = Self::run(args)?;
        if !output.status.success() {
            let err = format!("{}: {}", what, String::from_utf8_lossy(&output.stderr).trim());
            clog_warn!("tmux call failed: {}", err);
            return Err(Error::Tmux(err));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn session_exists(name: &str) -> bool {
        Self::run(&["has-session", "-t", name])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub fn pane_exists(pane: &str) -> bool {
        Self::run(&["display-message", "-t", pane, "-p", "#{pane_id}"])
            .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == pane)
            .unwrap_or(false)
    }

    /// Check if we're running inside a tmux session
    pub fn inside_tmux() -> bool {
        std::env::var("TMUX").is_ok()
    }

    pub fn is_available() -> bool {
        which::which("tmux").is_ok()
    }

    /// Create a detached session and return the pane id of its first window.
    pub fn new_session(session: &str, window_name: &str) -> Result<String> {
        clog_debug!("Tmux::new_session session={} window={}", session, window_name);
        Self::run_checked(
            &[
                "new-session", "-d", "-s", session, "-n", window_name, "-P", "-F", "#{pane_id}",
            ],
            &format!("Failed to create session '{}'", session),
        )
    }

    pub fn new_window(session: &str, window_name: &str) -> Result<String> {
        clog_debug!("Tmux::new_window session={} window={}", session, window_name);
        let target = format!("{}:", session);
        Self::run_checked(
            &["new-window", "-t", &target, "-n", window_name, "-P", "-F", "#{pane_id}"],
            &format!("Failed to create window '{}'", window_name),
        )
    }

    pub fn split_window(parent_pane: &str, title: &str) -> Result<String> {
        clog_debug!("Tmux::split_window parent={} title={}", parent_pane, title);
        let pane = Self::run_checked(
            &["split-window", "-t", parent_pane, "-P", "-F", "#{pane_id}"],
            &format!("Failed to split pane '{}'", parent_pane),
        )?;
        // Titles are cosmetic; a failure here does not invalidate the pane.
        let _ = Self::run(&["select-pane", "-t", &pane, "-T", title]);
        let _ = Self::run(&["select-layout", "-t", &pane, "tiled"]);
        Ok(pane)
    }

    pub fn select_pane(pane: &str) -> Result<()> {
        Self::run_checked(
            &["select-window", "-t", pane],
            &format!("Failed to select window of '{}'", pane),
        )?;
        Self::run_checked(
            &["select-pane", "-t", pane],
            &format!("Failed to select pane '{}'", pane),
        )?;
        Ok(())
    }

    /// Type `text` literally, then press Enter.
    pub fn send_line(pane: &str, text: &str) -> Result<()> {
        clog_debug!("Tmux::send_line pane={} text={}", pane, text);
        Self::run_checked(
            &["send-keys", "-t", pane, "-l", text],
            &format!("Failed to send keys to '{}'", pane),
        )?;
        Self::run_checked(
            &["send-keys", "-t", pane, "Enter"],
            &format!("Failed to send Enter to '{}'", pane),
        )?;
        Ok(())
    }

    pub fn attach(name: &str) -> Result<()> {
        clog_debug!("Tmux::attach name={}", name);
        let _ = Self::run(&["bind-key", "-n", "C-q", "detach-client"]);
        let _ = Self::run(&[
            "set-hook",
            "-t",
            name,
            "client-attached",
            "display-message -d 5000 'Press ^q to return'",
        ]);

        let status = if Self::inside_tmux() {
            clog_debug!("Attaching via popup (inside tmux)");
            Command::new("tmux")
                .args([
                    "display-popup", "-E", "-w", "95%", "-h", "95%", "tmux", "attach-session",
                    "-t", name,
                ])
                .status()?
        } else {
            clog_debug!("Attaching directly (outside tmux)");
            Command::new("tmux")
                .args(["attach-session", "-t", name])
                .status()?
        };
        if !status.success() {
            clog_warn!("Failed to attach to session '{}'", name);
            return Err(Error::Tmux(format!("Failed to attach to session '{}'", name)));
        }
        clog_debug!("Detached from session: {}", name);
        Ok(())
    }
}

/// [`TerminalHost`] backed by windows and panes of one tmux session.
///
/// Standalone sessions are tmux windows; child sessions are panes split off
/// their parent's pane. Handles are tmux pane ids (`%7`).
pub struct TmuxHost {
    session: String,
    active: Option<SessionHandle>,
}

impl TmuxHost {
    pub fn new(session: impl Into<String>) -> Result<Self> {
        if !Tmux::is_available() {
            return Err(Error::TmuxNotAvailable);
        }
        Ok(Self {
            session: sanitize_session_name(&session.into()),
            active: None,
        })
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// A fresh window in the host session, creating the session on first use.
    fn open_window(&self, name: &str) -> Result<String> {
        let window = sanitize_window_name(name);
        if Tmux::session_exists(&self.session) {
            Tmux::new_window(&self.session, &window)
        } else {
            Tmux::new_session(&self.session, &window)
        }
    }
}

impl TerminalHost for TmuxHost {
    fn create_session(&mut self, options: &SessionOptions) -> Result<SessionHandle> {
        let pane = match &options.parent {
            Some(parent) => Tmux::split_window(parent.as_str(), &options.name)?,
            None => self.open_window(&options.name)?,
        };
        Ok(SessionHandle::new(pane))
    }

    fn active_session(&self) -> Option<SessionHandle> {
        self.active
            .as_ref()
            .filter(|handle| Tmux::pane_exists(handle.as_str()))
            .cloned()
    }

    fn show(&mut self, session: &SessionHandle) -> Result<()> {
        Tmux::select_pane(session.as_str())?;
        self.active = Some(session.clone());
        Ok(())
    }

    fn send_text(&mut self, session: &SessionHandle, text: &str) -> Result<()> {
        Tmux::send_line(session.as_str(), text)
    }
}

pub fn sanitize_session_name(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "commander".to_string()
    } else {
        cleaned
    }
}

/// Window names may not contain the target separators `:` and `.`.
fn sanitize_window_name(s: &str) -> String {
    s.chars()
        .map(|c| if c == ':' || c == '.' { '_' } else { c })
        .collect()
}
