//! Turns one [`CommandDefinition`] into terminal host actions.
//!
//! Topology, in priority order:
//! - `split`: one new session per command line. Every session after the
//!   first is created as a child of the first session of this dispatch
//!   (fan-out from first, not a chain).
//! - sequence: one new session titled with the label; every line is sent to
//!   it in order.
//! - single line: the active session when `reuse_terminal` is set and one
//!   exists, otherwise a new session titled with the label.
//!
//! Each session is shown right after creation, before anything is sent to it.
//! Every line is validated on its own, so a denied or failed line never stops
//! the lines after it.

use crate::command::CommandDefinition;
use crate::host::{SessionHandle, SessionOptions, TerminalHost};
use crate::validator::{Denial, ValidationOutcome, Validator};
use crate::{clog, clog_debug, clog_warn};

/// What happened to a single command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Sent {
        session: SessionHandle,
        command: String,
    },
    /// Nothing was sent; the session stays open and empty.
    Denied {
        session: SessionHandle,
        command: String,
        denial: Denial,
    },
    /// The terminal host refused a call for this line.
    Failed {
        session: Option<SessionHandle>,
        command: String,
        error: String,
    },
}

impl ActionOutcome {
    pub fn command(&self) -> &str {
        match self {
            ActionOutcome::Sent { command, .. }
            | ActionOutcome::Denied { command, .. }
            | ActionOutcome::Failed { command, .. } => command,
        }
    }

    /// User-facing message for outcomes that did not send.
    pub fn message(&self) -> Option<String> {
        match self {
            ActionOutcome::Sent { .. } => None,
            ActionOutcome::Denied { denial, .. } => Some(denial.to_string()),
            ActionOutcome::Failed { command, error, .. } => {
                Some(format!("Failed to run '{}': {}", command, error))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub label: String,
    pub outcomes: Vec<ActionOutcome>,
}

impl DispatchReport {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            outcomes: Vec::new(),
        }
    }

    pub fn sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ActionOutcome::Sent { .. }))
            .count()
    }

    pub fn denied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ActionOutcome::Denied { .. }))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.sent() == self.outcomes.len()
    }

    /// Messages for every line that was not sent, in dispatch order.
    pub fn messages(&self) -> Vec<String> {
        self.outcomes.iter().filter_map(ActionOutcome::message).collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "'{}': sent {} of {} command(s)",
            self.label,
            self.sent(),
            self.outcomes.len()
        )
    }
}

pub struct Dispatcher<'a, H: TerminalHost> {
    host: &'a mut H,
    validator: &'a Validator,
}

impl<'a, H: TerminalHost> Dispatcher<'a, H> {
    pub fn new(host: &'a mut H, validator: &'a Validator) -> Self {
        Self { host, validator }
    }

    pub fn dispatch(&mut self, def: &CommandDefinition) -> DispatchReport {
        clog!("Dispatch label={} mode={}", def.label, def.mode());
        let mut report = DispatchReport::new(&def.label);

        if def.split {
            self.dispatch_split(def, &mut report);
        } else if def.command.is_sequence() {
            self.dispatch_sequence(def, &mut report);
        } else {
            self.dispatch_single(def, &mut report);
        }

        clog_debug!("Dispatch finished: {}", report.summary());
        report
    }

    fn dispatch_split(&mut self, def: &CommandDefinition, report: &mut DispatchReport) {
        let mut first: Option<SessionHandle> = None;

        for line in def.command.lines() {
            let options = SessionOptions::named(format!("{}: {}", def.label, line))
                .with_parent(first.clone());
            let session = match self.host.create_session(&options) {
                Ok(session) => session,
                Err(e) => {
                    report.outcomes.push(failed(None, line, e));
                    continue;
                }
            };
            clog_debug!(
                "Split session {} created (parent={:?})",
                session,
                options.parent
            );
            if first.is_none() {
                first = Some(session.clone());
            }
            if let Err(e) = self.host.show(&session) {
                report.outcomes.push(failed(Some(session), line, e));
                continue;
            }
            let outcome = self.submit(&session, line, def.override_security);
            report.outcomes.push(outcome);
        }
    }

    fn dispatch_sequence(&mut self, def: &CommandDefinition, report: &mut DispatchReport) {
        let lines = def.command.lines();
        let session = match self.open(SessionOptions::named(&def.label)) {
            Ok(session) => session,
            Err((session, error)) => {
                for line in lines {
                    report.outcomes.push(ActionOutcome::Failed {
                        session: session.clone(),
                        command: line.to_string(),
                        error: error.clone(),
                    });
                }
                return;
            }
        };

        for line in lines {
            let outcome = self.submit(&session, line, def.override_security);
            report.outcomes.push(outcome);
        }
    }

    fn dispatch_single(&mut self, def: &CommandDefinition, report: &mut DispatchReport) {
        let Some(&line) = def.command.lines().first() else {
            return;
        };

        let reused = if def.reuse_terminal {
            self.host.active_session()
        } else {
            None
        };

        let session = match reused {
            Some(session) => {
                clog_debug!("Reusing active session {}", session);
                if let Err(e) = self.host.show(&session) {
                    report.outcomes.push(failed(Some(session), line, e));
                    return;
                }
                session
            }
            None => match self.open(SessionOptions::named(&def.label)) {
                Ok(session) => session,
                Err((session, error)) => {
                    report.outcomes.push(ActionOutcome::Failed {
                        session,
                        command: line.to_string(),
                        error,
                    });
                    return;
                }
            },
        };

        let outcome = self.submit(&session, line, def.override_security);
        report.outcomes.push(outcome);
    }

    /// Create a session and show it.
    fn open(
        &mut self,
        options: SessionOptions,
    ) -> std::result::Result<SessionHandle, (Option<SessionHandle>, String)> {
        let session = self
            .host
            .create_session(&options)
            .map_err(|e| (None, e.to_string()))?;
        clog_debug!("Session {} created name={}", session, options.name);
        self.host
            .show(&session)
            .map_err(|e| (Some(session.clone()), e.to_string()))?;
        Ok(session)
    }

    /// Validate one line and send it if allowed.
    fn submit(&mut self, session: &SessionHandle, line: &str, override_security: bool) -> ActionOutcome {
        if !override_security {
            if let ValidationOutcome::Denied(denial) = self.validator.check(line) {
                clog_warn!("Denied {:?} on {}: {}", line, session, denial);
                return ActionOutcome::Denied {
                    session: session.clone(),
                    command: line.to_string(),
                    denial,
                };
            }
        } else {
            clog_debug!("Security override, sending {:?} unchecked", line);
        }

        match self.host.send_text(session, line) {
            Ok(()) => ActionOutcome::Sent {
                session: session.clone(),
                command: line.to_string(),
            },
            Err(e) => failed(Some(session.clone()), line, e),
        }
    }
}

fn failed(session: Option<SessionHandle>, line: &str, error: crate::Error) -> ActionOutcome {
    clog_warn!("Host call failed for {:?}: {}", line, error);
    ActionOutcome::Failed {
        session,
        command: line.to_string(),
        error: error.to_string(),
    }
}
