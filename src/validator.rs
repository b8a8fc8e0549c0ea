//! Restricted-pattern validation of command lines.
//!
//! A command line is split on `|` and `&` into sub-command tokens and every
//! restricted pattern is searched for in every token. Patterns are checked in
//! merged order (user patterns first, then [`DEFAULT_PATTERNS`]) and the first
//! pattern that matches any token is reported.
//!
//! The split is lexical: quoting is not understood, so `echo "a | b"` yields
//! the tokens `echo "a` and `b"`.

use std::fmt;

use regex::Regex;

use crate::{clog_trace, clog_warn};

/// Built-in restricted patterns, always appended after the user's patterns.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"rm\s+-rf\s+/",
    r"shutdown\s+",
    r"reboot\s+",
    r"dd\s+if=/dev/.*",
    r"mkfs\s+",
    r"mkswap\s+",
    r"init\s+",
    r"poweroff\s+",
    r"halt\s+",
    r"swapoff\s+",
    r"swapon\s+",
    r"umount\s+",
    r"fsck\s+",
];

const OPERATORS: [char; 2] = ['|', '&'];

/// Why a command was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// The pattern matched this sub-command token.
    Matched { token: String },
    /// The pattern does not compile; validation fails closed on it.
    InvalidPattern { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub pattern: String,
    pub reason: DenialReason,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            DenialReason::Matched { .. } => write!(
                f,
                "Command not allowed since it contains restricted pattern: `{}`",
                self.pattern
            ),
            DenialReason::InvalidPattern { .. } => write!(
                f,
                "Command not allowed since restricted pattern `{}` is not a valid regular expression",
                self.pattern
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Allowed,
    Denied(Denial),
}

impl ValidationOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ValidationOutcome::Allowed)
    }

    /// The pattern that blocked the command, if any.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Allowed => None,
            ValidationOutcome::Denied(denial) => Some(&denial.pattern),
        }
    }
}

/// Merge user patterns with the defaults into a new list.
///
/// Never reuses a previous merge: each call reflects only `user`.
pub fn merged_patterns(user: &[String]) -> Vec<String> {
    user.iter()
        .cloned()
        .chain(DEFAULT_PATTERNS.iter().map(|p| p.to_string()))
        .collect()
}

/// Split a command line into trimmed, non-empty sub-command tokens.
pub fn sub_commands(command: &str) -> Vec<&str> {
    command
        .split(OPERATORS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Validate `command` against an already merged pattern list.
pub fn validate(command: &str, patterns: &[String]) -> ValidationOutcome {
    let tokens = sub_commands(command);

    for pattern in patterns {
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                clog_warn!("Restricted pattern {:?} does not compile: {}", pattern, e);
                return ValidationOutcome::Denied(Denial {
                    pattern: pattern.clone(),
                    reason: DenialReason::InvalidPattern {
                        error: e.to_string(),
                    },
                });
            }
        };

        if let Some(token) = tokens.iter().find(|token| regex.is_match(token)) {
            clog_trace!("Pattern {:?} matched token {:?}", pattern, token);
            return ValidationOutcome::Denied(Denial {
                pattern: pattern.clone(),
                reason: DenialReason::Matched {
                    token: token.to_string(),
                },
            });
        }
    }

    ValidationOutcome::Allowed
}

/// Validates command lines against the user's restricted patterns.
///
/// Holds only the user-supplied list; the merge with the defaults is redone
/// on every [`Validator::check`].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    user_patterns: Vec<String>,
}

impl Validator {
    pub fn new(user_patterns: Vec<String>) -> Self {
        Self { user_patterns }
    }

    pub fn patterns(&self) -> Vec<String> {
        merged_patterns(&self.user_patterns)
    }

    pub fn check(&self, command: &str) -> ValidationOutcome {
        validate(command, &self.patterns())
    }
}
