//! Dispatch topology and ordering tests.
//!
//! These tests verify which sessions the dispatcher opens for each kind of
//! definition and what it sends to them.

use commander::command::CommandDefinition;
use commander::config::Config;
use commander::dispatcher::{ActionOutcome, Dispatcher};
use commander::host::SessionHandle;
use commander::validator::{DenialReason, Validator};

use crate::fixtures::{HostEvent, RecordingHost, TestConfig, SAMPLE_CONFIG};

fn id(s: &str) -> SessionHandle {
    SessionHandle::new(s)
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Test: Split fan-out
/// Given a split definition with 3 lines
/// When dispatched
/// Then 3 sessions exist, the 2nd and 3rd parented to the 1st
#[test]
fn test_split_fans_out_from_first_session() {
    let mut host = RecordingHost::new();
    let validator = Validator::default();
    let def = CommandDefinition::new("Dev", lines(&["api", "web", "worker"])).split();

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(
        host.creates(),
        vec![
            (id("s1"), "Dev: api".to_string(), None),
            (id("s2"), "Dev: web".to_string(), Some(id("s1"))),
            (id("s3"), "Dev: worker".to_string(), Some(id("s1"))),
        ],
        "Every child should hang off the first session, not the previous one"
    );
    assert_eq!(
        host.sends(),
        vec![
            (id("s1"), "api".to_string()),
            (id("s2"), "web".to_string()),
            (id("s3"), "worker".to_string()),
        ]
    );
    assert!(report.is_clean());
}

/// Test: Show precedes send for every session
#[test]
fn test_each_session_shown_before_send() {
    let mut host = RecordingHost::new();
    let validator = Validator::default();
    let def = CommandDefinition::new("Dev", lines(&["api", "web"])).split();

    Dispatcher::new(&mut host, &validator).dispatch(&def);

    for (session, text) in host.sends() {
        let shown = host
            .position(|e| *e == HostEvent::Show(session.clone()))
            .expect("session was never shown");
        let sent = host
            .position(|e| *e == HostEvent::Send(session.clone(), text.clone()))
            .expect("send missing");
        assert!(shown < sent, "{} was sent to before being shown", session);
    }
}

/// Test: Split with a denied line
/// Given a split definition whose middle line is restricted
/// When dispatched
/// Then all sessions are still created and only allowed lines are sent
#[test]
fn test_split_denied_line_keeps_its_session() {
    let mut host = RecordingHost::new();
    let validator = Validator::default();
    let def = CommandDefinition::new("Mixed", lines(&["ls", "reboot now", "pwd"])).split();

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(host.creates().len(), 3);
    assert_eq!(
        host.sends(),
        vec![(id("s1"), "ls".to_string()), (id("s3"), "pwd".to_string())]
    );
    assert_eq!(report.denied(), 1);
    match &report.outcomes[1] {
        ActionOutcome::Denied {
            session, denial, ..
        } => {
            assert_eq!(session, &id("s2"));
            assert_eq!(denial.pattern, r"reboot\s+");
        }
        other => panic!("Expected denial, got {:?}", other),
    }
}

/// Test: Split when the first create fails
/// The next session that does get created becomes the parent.
#[test]
fn test_split_first_create_failure_promotes_next() {
    let mut host = RecordingHost::new();
    host.fail_create.insert(1);
    let validator = Validator::default();
    let def = CommandDefinition::new("Dev", lines(&["a", "b", "c"])).split();

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(
        host.creates(),
        vec![
            (id("s2"), "Dev: b".to_string(), None),
            (id("s3"), "Dev: c".to_string(), Some(id("s2"))),
        ]
    );
    assert!(matches!(
        report.outcomes[0],
        ActionOutcome::Failed { session: None, .. }
    ));
    assert_eq!(report.sent(), 2);
}

/// Test: Sequence
/// Given a 3-line sequence
/// When dispatched
/// Then one session titled with the label receives the lines in order
#[test]
fn test_sequence_uses_one_session_in_order() {
    let mut host = RecordingHost::new();
    let validator = Validator::default();
    let def = CommandDefinition::new("Steps", lines(&["one", "two", "three"]));

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(host.creates(), vec![(id("s1"), "Steps".to_string(), None)]);
    assert_eq!(
        host.sends(),
        vec![
            (id("s1"), "one".to_string()),
            (id("s1"), "two".to_string()),
            (id("s1"), "three".to_string()),
        ]
    );
    assert_eq!(report.summary(), "'Steps': sent 3 of 3 command(s)");
}

/// Test: Sequence continues past a denial
#[test]
fn test_sequence_continues_after_denial() {
    let mut host = RecordingHost::new();
    let validator = Validator::new(vec!["npm\\s+publish".to_string()]);
    let def = CommandDefinition::new("Release", lines(&["cargo test", "npm publish", "git push"]));

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(
        host.sends(),
        vec![
            (id("s1"), "cargo test".to_string()),
            (id("s1"), "git push".to_string()),
        ]
    );
    assert_eq!(report.sent(), 2);
    assert_eq!(report.denied(), 1);
    assert_eq!(
        report.messages(),
        vec!["Command not allowed since it contains restricted pattern: `npm\\s+publish`"]
    );
}

/// Test: Sequence when the host refuses to show the session
/// Nothing is sent and every line is reported as failed.
#[test]
fn test_sequence_show_failure_sends_nothing() {
    let mut host = RecordingHost::new();
    host.fail_show.insert(id("s1"));
    let validator = Validator::default();
    let def = CommandDefinition::new("Steps", lines(&["one", "two"]));

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert!(host.sends().is_empty());
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes.iter().all(|o| matches!(
        o,
        ActionOutcome::Failed {
            session: Some(_),
            ..
        }
    )));
}

/// Test: Reuse with an active session
#[test]
fn test_reuse_sends_to_active_session() {
    let mut host = RecordingHost::with_active("s9");
    let validator = Validator::default();
    let def = CommandDefinition::new("Build", "cargo build").reuse_terminal();

    Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert!(host.creates().is_empty(), "No session should be created");
    assert_eq!(
        host.events,
        vec![
            HostEvent::Show(id("s9")),
            HostEvent::Send(id("s9"), "cargo build".to_string()),
        ]
    );
}

/// Test: Reuse without an active session falls back to a new one
#[test]
fn test_reuse_without_active_creates_session() {
    let mut host = RecordingHost::new();
    let validator = Validator::default();
    let def = CommandDefinition::new("Build", "cargo build").reuse_terminal();

    Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(host.creates(), vec![(id("s1"), "Build".to_string(), None)]);
    assert_eq!(host.sends(), vec![(id("s1"), "cargo build".to_string())]);
}

/// Test: Without reuse a fresh session is opened even when one is active
#[test]
fn test_single_ignores_active_without_reuse() {
    let mut host = RecordingHost::with_active("s9");
    let validator = Validator::default();
    let def = CommandDefinition::new("Build", "cargo build");

    Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(host.sends(), vec![(id("s1"), "cargo build".to_string())]);
}

/// Test: Second reuse dispatch lands where the first one ran
#[test]
fn test_reuse_follows_last_shown_session() {
    let mut host = RecordingHost::new();
    let validator = Validator::default();
    let def = CommandDefinition::new("Build", "cargo build").reuse_terminal();

    Dispatcher::new(&mut host, &validator).dispatch(&def);
    Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(host.creates().len(), 1);
    assert_eq!(
        host.sends(),
        vec![
            (id("s1"), "cargo build".to_string()),
            (id("s1"), "cargo build".to_string()),
        ]
    );
}

/// Test: Security override
/// Given a restricted line with override_security
/// When dispatched
/// Then the line is sent unchanged
#[test]
fn test_override_security_sends_restricted_line() {
    let mut host = RecordingHost::new();
    let validator = Validator::default();
    let def = CommandDefinition::new("Wipe", "rm -rf /tmp/x").override_security();

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(host.sends(), vec![(id("s1"), "rm -rf /tmp/x".to_string())]);
    assert!(report.is_clean());
}

/// Test: Without override the same line is denied and the session stays empty
#[test]
fn test_denied_single_leaves_session_open() {
    let mut host = RecordingHost::new();
    let validator = Validator::default();
    let def = CommandDefinition::new("Wipe", "rm -rf /tmp/x");

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(host.creates().len(), 1);
    assert!(host.sends().is_empty());
    assert_eq!(report.denied(), 1);
}

/// Test: A broken user pattern denies everything
#[test]
fn test_invalid_pattern_denies_dispatch() {
    let mut host = RecordingHost::new();
    let validator = Validator::new(vec!["([".to_string()]);
    let def = CommandDefinition::new("List", "ls");

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert!(host.sends().is_empty());
    match &report.outcomes[0] {
        ActionOutcome::Denied { denial, .. } => {
            assert_eq!(denial.pattern, "([");
            assert!(matches!(denial.reason, DenialReason::InvalidPattern { .. }));
        }
        other => panic!("Expected denial, got {:?}", other),
    }
}

/// Test: Send failure on one line does not stop the next
#[test]
fn test_send_failure_is_per_line() {
    let mut host = RecordingHost::new();
    host.fail_send.insert("two".to_string());
    let validator = Validator::default();
    let def = CommandDefinition::new("Steps", lines(&["one", "two", "three"]));

    let report = Dispatcher::new(&mut host, &validator).dispatch(&def);

    assert_eq!(report.sent(), 2);
    assert!(matches!(report.outcomes[1], ActionOutcome::Failed { .. }));
    assert!(report.messages()[0].starts_with("Failed to run 'two':"));
}

/// Test: Definitions loaded from disk dispatch the same as built ones
#[test]
fn test_dispatch_from_loaded_catalog() {
    let cfg = TestConfig::with_contents(SAMPLE_CONFIG);
    let config = Config::load_from(&cfg.path).unwrap();
    let catalog = config.catalog();
    let validator = Validator::new(config.restricted_patterns.clone());
    let mut host = RecordingHost::new();

    let servers = catalog.find("Dev servers").unwrap();
    let report = Dispatcher::new(&mut host, &validator).dispatch(servers);
    assert_eq!(report.sent(), 3);

    let release = catalog.find("Release").unwrap();
    let report = Dispatcher::new(&mut host, &validator).dispatch(release);
    assert_eq!(report.denied(), 1);

    let unmount = catalog.find("Force unmount").unwrap();
    let report = Dispatcher::new(&mut host, &validator).dispatch(unmount);
    assert!(report.is_clean());
}
