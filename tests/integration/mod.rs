//! Integration test suite for commander.
//!
//! These tests drive the public API end to end: configuration on disk,
//! pattern validation and dispatch against a recording terminal host.
//!
//! # Test Categories
//!
//! - `dispatch`: session topology, ordering and per-line outcomes
//! - `validation`: restricted pattern matching through the public API
//! - `config_refresh`: loading, saving and live reload of the config file
//!
//! # CI Compatibility
//!
//! No test here starts tmux; every host interaction goes through
//! `fixtures::RecordingHost`.

mod fixtures;

mod dispatch;
