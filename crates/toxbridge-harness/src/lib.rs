//! Deterministic simulation harness for the toxbridge adapter.
//!
//! Provides a scriptable network core ([`SimCore`]), a manual clock
//! ([`SimEnv`]) and a host that records every action ([`RecordingHost`]).
//! [`SimWorld`] wires them to a real dispatcher so scenarios run without
//! sockets, threads or wall-clock time.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties of the recorded action trace.
//! Use [`InvariantRegistry::standard()`] after any scenario or property run.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod recording_host;
pub mod sim_core;
pub mod sim_env;
pub mod world;

pub use invariants::{
    Invariant, InvariantRegistry, InvariantResult, ProgressInRange, QuietAfterCancel,
    SingleConnectedBatch, StatusForListedContacts, StoreWhileStopped, TraceSnapshot, Violation,
};
pub use recording_host::{
    AuthorizationPrompt, HostContact, Notification, ReceivedMessage, RecordingHost,
};
pub use sim_core::{CallLog, SentMessage, SimCore};
pub use sim_env::SimEnv;
pub use world::SimWorld;
