//! Trace snapshots.

use toxbridge_adapter::HostAction;

use crate::RecordingHost;

/// Everything the host saw, plus where it started.
#[derive(Debug, Clone)]
pub struct TraceSnapshot {
    /// Contact names before the first action.
    pub initial_contacts: Vec<String>,
    /// Actions in execution order.
    pub trace: Vec<HostAction>,
}

impl TraceSnapshot {
    /// Snapshot from parts.
    pub fn new(initial_contacts: Vec<String>, trace: Vec<HostAction>) -> Self {
        Self { initial_contacts, trace }
    }

    /// Snapshot of a recording host.
    pub fn from_host(host: &RecordingHost) -> Self {
        Self::new(host.initial_contacts().to_vec(), host.trace().to_vec())
    }
}
