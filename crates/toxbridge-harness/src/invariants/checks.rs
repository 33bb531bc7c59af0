//! Standard invariant checks.

use std::collections::BTreeSet;

use toxbridge_adapter::{HostAction, connection::PROGRESS_STEPS};
use toxbridge_core::SettingKey;

use super::{Invariant, InvariantResult, TraceSnapshot, Violation};

fn violation(invariant: &'static str, index: usize, message: impl Into<String>) -> Violation {
    Violation { invariant, message: format!("action {index}: {}", message.into()) }
}

fn is_tick_driven(action: &HostAction) -> bool {
    matches!(
        action,
        HostAction::Progress { .. }
            | HostAction::SetConnected
            | HostAction::ContactStatus { .. }
            | HostAction::MessageReceived { .. }
            | HostAction::AliasContact { .. }
            | HostAction::RequestAuthorization { .. }
    )
}

/// Nothing network-driven reaches the host between `CancelTicks` and the next
/// `ScheduleTicks`.
pub struct QuietAfterCancel;

impl Invariant for QuietAfterCancel {
    fn name(&self) -> &'static str {
        "quiet_after_cancel"
    }

    fn check(&self, snapshot: &TraceSnapshot) -> InvariantResult {
        let mut cancelled = false;
        for (i, action) in snapshot.trace.iter().enumerate() {
            match action {
                HostAction::CancelTicks => cancelled = true,
                HostAction::ScheduleTicks { .. } => cancelled = false,
                other if cancelled && is_tick_driven(other) => {
                    return Err(violation(self.name(), i, format!("{other:?} after cancel")));
                },
                _ => {},
            }
        }
        Ok(())
    }
}

/// Account data is never stored while ticks are running, so teardown always
/// cancels ticks before saving.
pub struct StoreWhileStopped;

impl Invariant for StoreWhileStopped {
    fn name(&self) -> &'static str {
        "store_while_stopped"
    }

    fn check(&self, snapshot: &TraceSnapshot) -> InvariantResult {
        let mut ticking = false;
        for (i, action) in snapshot.trace.iter().enumerate() {
            match action {
                HostAction::ScheduleTicks { .. } => ticking = true,
                HostAction::CancelTicks => ticking = false,
                HostAction::StoreSetting { key: SettingKey::Messenger, .. } if ticking => {
                    return Err(violation(self.name(), i, "account data stored while ticking"));
                },
                _ => {},
            }
        }
        Ok(())
    }
}

/// `SetConnected` is announced once per connection: a second one needs a
/// `Connecting` progress report in between.
pub struct SingleConnectedBatch;

impl Invariant for SingleConnectedBatch {
    fn name(&self) -> &'static str {
        "single_connected_batch"
    }

    fn check(&self, snapshot: &TraceSnapshot) -> InvariantResult {
        let mut connected = false;
        for (i, action) in snapshot.trace.iter().enumerate() {
            match action {
                HostAction::SetConnected if connected => {
                    return Err(violation(self.name(), i, "connected twice"));
                },
                HostAction::SetConnected => connected = true,
                HostAction::Progress { step: 0, .. } | HostAction::CancelTicks => {
                    connected = false;
                },
                _ => {},
            }
        }
        Ok(())
    }
}

/// Contact status and alias updates only target contacts on the host's list.
pub struct StatusForListedContacts;

impl Invariant for StatusForListedContacts {
    fn name(&self) -> &'static str {
        "status_for_listed_contacts"
    }

    fn check(&self, snapshot: &TraceSnapshot) -> InvariantResult {
        let mut listed: BTreeSet<String> = snapshot.initial_contacts.iter().cloned().collect();
        for (i, action) in snapshot.trace.iter().enumerate() {
            match action {
                HostAction::AddContact { key, .. } => {
                    listed.insert(key.to_hex());
                },
                HostAction::RemoveContact { name } => {
                    listed.remove(name);
                },
                HostAction::RenameContact { from, to } => {
                    listed.remove(from);
                    listed.insert(to.to_hex());
                },
                HostAction::ContactStatus { key, .. } | HostAction::AliasContact { key, .. }
                    if !listed.contains(&key.to_hex()) =>
                {
                    return Err(violation(self.name(), i, format!("{key} is not listed")));
                },
                _ => {},
            }
        }
        Ok(())
    }
}

/// Progress reports stay within the two connection steps.
pub struct ProgressInRange;

impl Invariant for ProgressInRange {
    fn name(&self) -> &'static str {
        "progress_in_range"
    }

    fn check(&self, snapshot: &TraceSnapshot) -> InvariantResult {
        for (i, action) in snapshot.trace.iter().enumerate() {
            if let HostAction::Progress { step, total, .. } = action
                && (*total != PROGRESS_STEPS || step >= total)
            {
                return Err(violation(self.name(), i, format!("step {step} of {total}")));
            }
        }
        Ok(())
    }
}
