//! Messages held for contacts that are offline.
//!
//! The store is an owned value inside the session. Messages are kept per
//! contact in the order the host sent them and handed back in that order
//! when the contact comes online. Each queue holds at most
//! [`MAX_QUEUED_PER_CONTACT`] messages; the oldest is dropped to make room.

use std::collections::{HashMap, VecDeque};

use toxbridge_core::PublicKey;

use crate::message::Outbound;

/// Messages kept per offline contact.
pub const MAX_QUEUED_PER_CONTACT: usize = 256;

/// A message waiting for its recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineMessage {
    /// Prepared message.
    pub message: Outbound,
    /// When the host handed it over, seconds since the Unix epoch.
    pub queued_at: u64,
}

/// Per-contact FIFO queues.
#[derive(Debug, Default)]
pub struct OfflineStore {
    queues: HashMap<PublicKey, VecDeque<OfflineMessage>>,
}

impl OfflineStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message for `key`. Returns the oldest message if it had to
    /// be dropped to stay within [`MAX_QUEUED_PER_CONTACT`].
    pub fn queue(&mut self, key: PublicKey, message: OfflineMessage) -> Option<OfflineMessage> {
        let queue = self.queues.entry(key).or_default();
        queue.push_back(message);
        if queue.len() > MAX_QUEUED_PER_CONTACT { queue.pop_front() } else { None }
    }

    /// Number of messages waiting for `key`.
    pub fn pending(&self, key: &PublicKey) -> usize {
        self.queues.get(key).map_or(0, VecDeque::len)
    }

    /// Number of messages waiting for anyone.
    pub fn total(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Remove and return everything waiting for `key`, oldest first.
    pub fn drain(&mut self, key: &PublicKey) -> VecDeque<OfflineMessage> {
        self.queues.remove(key).unwrap_or_default()
    }

    /// Put undelivered messages back in front of anything queued since.
    pub fn restore(&mut self, key: PublicKey, mut messages: VecDeque<OfflineMessage>) {
        if messages.is_empty() {
            return;
        }
        if let Some(newer) = self.queues.remove(&key) {
            messages.extend(newer);
        }
        self.queues.insert(key, messages);
    }

    /// Drop everything waiting for `key`. Returns the number dropped.
    pub fn discard(&mut self, key: &PublicKey) -> usize {
        self.queues.remove(key).map_or(0, |q| q.len())
    }
}
