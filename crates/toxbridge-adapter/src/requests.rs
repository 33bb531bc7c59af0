//! Inbound friend requests awaiting a user decision.
//!
//! Each request gets a single-use [`RequestId`]. Taking a request out of the
//! inbox consumes the token, so a second answer finds nothing and does
//! nothing. Undecided requests are dropped with the session.

use std::{collections::HashMap, fmt};

use toxbridge_core::PublicKey;

/// Title of the friend request prompt.
pub const FRIEND_REQUEST_TITLE: &str = "New friend request";

/// Token identifying a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-{}", self.0)
    }
}

/// The user's answer to a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Add the requester as a friend.
    Accept,
    /// Discard the request.
    Decline,
}

/// A friend request waiting for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Token.
    pub id: RequestId,
    /// Requester.
    pub from: PublicKey,
    /// Request text, if the requester sent any.
    pub message: Option<String>,
}

impl PendingRequest {
    /// Question shown to the user.
    pub fn prompt(&self) -> String {
        format!(
            "The user {} has sent you a friend request, do you want to add them?",
            self.from
        )
    }
}

/// Pending requests keyed by token.
#[derive(Debug, Default)]
pub struct FriendRequestInbox {
    next_id: u64,
    pending: HashMap<RequestId, PendingRequest>,
}

impl FriendRequestInbox {
    /// Empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of undecided requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns true if a request from `key` is still undecided.
    pub fn is_pending_from(&self, key: &PublicKey) -> bool {
        self.pending.values().any(|r| r.from == *key)
    }

    /// File a new request and return it.
    pub fn receive(&mut self, from: PublicKey, message: Option<String>) -> PendingRequest {
        let id = RequestId(self.next_id);
        self.next_id += 1;

        let request = PendingRequest { id, from, message };
        self.pending.insert(id, request.clone());
        request
    }

    /// Consume a request. Returns `None` if it was already decided.
    pub fn take(&mut self, id: RequestId) -> Option<PendingRequest> {
        self.pending.remove(&id)
    }
}
