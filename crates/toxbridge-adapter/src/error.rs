//! Adapter error types.

use thiserror::Error;
use toxbridge_core::{AccountError, FriendAddError, IdentityError, PublicKey};

/// Errors produced by adapter operations.
///
/// None of these are fatal. The dispatcher turns the user-visible ones into
/// [`crate::HostAction::Notify`] and logs the rest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Identity text has the wrong length or shape.
    #[error(transparent)]
    InvalidIdentityFormat(#[from] IdentityError),

    /// The network core refused to add a friend.
    #[error(transparent)]
    FriendAddRejected(#[from] FriendAddError),

    /// Contact is not in the friend directory.
    #[error("unknown contact: {0}")]
    UnknownContact(String),

    /// Contact is in the directory but the network core has no friend for it.
    #[error("contact {0} is not on the network friend list")]
    UnresolvedContact(PublicKey),

    /// Host status identifier outside the status table.
    #[error("unknown status: {0}")]
    UnknownStatus(String),

    /// Account data is empty, oversized, badly encoded or refused by the core.
    #[error("invalid account data: {0}")]
    CorruptAccountData(AccountError),

    /// File system failure while moving account data.
    #[error("{context}: {reason}")]
    Io {
        /// Which step failed.
        context: &'static str,
        /// Platform error string.
        reason: String,
    },

    /// The network core refused to queue an outgoing message.
    #[error("failed to send message to {0}")]
    SendFailed(PublicKey),

    /// Operation needs a logged-in session.
    #[error("no active session")]
    NoSession,
}

impl From<AccountError> for AdapterError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Io { context, reason } => Self::Io { context, reason },
            other => Self::CorruptAccountData(other),
        }
    }
}

impl AdapterError {
    /// Returns true if the user should be told about this error.
    ///
    /// Unknown status identifiers and calls without a session are host
    /// programming errors, and a contact the core has no friend for is a
    /// no-op; these are logged only.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::UnknownStatus(_) | Self::NoSession | Self::UnresolvedContact(_))
    }
}
