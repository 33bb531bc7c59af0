//! Error types for the toxbridge core codecs.
//!
//! Strongly-typed errors for each concern: identity text that cannot become a
//! key, friend additions the network core refused, and account data that is
//! unusable. The adapter layer wraps these into its own error type and decides
//! which of them the user gets to see.

use std::io;

use thiserror::Error;

/// Errors produced while turning identity text into binary keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Identity text has the wrong number of hex characters.
    #[error("invalid identity: expected {expected} hex characters, got {actual}")]
    InvalidLength {
        /// Required number of characters.
        expected: usize,
        /// Number of characters supplied (after trimming whitespace).
        actual: usize,
    },

    /// Hex text cannot be split into whole bytes.
    #[error("invalid identity: odd number of hex characters ({0})")]
    OddLength(usize),
}

/// Reasons the network core gives for refusing to add a friend.
///
/// Each variant carries its own user-facing message. None of them are retried
/// automatically.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FriendAddError {
    /// Friend request message exceeds the core's limit.
    #[error("Message too long")]
    TooLong,

    /// A friend request was attempted without any message.
    #[error("Missing request message")]
    NoMessage,

    /// The address is our own.
    #[error("You're trying to add yourself as a friend")]
    OwnKey,

    /// A request to this address is already pending.
    #[error("Friend request already sent")]
    AlreadySent,

    /// Address checksum does not match its key and nospam.
    #[error("Can't add friend: bad checksum in ID")]
    BadChecksum,

    /// Known friend, but with a different nospam value.
    #[error("Can't add friend: wrong nospam ID")]
    SetNewNospam,

    /// The core ran out of memory growing its friend list.
    #[error("Could not allocate memory for friendlist")]
    NoMem,

    /// Any other refusal.
    #[error("Error adding friend")]
    Unknown,
}

impl FriendAddError {
    /// Returns true if the friend ends up on the core's list despite the error.
    ///
    /// An already-sent request keeps the contact; every other refusal means the
    /// host's contact entry has no counterpart in the core.
    pub fn keeps_contact(&self) -> bool {
        matches!(self, Self::AlreadySent)
    }
}

/// Phase of an account file operation, used as the primary error text.
pub const ACCESS_FAILED: &str = "Could not access account data file";
/// Opening an account file failed.
pub const OPEN_FAILED: &str = "Could not open account data file";
/// Reading an account file failed or came up short.
pub const READ_FAILED: &str = "Could not read account data file";
/// Writing an account file failed.
pub const SAVE_FAILED: &str = "Could not save account data file";

/// Errors for account blob validation, encoding and file transfer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Zero-length account data.
    #[error("account data is empty")]
    Empty,

    /// Account data above [`crate::account::MAX_ACCOUNT_DATA_SIZE`].
    #[error("account data is {size} bytes, limit is {max}")]
    TooLarge {
        /// Size that was offered.
        size: u64,
        /// Maximum accepted size.
        max: usize,
    },

    /// Stored config text is not valid base64.
    #[error("account data is not valid base64: {0}")]
    Encoding(String),

    /// The network core refused to load the account data.
    #[error("account data was rejected by the network core")]
    Rejected,

    /// File system failure, with the platform error string.
    #[error("{context}: {reason}")]
    Io {
        /// Which step failed.
        context: &'static str,
        /// Platform error string.
        reason: String,
    },
}

impl AccountError {
    /// Build an I/O error for the given step.
    pub fn io(context: &'static str, err: &io::Error) -> Self {
        Self::Io { context, reason: err.to_string() }
    }
}
