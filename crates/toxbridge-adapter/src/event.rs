//! Events, commands and actions.
//!
//! The adapter is a pure state machine:
//!
//! - the host feeds it [`HostCommand`]s (user intents)
//! - the network core feeds it [`CoreEvent`]s (drained on the network tick)
//! - every host-visible effect comes back as a [`HostAction`] the caller
//!   executes

use std::{path::PathBuf, time::Duration};

use toxbridge_core::{CorePresence, PublicKey, SettingKey, StatusValue};

use crate::{
    network::FriendNumber,
    requests::{Decision, RequestId},
};

/// Activity reported by the network core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A friend connected or disconnected.
    FriendConnection {
        /// Friend whose liveness changed.
        friend: FriendNumber,
        /// New liveness.
        online: bool,
    },

    /// Someone who is not yet a friend sent a friend request.
    FriendRequest {
        /// Requester's public key.
        public_key: PublicKey,
        /// Request text as sent (may be empty).
        message: Vec<u8>,
    },

    /// Plain message from a friend.
    Message {
        /// Sender.
        friend: FriendNumber,
        /// Raw text, possibly NUL terminated.
        text: Vec<u8>,
    },

    /// Action ("/me") message from a friend.
    Action {
        /// Sender.
        friend: FriendNumber,
        /// Raw text without the "/me " prefix.
        text: Vec<u8>,
    },

    /// A friend changed their display name.
    NameChange {
        /// Friend.
        friend: FriendNumber,
        /// New name, possibly NUL terminated.
        name: Vec<u8>,
    },

    /// A friend changed their user status.
    StatusChange {
        /// Friend.
        friend: FriendNumber,
        /// New status.
        presence: CorePresence,
    },
}

/// Account setup choice at first login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupChoice {
    /// Start with a fresh identity.
    CreateNew,
    /// Import account data from a file the user picked.
    ImportFile(PathBuf),
    /// Import account data already in memory.
    ImportBytes(Vec<u8>),
}

/// User intents forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Answer to [`HostAction::RequestAccountSetup`].
    Setup(SetupChoice),

    /// Send an instant message.
    SendMessage {
        /// Contact name (public key hex).
        to: String,
        /// Message text, may contain host markup.
        text: String,
    },

    /// Change own status.
    SetStatus {
        /// Host status identifier, e.g. `tox_away`.
        status_id: String,
        /// Optional status message.
        message: Option<String>,
    },

    /// The user added a contact to the host's list.
    AddContact {
        /// Name as typed: a 76-character friend address.
        name: String,
        /// Optional invitation text for the friend request.
        invite: String,
    },

    /// The user removed a contact from the host's list.
    RemoveContact {
        /// Contact name (public key hex).
        name: String,
    },

    /// Answer to [`HostAction::RequestAuthorization`].
    Authorize {
        /// Request being answered.
        request: RequestId,
        /// The user's decision.
        decision: Decision,
    },

    /// Change own nickname.
    SetNickname(String),

    /// Show own friend address.
    ShowAccountId,

    /// Write account data to a file.
    ExportAccount {
        /// Destination path.
        path: PathBuf,
    },

    /// Log out.
    Close,
}

/// Severity of a host notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    /// Informational dialog.
    Info,
    /// Error dialog.
    Error,
}

/// Host-visible effects, executed by the caller in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    /// Update the connection progress indicator.
    Progress {
        /// Step label.
        text: &'static str,
        /// Current step.
        step: u32,
        /// Total steps.
        total: u32,
    },

    /// Mark the account as connected.
    SetConnected,

    /// Set the account's display name.
    SetDisplayName(String),

    /// Persist an account setting; `None` removes it.
    StoreSetting {
        /// Setting.
        key: SettingKey,
        /// New value.
        value: Option<String>,
    },

    /// Show a contact's status.
    ContactStatus {
        /// Contact.
        key: PublicKey,
        /// Status to show.
        status: StatusValue,
    },

    /// Deliver a received message.
    MessageReceived {
        /// Sender.
        from: PublicKey,
        /// Message text.
        text: String,
        /// Receipt time, seconds since the Unix epoch.
        timestamp: u64,
    },

    /// Set a contact's alias.
    AliasContact {
        /// Contact.
        key: PublicKey,
        /// Alias (never empty).
        alias: String,
    },

    /// Create a contact on the host's list.
    AddContact {
        /// Contact.
        key: PublicKey,
        /// Initial alias.
        alias: Option<String>,
    },

    /// Remove a contact from the host's list.
    RemoveContact {
        /// Contact name as the host knows it.
        name: String,
    },

    /// Rename a contact on the host's list.
    RenameContact {
        /// Current name.
        from: String,
        /// New name: the contact's public key.
        to: PublicKey,
    },

    /// Ask the user to accept or decline a friend request.
    RequestAuthorization {
        /// Token to answer with.
        request: RequestId,
        /// Requester.
        from: PublicKey,
        /// Dialog title.
        title: &'static str,
        /// Dialog question.
        prompt: String,
        /// Request text from the requester, if any.
        message: Option<String>,
    },

    /// Ask the user to create a new account or import one.
    RequestAccountSetup {
        /// Choice that starts with a fresh identity.
        create_label: &'static str,
        /// Choice that imports existing account data.
        import_label: &'static str,
    },

    /// Show a notification dialog.
    Notify {
        /// Severity.
        level: NotifyLevel,
        /// Dialog title.
        title: String,
        /// Main text.
        primary: String,
        /// Detail text.
        secondary: Option<String>,
    },

    /// Start calling the network and connectivity ticks.
    ScheduleTicks {
        /// Network tick period.
        network: Duration,
        /// Connectivity tick period.
        connectivity: Duration,
    },

    /// Stop both ticks.
    CancelTicks,
}

/// Label of the "new account" setup choice.
pub const CREATE_ACCOUNT_LABEL: &str = "Create new Tox account";

/// Label of the "import account" setup choice.
pub const IMPORT_ACCOUNT_LABEL: &str = "Import existing Tox account";

impl HostAction {
    /// Error notification.
    pub fn error(primary: impl Into<String>, secondary: Option<String>) -> Self {
        Self::Notify {
            level: NotifyLevel::Error,
            title: "Error".to_string(),
            primary: primary.into(),
            secondary,
        }
    }

    /// Informational notification.
    pub fn info(
        title: impl Into<String>,
        primary: impl Into<String>,
        secondary: Option<String>,
    ) -> Self {
        Self::Notify {
            level: NotifyLevel::Info,
            title: title.into(),
            primary: primary.into(),
            secondary,
        }
    }

    /// The account setup prompt.
    pub fn setup_prompt() -> Self {
        Self::RequestAccountSetup {
            create_label: CREATE_ACCOUNT_LABEL,
            import_label: IMPORT_ACCOUNT_LABEL,
        }
    }
}

/// Outcome of sending a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the network core.
    Sent,
    /// Contact is offline; held until they come online.
    Queued,
}
