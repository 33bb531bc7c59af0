//! Per-account configuration.
//!
//! Mirrors the settings the host keeps for a Tox account: the stored account
//! blob, the nickname and the bootstrap node. The bootstrap values are passed
//! through to the network core unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    account::StoredAccount,
    error::{AccountError, IdentityError},
    identity::PublicKey,
};

/// Default bootstrap node address.
pub const DEFAULT_BOOTSTRAP_ADDRESS: &str = "192.184.81.118";

/// Default bootstrap node port.
pub const DEFAULT_BOOTSTRAP_PORT: u16 = 33445;

/// Default bootstrap node public key.
pub const DEFAULT_BOOTSTRAP_KEY: &str =
    "5CD7EB176C19A2FD840406CD56177BB8E75587BB366F7BB3004B19E3EDC04143";

/// Node the network core contacts first to join the DHT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapNode {
    /// Host name or IP address.
    pub address: String,
    /// UDP port.
    pub port: u16,
    /// Node public key as hex text.
    pub key: String,
}

impl Default for BootstrapNode {
    fn default() -> Self {
        Self {
            address: DEFAULT_BOOTSTRAP_ADDRESS.to_string(),
            port: DEFAULT_BOOTSTRAP_PORT,
            key: DEFAULT_BOOTSTRAP_KEY.to_string(),
        }
    }
}

impl BootstrapNode {
    /// Node key parsed from its hex text.
    ///
    /// # Errors
    ///
    /// - `IdentityError::InvalidLength` if the key text is not 64 characters
    pub fn public_key(&self) -> Result<PublicKey, IdentityError> {
        PublicKey::parse(&self.key)
    }
}

/// Keys of the host settings the adapter writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Stored account blob (base64).
    Messenger,
    /// Own nickname.
    Nickname,
}

impl SettingKey {
    /// Host-side setting name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Messenger => "messenger",
            Self::Nickname => "nickname",
        }
    }
}

/// Host settings for one account.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Stored account blob: `None` before first setup, `Some("")` for the
    /// explicit empty marker.
    pub messenger: Option<String>,
    /// Own nickname; empty counts as unset.
    pub nickname: Option<String>,
    /// Bootstrap node.
    pub bootstrap: BootstrapNode,
}

impl AccountConfig {
    /// Configured nickname, if non-empty.
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref().filter(|n| !n.is_empty())
    }

    /// Interpret the stored account setting.
    ///
    /// # Errors
    ///
    /// Errors from [`StoredAccount::from_config`].
    pub fn stored_account(&self) -> Result<StoredAccount, AccountError> {
        StoredAccount::from_config(self.messenger.as_deref())
    }

    /// Apply a setting write coming from the adapter.
    pub fn apply(&mut self, key: SettingKey, value: Option<String>) {
        match key {
            SettingKey::Messenger => self.messenger = value,
            SettingKey::Nickname => self.nickname = value,
        }
    }
}

// The stored blob contains secret keys.
impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("messenger", &self.messenger.as_ref().map(|m| format!("<{} chars>", m.len())))
            .field("nickname", &self.nickname)
            .field("bootstrap", &self.bootstrap)
            .finish()
    }
}
