//! Core codecs for the toxbridge adapter.
//!
//! Pure, stateless building blocks shared by the adapter and its simulation
//! harness. Nothing in this crate talks to the network core or the host.
//!
//! # Components
//!
//! - [`identity`]: public keys, friend addresses and their hex text form
//! - [`status`]: host presence <-> core user status + liveness
//! - [`account`]: account blob validation, base64 config form, file I/O
//! - [`config`]: per-account host settings
//! - [`env`]: clock abstraction for deterministic tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod account;
pub mod config;
pub mod env;
pub mod error;
pub mod identity;
pub mod status;

pub use account::{AccountBlob, AccountExport, MAX_ACCOUNT_DATA_SIZE, StoredAccount};
pub use config::{AccountConfig, BootstrapNode, SettingKey};
pub use env::{Environment, SystemEnv};
pub use error::{AccountError, FriendAddError, IdentityError};
pub use identity::{PublicKey, ToxAddress};
pub use status::{CorePresence, Presence, StatusType, StatusValue};
