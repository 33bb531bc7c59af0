//! Headless toxbridge host.
//!
//! Runs one account through the adapter runtime against the simulated
//! network core, logging every host action and keeping the account settings
//! in a CBOR file between runs.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod log_host;
pub mod settings;

pub use log_host::LogHost;
pub use settings::{SettingsError, SettingsFile};
