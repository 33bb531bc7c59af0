//! Tox adapter
//!
//! Connects an instant-messaging host to a Tox network core. The adapter owns
//! no sockets and no UI: the host feeds it commands and ticks, the core is
//! reached through the [`NetworkCore`] trait, and every effect on the host is
//! returned as a [`HostAction`].
//!
//! # Architecture
//!
//! - [`Dispatcher`]: account lifecycle (login, setup prompt, session, close)
//!   and command routing
//! - [`Session`]: one logged-in account; contact resolution, presence,
//!   messages, friend requests and the offline queue
//! - [`Connection`]: connecting/connected state driven by the connectivity
//!   tick
//! - [`FriendDirectory`]: host contacts mapped to core friend numbers
//! - [`FriendRequestInbox`]: pending friend requests with single-use tokens
//! - [`OfflineStore`]: messages held for contacts that are offline
//!
//! # Runtime
//!
//! [`Runtime`] drives a dispatcher on tokio: it owns the tick timers, reads
//! [`HostCommand`]s from a channel and hands actions to a [`Host`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod host;
pub mod message;
pub mod network;
pub mod offline;
pub mod requests;
pub mod runtime;
pub mod session;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

pub use connection::{Connection, ConnectionConfig, ConnectionState, Transition};
pub use directory::{FriendDirectory, Resolution};
pub use dispatcher::Dispatcher;
pub use error::AdapterError;
pub use event::{
    CoreEvent, Delivery, HostAction, HostCommand, NotifyLevel, SetupChoice,
};
pub use host::Host;
pub use message::{MessageKind, Outbound};
pub use network::{FriendNumber, NetworkCore};
pub use offline::{MAX_QUEUED_PER_CONTACT, OfflineMessage, OfflineStore};
pub use requests::{Decision, FriendRequestInbox, PendingRequest, RequestId};
pub use runtime::Runtime;
pub use session::Session;
pub use toxbridge_core::{Environment, PublicKey, ToxAddress};
