//! Network core interface.
//!
//! The adapter never touches transport or crypto. It drives a [`NetworkCore`]
//! that owns the DHT, the friend list and message delivery, and it drains the
//! core's asynchronous activity as [`CoreEvent`]s once per network tick.
//!
//! Friend numbers are the core's own indices. They are only meaningful for the
//! lifetime of one core instance; public keys are the durable identity.

use std::fmt;

use toxbridge_core::{
    AccountError, BootstrapNode, CorePresence, FriendAddError, PublicKey, ToxAddress,
};

use crate::event::CoreEvent;

/// Index of a friend in the network core's friend list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FriendNumber(pub u32);

impl fmt::Display for FriendNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operations the adapter needs from the network core.
///
/// The adapter owns the core exclusively; all calls happen from the
/// dispatcher's single thread of control.
pub trait NetworkCore {
    /// Returns true while the core has a working DHT connection.
    fn is_dht_connected(&self) -> bool;

    /// Run one iteration of the core and collect what happened, in order.
    fn iterate(&mut self) -> Vec<CoreEvent>;

    /// Join the network through a bootstrap node. Returns false if the node
    /// could not be used.
    fn bootstrap(&mut self, node: &BootstrapNode) -> bool;

    /// Own friend address, handed out so others can add us.
    fn self_address(&self) -> ToxAddress;

    /// Own display name, if one is set.
    fn self_name(&self) -> Option<String>;

    /// Set own display name. Returns false if the core refused it.
    fn set_self_name(&mut self, name: &str) -> bool;

    /// Set own user status.
    fn set_presence(&mut self, presence: CorePresence);

    /// Set own status message. Returns false if the core refused it.
    fn set_status_message(&mut self, message: &str) -> bool;

    /// Friend number for a public key, if it is on the friend list.
    fn friend_by_public_key(&self, key: &PublicKey) -> Option<FriendNumber>;

    /// Public key of a friend number.
    fn public_key_of(&self, friend: FriendNumber) -> Option<PublicKey>;

    /// Add a friend and send them a friend request.
    ///
    /// # Errors
    ///
    /// The core's refusal reason.
    fn add_friend(
        &mut self,
        address: &ToxAddress,
        message: &str,
    ) -> Result<FriendNumber, FriendAddError>;

    /// Add a friend without sending a request (accepting theirs).
    ///
    /// # Errors
    ///
    /// The core's refusal reason.
    fn add_friend_norequest(&mut self, key: &PublicKey) -> Result<FriendNumber, FriendAddError>;

    /// Remove a friend. Returns false if the number was not in use.
    fn delete_friend(&mut self, friend: FriendNumber) -> bool;

    /// Last status the friend announced.
    fn friend_presence(&self, friend: FriendNumber) -> CorePresence;

    /// Returns true if the friend is currently connected.
    fn friend_is_online(&self, friend: FriendNumber) -> bool;

    /// Display name the friend announced, if any.
    fn friend_name(&self, friend: FriendNumber) -> Option<String>;

    /// Queue a plain message. Payload includes the trailing NUL.
    fn send_message(&mut self, friend: FriendNumber, payload: &[u8]) -> bool;

    /// Queue an action ("/me") message. Payload includes the trailing NUL.
    fn send_action(&mut self, friend: FriendNumber, payload: &[u8]) -> bool;

    /// Size of the serialized account state. Zero means nothing to save.
    fn save_size(&self) -> usize;

    /// Serialize account state into a buffer of exactly [`Self::save_size`]
    /// bytes.
    fn save(&self, buffer: &mut [u8]);

    /// Replace account state from serialized data.
    ///
    /// On error the core is left as it was.
    ///
    /// # Errors
    ///
    /// `AccountError::Rejected` if the data cannot be loaded.
    fn load(&mut self, data: &[u8]) -> Result<(), AccountError>;
}
