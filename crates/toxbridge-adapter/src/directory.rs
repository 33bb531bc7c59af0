//! Friend directory.
//!
//! Maps the host's contacts (durable public keys) to the network core's
//! session-scoped friend numbers. Both directions are indexed so inbound
//! events can be matched by friend number and outbound calls by key.
//!
//! # Resolution
//!
//! An entry starts [`Resolution::Unresolved`] and is looked up in the core on
//! first touch. A failed lookup is cached as [`Resolution::NotFound`] until
//! the directory next changes, so a contact missing from the core does not
//! cost a lookup per call.

use std::collections::HashMap;

use toxbridge_core::{FriendAddError, PublicKey, ToxAddress};

use crate::{
    error::AdapterError,
    network::{FriendNumber, NetworkCore},
};

/// Request text used when the user leaves the invitation empty.
pub const DEFAULT_REQUEST_MESSAGE: &str = "Please allow me to add you as a friend!";

/// Lookup state of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Not looked up in this session yet.
    Unresolved,
    /// Known friend number.
    Resolved(FriendNumber),
    /// The core had no friend for this key at last lookup.
    NotFound,
}

/// How to add a friend to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTarget<'a> {
    /// Send a friend request to a full address.
    Request {
        /// Address to send to.
        address: &'a ToxAddress,
        /// Request text; empty selects [`DEFAULT_REQUEST_MESSAGE`].
        message: &'a str,
    },
    /// Add silently, used when accepting someone else's request.
    NoRequest(&'a PublicKey),
}

impl AddTarget<'_> {
    fn public_key(&self) -> PublicKey {
        match self {
            Self::Request { address, .. } => address.public_key(),
            Self::NoRequest(key) => **key,
        }
    }
}

/// Bidirectional contact index.
#[derive(Debug, Default)]
pub struct FriendDirectory {
    by_key: HashMap<PublicKey, Resolution>,
    by_number: HashMap<FriendNumber, PublicKey>,
}

impl FriendDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of contacts.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Returns true if there are no contacts.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Returns true if the key is a contact.
    pub fn contains(&self, key: &PublicKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Lookup state of a contact.
    pub fn resolution(&self, key: &PublicKey) -> Option<Resolution> {
        self.by_key.get(key).copied()
    }

    /// Contact bound to a friend number.
    pub fn key_for(&self, friend: FriendNumber) -> Option<PublicKey> {
        self.by_number.get(&friend).copied()
    }

    /// All contacts, in key order.
    pub fn keys(&self) -> Vec<PublicKey> {
        let mut keys: Vec<PublicKey> = self.by_key.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Register a contact the host already has. Returns false if it was
    /// already present.
    pub fn track(&mut self, key: PublicKey) -> bool {
        if self.by_key.contains_key(&key) {
            return false;
        }
        self.by_key.insert(key, Resolution::Unresolved);
        self.forget_misses();
        true
    }

    /// Record that `key` is friend number `friend` in the core.
    ///
    /// Any other key previously bound to the same number is unbound.
    pub fn bind(&mut self, key: PublicKey, friend: FriendNumber) {
        self.link(key, friend);
        self.forget_misses();
    }

    fn link(&mut self, key: PublicKey, friend: FriendNumber) {
        if let Some(Resolution::Resolved(old)) = self.by_key.get(&key).copied()
            && old != friend
        {
            self.by_number.remove(&old);
        }
        if let Some(previous) = self.by_number.insert(friend, key)
            && previous != key
        {
            self.by_key.insert(previous, Resolution::Unresolved);
        }
        self.by_key.insert(key, Resolution::Resolved(friend));
    }

    /// Friend number for a contact, asking the core on first touch.
    ///
    /// # Errors
    ///
    /// - `AdapterError::UnknownContact` if the key is not a contact
    /// - `AdapterError::UnresolvedContact` if the core has no friend for it
    pub fn resolve<C: NetworkCore>(
        &mut self,
        core: &C,
        key: &PublicKey,
    ) -> Result<FriendNumber, AdapterError> {
        match self.by_key.get(key).copied() {
            None => Err(AdapterError::UnknownContact(key.to_hex())),
            Some(Resolution::Resolved(friend)) => Ok(friend),
            Some(Resolution::NotFound) => Err(AdapterError::UnresolvedContact(*key)),
            Some(Resolution::Unresolved) => match core.friend_by_public_key(key) {
                Some(friend) => {
                    tracing::debug!(%key, %friend, "resolved contact");
                    self.link(*key, friend);
                    Ok(friend)
                },
                None => {
                    tracing::debug!(%key, "contact not on core friend list");
                    self.by_key.insert(*key, Resolution::NotFound);
                    Err(AdapterError::UnresolvedContact(*key))
                },
            },
        }
    }

    /// Add a friend to the core and bind the result.
    ///
    /// On error the directory is unchanged.
    ///
    /// # Errors
    ///
    /// The core's refusal reason.
    pub fn add<C: NetworkCore>(
        &mut self,
        core: &mut C,
        target: AddTarget<'_>,
    ) -> Result<FriendNumber, FriendAddError> {
        let key = target.public_key();
        let friend = match target {
            AddTarget::Request { address, message } => {
                let message =
                    if message.trim().is_empty() { DEFAULT_REQUEST_MESSAGE } else { message };
                core.add_friend(address, message)?
            },
            AddTarget::NoRequest(key) => core.add_friend_norequest(key)?,
        };

        tracing::info!(%key, %friend, "friend added");
        self.bind(key, friend);
        Ok(friend)
    }

    /// Remove a contact, deleting it from the core if it was resolved.
    ///
    /// Returns false if the key was not a contact.
    pub fn remove<C: NetworkCore>(&mut self, core: &mut C, key: &PublicKey) -> bool {
        let Some(resolution) = self.by_key.remove(key) else {
            return false;
        };

        if let Resolution::Resolved(friend) = resolution {
            self.by_number.remove(&friend);
            if !core.delete_friend(friend) {
                tracing::warn!(%key, %friend, "core did not know friend being removed");
            }
        }

        self.forget_misses();
        true
    }

    fn forget_misses(&mut self) {
        for resolution in self.by_key.values_mut() {
            if *resolution == Resolution::NotFound {
                *resolution = Resolution::Unresolved;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeCore, address, key};

    #[test]
    fn resolve_caches_hits() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(1), true);
        let mut dir = FriendDirectory::new();
        dir.track(key(1));

        assert_eq!(dir.resolve(&core, &key(1)), Ok(friend));
        assert_eq!(dir.resolve(&core, &key(1)), Ok(friend));
        assert_eq!(core.lookups.get(), 1);
        assert_eq!(dir.key_for(friend), Some(key(1)));
    }

    #[test]
    fn not_found_is_cached_until_mutation() {
        let core = FakeCore::default();
        let mut dir = FriendDirectory::new();
        dir.track(key(1));

        assert_eq!(dir.resolve(&core, &key(1)), Err(AdapterError::UnresolvedContact(key(1))));
        assert_eq!(dir.resolve(&core, &key(1)), Err(AdapterError::UnresolvedContact(key(1))));
        assert_eq!(core.lookups.get(), 1);

        dir.track(key(2));
        assert_eq!(dir.resolution(&key(1)), Some(Resolution::Unresolved));
        let _ = dir.resolve(&core, &key(1));
        assert_eq!(core.lookups.get(), 2);
    }

    #[test]
    fn unknown_key_never_reaches_core() {
        let core = FakeCore::default();
        let mut dir = FriendDirectory::new();
        assert!(matches!(dir.resolve(&core, &key(9)), Err(AdapterError::UnknownContact(_))));
        assert_eq!(core.lookups.get(), 0);
    }

    #[test]
    fn failed_add_leaves_directory_untouched() {
        let mut core =
            FakeCore { add_error: Some(FriendAddError::BadChecksum), ..Default::default() };
        let mut dir = FriendDirectory::new();
        let addr = address(3);

        let result = dir.add(&mut core, AddTarget::Request { address: &addr, message: "" });
        assert_eq!(result, Err(FriendAddError::BadChecksum));
        assert!(dir.is_empty());
    }

    #[test]
    fn adding_twice_keeps_one_entry() {
        let mut core = FakeCore::default();
        let mut dir = FriendDirectory::new();
        let k = key(4);

        let first = dir.add(&mut core, AddTarget::NoRequest(&k)).unwrap();
        assert_eq!(dir.add(&mut core, AddTarget::NoRequest(&k)), Err(FriendAddError::AlreadySent));
        dir.track(k);

        assert_eq!(dir.len(), 1);
        assert_eq!(dir.resolution(&k), Some(Resolution::Resolved(first)));
    }

    #[test]
    fn remove_deletes_resolved_friend_from_core() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(5), false);
        let mut dir = FriendDirectory::new();
        dir.track(key(5));
        dir.resolve(&core, &key(5)).unwrap();

        assert!(dir.remove(&mut core, &key(5)));
        assert_eq!(core.deleted, vec![friend]);
        assert_eq!(dir.key_for(friend), None);
        assert!(!dir.remove(&mut core, &key(5)));
    }

    #[test]
    fn remove_unresolved_skips_core() {
        let mut core = FakeCore::default();
        let mut dir = FriendDirectory::new();
        dir.track(key(6));

        assert!(dir.remove(&mut core, &key(6)));
        assert!(core.deleted.is_empty());
    }

    #[test]
    fn rebinding_a_number_unbinds_previous_key() {
        let mut dir = FriendDirectory::new();
        dir.bind(key(1), FriendNumber(0));
        dir.bind(key(2), FriendNumber(0));

        assert_eq!(dir.key_for(FriendNumber(0)), Some(key(2)));
        assert_eq!(dir.resolution(&key(1)), Some(Resolution::Unresolved));
    }

    #[test]
    fn resolving_a_reused_number_unbinds_stale_key() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(2), true);
        let mut dir = FriendDirectory::new();
        dir.bind(key(1), friend);
        dir.track(key(2));

        assert_eq!(dir.resolve(&core, &key(2)), Ok(friend));
        assert_eq!(dir.key_for(friend), Some(key(2)));
        assert_eq!(dir.resolution(&key(1)), Some(Resolution::Unresolved));
    }

    #[test]
    fn resolving_keeps_other_misses_cached() {
        let mut core = FakeCore::default();
        core.with_friend(key(2), true);
        let mut dir = FriendDirectory::new();
        dir.track(key(1));
        dir.track(key(2));

        let _ = dir.resolve(&core, &key(1));
        dir.resolve(&core, &key(2)).unwrap();
        assert_eq!(dir.resolution(&key(1)), Some(Resolution::NotFound));
    }
}
