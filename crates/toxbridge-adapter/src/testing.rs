//! In-crate fake network core for unit tests.

use std::cell::Cell;

use toxbridge_core::{
    AccountError, BootstrapNode, CorePresence, FriendAddError, PublicKey, ToxAddress,
};

use crate::{
    event::CoreEvent,
    network::{FriendNumber, NetworkCore},
};

pub(crate) fn key(n: u8) -> PublicKey {
    PublicKey::from_bytes([n; 32])
}

pub(crate) fn address(n: u8) -> ToxAddress {
    ToxAddress::from_parts(key(n), [0, 0, 0, n])
}

#[derive(Debug, Clone)]
pub(crate) struct FakeFriend {
    pub key: PublicKey,
    pub online: bool,
    pub presence: CorePresence,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SentMessage {
    pub friend: FriendNumber,
    pub action: bool,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeCore {
    pub dht: bool,
    pub friends: Vec<Option<FakeFriend>>,
    pub events: Vec<CoreEvent>,
    pub self_name: Option<String>,
    pub presence: CorePresence,
    pub status_message: Option<String>,
    pub sent: Vec<SentMessage>,
    pub request_adds: usize,
    pub quiet_adds: usize,
    pub deleted: Vec<FriendNumber>,
    pub lookups: Cell<usize>,
    pub add_error: Option<FriendAddError>,
    pub refuse_sends: bool,
    pub state: Vec<u8>,
    pub bootstraps: usize,
}

impl FakeCore {
    pub fn with_friend(&mut self, key: PublicKey, online: bool) -> FriendNumber {
        self.friends.push(Some(FakeFriend {
            key,
            online,
            presence: CorePresence::None,
            name: None,
        }));
        FriendNumber(self.friends.len() as u32 - 1)
    }

    pub fn friend_mut(&mut self, friend: FriendNumber) -> &mut FakeFriend {
        self.friends[friend.0 as usize].as_mut().unwrap()
    }

    fn friend(&self, friend: FriendNumber) -> Option<&FakeFriend> {
        self.friends.get(friend.0 as usize).and_then(Option::as_ref)
    }

    fn position(&self, key: &PublicKey) -> Option<FriendNumber> {
        self.friends
            .iter()
            .position(|f| f.as_ref().is_some_and(|f| f.key == *key))
            .map(|i| FriendNumber(i as u32))
    }

    fn insert(&mut self, key: PublicKey) -> Result<FriendNumber, FriendAddError> {
        if let Some(err) = self.add_error {
            return Err(err);
        }
        if self.position(&key).is_some() {
            return Err(FriendAddError::AlreadySent);
        }
        Ok(self.with_friend(key, false))
    }
}

impl NetworkCore for FakeCore {
    fn is_dht_connected(&self) -> bool {
        self.dht
    }

    fn iterate(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    fn bootstrap(&mut self, _node: &BootstrapNode) -> bool {
        self.bootstraps += 1;
        true
    }

    fn self_address(&self) -> ToxAddress {
        address(0xee)
    }

    fn self_name(&self) -> Option<String> {
        self.self_name.clone()
    }

    fn set_self_name(&mut self, name: &str) -> bool {
        self.self_name = Some(name.to_string());
        true
    }

    fn set_presence(&mut self, presence: CorePresence) {
        self.presence = presence;
    }

    fn set_status_message(&mut self, message: &str) -> bool {
        self.status_message = Some(message.to_string());
        true
    }

    fn friend_by_public_key(&self, key: &PublicKey) -> Option<FriendNumber> {
        self.lookups.set(self.lookups.get() + 1);
        self.position(key)
    }

    fn public_key_of(&self, friend: FriendNumber) -> Option<PublicKey> {
        self.friend(friend).map(|f| f.key)
    }

    fn add_friend(
        &mut self,
        address: &ToxAddress,
        _message: &str,
    ) -> Result<FriendNumber, FriendAddError> {
        self.request_adds += 1;
        self.insert(address.public_key())
    }

    fn add_friend_norequest(&mut self, key: &PublicKey) -> Result<FriendNumber, FriendAddError> {
        self.quiet_adds += 1;
        self.insert(*key)
    }

    fn delete_friend(&mut self, friend: FriendNumber) -> bool {
        self.deleted.push(friend);
        match self.friends.get_mut(friend.0 as usize) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    fn friend_presence(&self, friend: FriendNumber) -> CorePresence {
        self.friend(friend).map(|f| f.presence).unwrap_or_default()
    }

    fn friend_is_online(&self, friend: FriendNumber) -> bool {
        self.friend(friend).is_some_and(|f| f.online)
    }

    fn friend_name(&self, friend: FriendNumber) -> Option<String> {
        self.friend(friend).and_then(|f| f.name.clone())
    }

    fn send_message(&mut self, friend: FriendNumber, payload: &[u8]) -> bool {
        if self.refuse_sends {
            return false;
        }
        self.sent.push(SentMessage { friend, action: false, payload: payload.to_vec() });
        true
    }

    fn send_action(&mut self, friend: FriendNumber, payload: &[u8]) -> bool {
        if self.refuse_sends {
            return false;
        }
        self.sent.push(SentMessage { friend, action: true, payload: payload.to_vec() });
        true
    }

    fn save_size(&self) -> usize {
        self.state.len()
    }

    fn save(&self, buffer: &mut [u8]) {
        buffer.copy_from_slice(&self.state);
    }

    fn load(&mut self, data: &[u8]) -> Result<(), AccountError> {
        if data.starts_with(b"bad") {
            return Err(AccountError::Rejected);
        }
        self.state = data.to_vec();
        Ok(())
    }
}
