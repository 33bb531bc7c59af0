//! Scriptable in-memory network core.
//!
//! [`SimCore`] behaves like the real core where the adapter can observe it:
//! friend request validation order, friend number reuse, liveness, and a
//! save format that rejects anything it did not write. Peer activity is
//! scripted by the test and surfaces on the next `iterate`.

use std::collections::VecDeque;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use toxbridge_adapter::{CoreEvent, FriendNumber, NetworkCore};
use toxbridge_core::{
    AccountError, BootstrapNode, CorePresence, FriendAddError, PublicKey, ToxAddress,
    identity::{ADDRESS_SIZE, NOSPAM_SIZE, PUBLIC_KEY_SIZE},
};

/// Longest friend request message the core accepts, in bytes.
pub const MAX_FRIEND_REQUEST_LEN: usize = 1016;

/// Longest display name the core accepts, in bytes.
pub const MAX_NAME_LEN: usize = 128;

const SAVE_MAGIC: &[u8; 6] = b"TBSIM\x01";

#[derive(Debug, Clone)]
struct SimFriend {
    key: PublicKey,
    nospam: Option<[u8; NOSPAM_SIZE]>,
    online: bool,
    presence: CorePresence,
    name: Option<String>,
}

/// A message the adapter handed to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Recipient.
    pub to: PublicKey,
    /// Sent as an action.
    pub action: bool,
    /// Payload as passed, including the trailing NUL.
    pub payload: Vec<u8>,
}

impl SentMessage {
    /// Payload text without the trailing NUL.
    pub fn text(&self) -> String {
        let end = self.payload.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.payload[..end]).into_owned()
    }
}

/// Counts of core calls that matter to tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLog {
    /// `bootstrap` calls.
    pub bootstraps: usize,
    /// `add_friend` calls (with a friend request).
    pub request_adds: usize,
    /// `add_friend_norequest` calls.
    pub quiet_adds: usize,
    /// `delete_friend` calls.
    pub deletes: usize,
    /// Successful `load` calls.
    pub loads: usize,
}

/// Deterministic network core.
#[derive(Debug)]
pub struct SimCore {
    rng: ChaCha8Rng,
    address: ToxAddress,
    stateless: bool,
    dht: bool,
    refuse_sends: bool,
    name: Option<String>,
    presence: CorePresence,
    status_message: String,
    friends: Vec<Option<SimFriend>>,
    events: VecDeque<CoreEvent>,
    sent: Vec<SentMessage>,
    calls: CallLog,
}

impl SimCore {
    /// Core with an identity derived from `seed`.
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let address = random_address(&mut rng);
        Self {
            rng,
            address,
            stateless: false,
            dht: false,
            refuse_sends: false,
            name: None,
            presence: CorePresence::None,
            status_message: String::new(),
            friends: Vec::new(),
            events: VecDeque::new(),
            sent: Vec::new(),
            calls: CallLog::default(),
        }
    }

    /// Core that reports nothing to save.
    pub fn stateless(seed: u64) -> Self {
        Self { stateless: true, ..Self::new(seed) }
    }

    /// A fresh peer address from the core's RNG.
    pub fn new_peer(&mut self) -> ToxAddress {
        random_address(&mut self.rng)
    }

    /// Control DHT connectivity.
    pub fn set_dht(&mut self, connected: bool) {
        self.dht = connected;
    }

    /// Make every send fail.
    pub fn refuse_sends(&mut self, refuse: bool) {
        self.refuse_sends = refuse;
    }

    /// Messages handed to the core so far.
    pub fn sent(&self) -> &[SentMessage] {
        &self.sent
    }

    /// Call counters.
    pub fn calls(&self) -> CallLog {
        self.calls
    }

    /// Own display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Own user status.
    pub fn presence(&self) -> CorePresence {
        self.presence
    }

    /// Own status message.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Keys on the friend list, in friend number order.
    pub fn friend_keys(&self) -> Vec<PublicKey> {
        self.friends.iter().flatten().map(|f| f.key).collect()
    }

    /// Returns true if `key` is on the friend list.
    pub fn is_friend(&self, key: &PublicKey) -> bool {
        self.number_of(key).is_some()
    }

    /// Put `key` on the friend list directly, as a previous session would have.
    pub fn befriend(&mut self, key: PublicKey) -> FriendNumber {
        self.number_of(&key).unwrap_or_else(|| self.insert(key, None))
    }

    /// Change a friend's liveness and report it. Returns false for strangers.
    pub fn set_online(&mut self, key: &PublicKey, online: bool) -> bool {
        let Some(friend) = self.number_of(key) else {
            return false;
        };
        if let Some(entry) = self.entry_mut(friend) {
            entry.online = online;
        }
        self.events.push_back(CoreEvent::FriendConnection { friend, online });
        true
    }

    /// Change a friend's user status and report it.
    pub fn set_friend_presence(&mut self, key: &PublicKey, presence: CorePresence) -> bool {
        let Some(friend) = self.number_of(key) else {
            return false;
        };
        if let Some(entry) = self.entry_mut(friend) {
            entry.presence = presence;
        }
        self.events.push_back(CoreEvent::StatusChange { friend, presence });
        true
    }

    /// Change a friend's display name and report it.
    pub fn rename_friend(&mut self, key: &PublicKey, name: &str) -> bool {
        let Some(friend) = self.number_of(key) else {
            return false;
        };
        if let Some(entry) = self.entry_mut(friend) {
            entry.name = Some(name.to_string());
        }
        self.events.push_back(CoreEvent::NameChange { friend, name: nul_terminated(name) });
        true
    }

    /// Deliver a plain message from a friend.
    pub fn receive_message(&mut self, key: &PublicKey, text: &str) -> bool {
        let Some(friend) = self.number_of(key) else {
            return false;
        };
        self.events.push_back(CoreEvent::Message { friend, text: nul_terminated(text) });
        true
    }

    /// Deliver an action message from a friend.
    pub fn receive_action(&mut self, key: &PublicKey, text: &str) -> bool {
        let Some(friend) = self.number_of(key) else {
            return false;
        };
        self.events.push_back(CoreEvent::Action { friend, text: nul_terminated(text) });
        true
    }

    /// Deliver a friend request from anyone.
    pub fn receive_request(&mut self, from: PublicKey, message: &str) {
        self.events
            .push_back(CoreEvent::FriendRequest { public_key: from, message: message.into() });
    }

    fn number_of(&self, key: &PublicKey) -> Option<FriendNumber> {
        self.friends
            .iter()
            .position(|f| f.as_ref().is_some_and(|f| f.key == *key))
            .and_then(|i| u32::try_from(i).ok())
            .map(FriendNumber)
    }

    fn entry(&self, friend: FriendNumber) -> Option<&SimFriend> {
        self.friends.get(friend.0 as usize).and_then(Option::as_ref)
    }

    fn entry_mut(&mut self, friend: FriendNumber) -> Option<&mut SimFriend> {
        self.friends.get_mut(friend.0 as usize).and_then(Option::as_mut)
    }

    fn insert(&mut self, key: PublicKey, nospam: Option<[u8; NOSPAM_SIZE]>) -> FriendNumber {
        let friend =
            SimFriend { key, nospam, online: false, presence: CorePresence::None, name: None };
        let slot = match self.friends.iter().position(Option::is_none) {
            Some(free) => {
                self.friends[free] = Some(friend);
                free
            },
            None => {
                self.friends.push(Some(friend));
                self.friends.len() - 1
            },
        };
        FriendNumber(u32::try_from(slot).unwrap_or(u32::MAX))
    }

    fn encode_state(&self) -> Vec<u8> {
        let name = self.name.as_deref().unwrap_or_default().as_bytes();
        let keys = self.friend_keys();

        let capacity =
            SAVE_MAGIC.len() + ADDRESS_SIZE + 3 + name.len() + keys.len() * PUBLIC_KEY_SIZE;
        let mut out = Vec::with_capacity(capacity);
        out.extend_from_slice(SAVE_MAGIC);
        out.extend_from_slice(self.address.as_bytes());
        out.push(u8::try_from(name.len()).unwrap_or(u8::MAX));
        out.extend_from_slice(&name[..name.len().min(usize::from(u8::MAX))]);
        out.extend_from_slice(&u16::try_from(keys.len()).unwrap_or(u16::MAX).to_be_bytes());
        for key in keys.iter().take(usize::from(u16::MAX)) {
            out.extend_from_slice(key.as_bytes());
        }
        out
    }
}

fn random_address(rng: &mut ChaCha8Rng) -> ToxAddress {
    let mut key = [0u8; PUBLIC_KEY_SIZE];
    let mut nospam = [0u8; NOSPAM_SIZE];
    rng.fill_bytes(&mut key);
    rng.fill_bytes(&mut nospam);
    ToxAddress::from_parts(PublicKey::from_bytes(key), nospam)
}

fn nul_terminated(text: &str) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

struct SavedState {
    address: ToxAddress,
    name: Option<String>,
    friends: Vec<PublicKey>,
}

fn decode_state(data: &[u8]) -> Option<SavedState> {
    let rest = data.strip_prefix(SAVE_MAGIC.as_slice())?;

    let (address, rest) = rest.split_at_checked(ADDRESS_SIZE)?;
    let address = ToxAddress::from_bytes(address.try_into().ok()?);
    if !address.has_valid_checksum() {
        return None;
    }

    let (&name_len, rest) = rest.split_first()?;
    let (name, rest) = rest.split_at_checked(usize::from(name_len))?;
    let name = std::str::from_utf8(name).ok()?;
    let name = (!name.is_empty()).then(|| name.to_string());

    let (count, mut rest) = rest.split_at_checked(2)?;
    let count = u16::from_be_bytes(count.try_into().ok()?);
    let mut friends = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let (key, tail) = rest.split_at_checked(PUBLIC_KEY_SIZE)?;
        friends.push(PublicKey::from_bytes(key.try_into().ok()?));
        rest = tail;
    }

    rest.is_empty().then_some(SavedState { address, name, friends })
}

impl NetworkCore for SimCore {
    fn is_dht_connected(&self) -> bool {
        self.dht
    }

    fn iterate(&mut self) -> Vec<CoreEvent> {
        self.events.drain(..).collect()
    }

    fn bootstrap(&mut self, node: &BootstrapNode) -> bool {
        self.calls.bootstraps += 1;
        node.public_key().is_ok() && node.port != 0
    }

    fn self_address(&self) -> ToxAddress {
        self.address
    }

    fn self_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn set_self_name(&mut self, name: &str) -> bool {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return false;
        }
        self.name = Some(name.to_string());
        true
    }

    fn set_presence(&mut self, presence: CorePresence) {
        self.presence = presence;
    }

    fn set_status_message(&mut self, message: &str) -> bool {
        self.status_message = message.to_string();
        true
    }

    fn friend_by_public_key(&self, key: &PublicKey) -> Option<FriendNumber> {
        self.number_of(key)
    }

    fn public_key_of(&self, friend: FriendNumber) -> Option<PublicKey> {
        self.entry(friend).map(|f| f.key)
    }

    fn add_friend(
        &mut self,
        address: &ToxAddress,
        message: &str,
    ) -> Result<FriendNumber, FriendAddError> {
        self.calls.request_adds += 1;

        if message.len() > MAX_FRIEND_REQUEST_LEN {
            return Err(FriendAddError::TooLong);
        }
        if !address.has_valid_checksum() {
            return Err(FriendAddError::BadChecksum);
        }
        if message.is_empty() {
            return Err(FriendAddError::NoMessage);
        }
        let key = address.public_key();
        if key == self.address.public_key() {
            return Err(FriendAddError::OwnKey);
        }
        if let Some(friend) = self.number_of(&key) {
            let nospam = address.nospam();
            let entry = self.entry_mut(friend).ok_or(FriendAddError::Unknown)?;
            if entry.nospam.is_some_and(|known| known == nospam) {
                return Err(FriendAddError::AlreadySent);
            }
            entry.nospam = Some(nospam);
            return Err(FriendAddError::SetNewNospam);
        }

        let friend = self.insert(key, Some(address.nospam()));
        tracing::trace!(%friend, %key, "friend request queued");
        Ok(friend)
    }

    fn add_friend_norequest(&mut self, key: &PublicKey) -> Result<FriendNumber, FriendAddError> {
        self.calls.quiet_adds += 1;

        if *key == self.address.public_key() {
            return Err(FriendAddError::OwnKey);
        }
        if self.number_of(key).is_some() {
            return Err(FriendAddError::AlreadySent);
        }
        Ok(self.insert(*key, None))
    }

    fn delete_friend(&mut self, friend: FriendNumber) -> bool {
        self.calls.deletes += 1;
        self.friends.get_mut(friend.0 as usize).is_some_and(|slot| slot.take().is_some())
    }

    fn friend_presence(&self, friend: FriendNumber) -> CorePresence {
        self.entry(friend).map(|f| f.presence).unwrap_or_default()
    }

    fn friend_is_online(&self, friend: FriendNumber) -> bool {
        self.entry(friend).is_some_and(|f| f.online)
    }

    fn friend_name(&self, friend: FriendNumber) -> Option<String> {
        self.entry(friend).and_then(|f| f.name.clone())
    }

    fn send_message(&mut self, friend: FriendNumber, payload: &[u8]) -> bool {
        let Some(to) = self.entry(friend).filter(|f| f.online).map(|f| f.key) else {
            return false;
        };
        if self.refuse_sends {
            return false;
        }
        self.sent.push(SentMessage { to, action: false, payload: payload.to_vec() });
        true
    }

    fn send_action(&mut self, friend: FriendNumber, payload: &[u8]) -> bool {
        let Some(to) = self.entry(friend).filter(|f| f.online).map(|f| f.key) else {
            return false;
        };
        if self.refuse_sends {
            return false;
        }
        self.sent.push(SentMessage { to, action: true, payload: payload.to_vec() });
        true
    }

    fn save_size(&self) -> usize {
        if self.stateless { 0 } else { self.encode_state().len() }
    }

    fn save(&self, buffer: &mut [u8]) {
        let state = self.encode_state();
        let len = buffer.len().min(state.len());
        buffer[..len].copy_from_slice(&state[..len]);
    }

    fn load(&mut self, data: &[u8]) -> Result<(), AccountError> {
        let state = decode_state(data).ok_or(AccountError::Rejected)?;

        self.address = state.address;
        self.name = state.name;
        self.friends.clear();
        for key in state.friends {
            self.insert(key, None);
        }
        self.calls.loads += 1;
        tracing::debug!(friends = self.friends.len(), "state loaded");
        Ok(())
    }
}
