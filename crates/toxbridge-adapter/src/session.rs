//! Logged-in session state.
//!
//! A [`Session`] owns the network core for one account together with
//! everything scoped to that login: connection tracking, the friend directory,
//! the request inbox and the offline message store. It turns core events and
//! user operations into [`HostAction`]s.

use toxbridge_core::{
    AccountBlob, AccountConfig, AccountExport, CorePresence, Environment, FriendAddError,
    Presence, PublicKey, SettingKey, StatusValue, ToxAddress,
};

use crate::{
    connection::{
        CONNECTED_TEXT, CONNECTING_TEXT, Connection, ConnectionConfig, ConnectionState,
        PROGRESS_STEPS, Transition,
    },
    directory::{AddTarget, FriendDirectory},
    error::AdapterError,
    event::{CoreEvent, Delivery, HostAction},
    message::{MessageKind, Outbound, decode_text, inbound_text},
    network::{FriendNumber, NetworkCore},
    offline::{OfflineMessage, OfflineStore},
    requests::{Decision, FRIEND_REQUEST_TITLE, FriendRequestInbox, RequestId},
};

/// Title of the account ID notification.
pub const ACCOUNT_ID_TITLE: &str = "Account ID";

/// Text of the account ID notification.
pub const ACCOUNT_ID_TEXT: &str = "If someone wants to add you, give them this ID:";

fn progress(text: &'static str, step: u32) -> HostAction {
    HostAction::Progress { text, step, total: PROGRESS_STEPS }
}

/// One logged-in account.
pub struct Session<C: NetworkCore, E: Environment> {
    core: C,
    env: E,
    connection: Connection,
    directory: FriendDirectory,
    inbox: FriendRequestInbox,
    offline: OfflineStore,
    nickname: Option<String>,
}

impl<C: NetworkCore, E: Environment> Session<C, E> {
    /// Start a session: track the host's contacts, bootstrap the core and
    /// enter `Connecting`.
    ///
    /// Returns the session and the actions announcing it: progress 0 of 2 and
    /// the tick schedule.
    pub fn start(
        mut core: C,
        env: E,
        contacts: impl IntoIterator<Item = PublicKey>,
        config: &AccountConfig,
        cadence: ConnectionConfig,
    ) -> (Self, Vec<HostAction>) {
        let mut directory = FriendDirectory::new();
        for key in contacts {
            directory.track(key);
        }

        let node = &config.bootstrap;
        if core.bootstrap(node) {
            tracing::info!(
                address = %node.address,
                port = node.port,
                key = %node.key,
                "bootstrapping"
            );
        } else {
            tracing::warn!(address = %node.address, port = node.port, "bootstrap node rejected");
        }

        let mut connection = Connection::new();
        connection.start();

        let session = Self {
            core,
            env,
            connection,
            directory,
            inbox: FriendRequestInbox::new(),
            offline: OfflineStore::new(),
            nickname: config.nickname().map(str::to_string),
        };

        let actions = vec![
            progress(CONNECTING_TEXT, 0),
            HostAction::ScheduleTicks {
                network: cadence.network_interval,
                connectivity: cadence.connectivity_interval,
            },
        ];
        (session, actions)
    }

    /// Connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Friend directory.
    pub fn directory(&self) -> &FriendDirectory {
        &self.directory
    }

    /// Pending friend requests.
    pub fn inbox(&self) -> &FriendRequestInbox {
        &self.inbox
    }

    /// Messages waiting for offline contacts.
    pub fn offline(&self) -> &OfflineStore {
        &self.offline
    }

    /// The network core.
    pub fn core(&self) -> &C {
        &self.core
    }

    /// The network core, mutably.
    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    /// Current nickname, if any.
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Own friend address.
    pub fn address(&self) -> ToxAddress {
        self.core.self_address()
    }

    /// Drain the core's events and translate them, in core order.
    pub fn network_tick(&mut self) -> Vec<HostAction> {
        let events = self.core.iterate();
        let mut actions = Vec::new();
        for event in events {
            actions.extend(self.handle_event(event));
        }
        actions
    }

    /// Sample DHT liveness and run connection side effects on a change.
    pub fn connectivity_tick(&mut self) -> Vec<HostAction> {
        let live = self.core.is_dht_connected();
        match self.connection.observe(live) {
            Some(Transition::Established) => self.on_established(),
            Some(Transition::Lost) => {
                tracing::info!("DHT connection lost");
                vec![progress(CONNECTING_TEXT, 0)]
            },
            None => Vec::new(),
        }
    }

    fn on_established(&mut self) -> Vec<HostAction> {
        tracing::info!(contacts = self.directory.len(), "DHT connected");

        let mut actions = vec![progress(CONNECTED_TEXT, 1), HostAction::SetConnected];
        for key in self.directory.keys() {
            actions.extend(self.query_contact(&key));
        }
        actions.extend(self.reconcile_name());
        actions
    }

    fn reconcile_name(&mut self) -> Vec<HostAction> {
        let core_name = self.core.self_name().filter(|n| !n.is_empty());

        if let Some(nick) = self.nickname.clone() {
            if core_name.as_deref() != Some(nick.as_str()) && !self.core.set_self_name(&nick) {
                tracing::warn!(%nick, "core refused nickname");
            }
            return vec![HostAction::SetDisplayName(nick)];
        }

        match core_name {
            Some(name) => {
                tracing::debug!(%name, "adopting core name as nickname");
                self.nickname = Some(name.clone());
                vec![
                    HostAction::SetDisplayName(name.clone()),
                    HostAction::StoreSetting { key: SettingKey::Nickname, value: Some(name) },
                ]
            },
            None => Vec::new(),
        }
    }

    /// Resolve a contact and report its status and alias to the host.
    ///
    /// Contacts that are online also get their queued messages.
    pub fn query_contact(&mut self, key: &PublicKey) -> Vec<HostAction> {
        let friend = match self.directory.resolve(&self.core, key) {
            Ok(friend) => friend,
            Err(err) => {
                tracing::debug!(%key, %err, "status query for unresolved contact");
                return vec![HostAction::ContactStatus {
                    key: *key,
                    status: StatusValue::new(Presence::Offline),
                }];
            },
        };

        let online = self.core.friend_is_online(friend);
        let presence = Presence::from_core(self.core.friend_presence(friend), online);
        tracing::debug!(%key, %friend, status = presence.id(), "contact status");

        let mut actions =
            vec![HostAction::ContactStatus { key: *key, status: StatusValue::new(presence) }];
        if let Some(alias) = self.core.friend_name(friend).filter(|n| !n.is_empty()) {
            actions.push(HostAction::AliasContact { key: *key, alias });
        }
        if online {
            self.flush_offline(*key, friend);
        }
        actions
    }

    fn handle_event(&mut self, event: CoreEvent) -> Vec<HostAction> {
        match event {
            CoreEvent::FriendConnection { friend, online } => {
                self.on_friend_connection(friend, online)
            },
            CoreEvent::FriendRequest { public_key, message } => {
                self.on_friend_request(public_key, &message)
            },
            CoreEvent::Message { friend, text } => {
                self.on_message(friend, MessageKind::Plain, &text)
            },
            CoreEvent::Action { friend, text } => {
                self.on_message(friend, MessageKind::Action, &text)
            },
            CoreEvent::NameChange { friend, name } => self.on_name_change(friend, &name),
            CoreEvent::StatusChange { friend, presence } => self.on_status_change(friend, presence),
        }
    }

    // Maps a friend number to its key through the core and refreshes the
    // directory binding for known contacts.
    fn sender(&mut self, friend: FriendNumber) -> Option<PublicKey> {
        let Some(key) = self.core.public_key_of(friend) else {
            tracing::debug!(%friend, "event for unknown friend number");
            return None;
        };
        if self.directory.contains(&key) && self.directory.key_for(friend) != Some(key) {
            self.directory.bind(key, friend);
        }
        Some(key)
    }

    fn on_friend_connection(&mut self, friend: FriendNumber, online: bool) -> Vec<HostAction> {
        let Some(key) = self.sender(friend) else {
            return Vec::new();
        };

        tracing::debug!(%key, online, "friend connection changed");
        if online {
            self.flush_offline(key, friend);
        }
        if !self.directory.contains(&key) {
            return Vec::new();
        }

        let presence = Presence::from_core(self.core.friend_presence(friend), online);
        vec![HostAction::ContactStatus { key, status: StatusValue::new(presence) }]
    }

    fn on_status_change(&mut self, friend: FriendNumber, core: CorePresence) -> Vec<HostAction> {
        let Some(key) = self.sender(friend).filter(|key| self.directory.contains(key)) else {
            return Vec::new();
        };

        let presence = Presence::from_core(core, self.core.friend_is_online(friend));
        tracing::debug!(%key, status = presence.id(), "friend status changed");
        vec![HostAction::ContactStatus { key, status: StatusValue::new(presence) }]
    }

    fn on_name_change(&mut self, friend: FriendNumber, raw: &[u8]) -> Vec<HostAction> {
        let Some(key) = self.sender(friend) else {
            return Vec::new();
        };
        if !self.directory.contains(&key) {
            tracing::debug!(%key, "ignoring name change for unknown contact");
            return Vec::new();
        }

        let alias = decode_text(raw);
        if alias.is_empty() {
            return Vec::new();
        }
        vec![HostAction::AliasContact { key, alias }]
    }

    fn on_message(
        &mut self,
        friend: FriendNumber,
        kind: MessageKind,
        raw: &[u8],
    ) -> Vec<HostAction> {
        let Some(from) = self.sender(friend) else {
            return Vec::new();
        };

        tracing::debug!(%from, ?kind, "message received");
        vec![HostAction::MessageReceived {
            from,
            text: inbound_text(kind, raw),
            timestamp: self.env.unix_time(),
        }]
    }

    fn on_friend_request(&mut self, from: PublicKey, raw: &[u8]) -> Vec<HostAction> {
        if self.directory.contains(&from) {
            tracing::debug!(%from, "friend request from existing contact dropped");
            return Vec::new();
        }
        if self.inbox.is_pending_from(&from) {
            tracing::debug!(%from, "duplicate friend request dropped");
            return Vec::new();
        }

        let text = decode_text(raw);
        let request = self.inbox.receive(from, (!text.is_empty()).then_some(text));
        tracing::info!(%from, request = %request.id, "friend request received");

        vec![HostAction::RequestAuthorization {
            request: request.id,
            from,
            title: FRIEND_REQUEST_TITLE,
            prompt: request.prompt(),
            message: request.message,
        }]
    }

    fn send_outbound(&mut self, friend: FriendNumber, message: &Outbound) -> bool {
        match message.kind {
            MessageKind::Plain => self.core.send_message(friend, &message.payload),
            MessageKind::Action => self.core.send_action(friend, &message.payload),
        }
    }

    fn flush_offline(&mut self, key: PublicKey, friend: FriendNumber) -> usize {
        let mut queue = self.offline.drain(&key);
        let mut sent = 0;

        while let Some(item) = queue.pop_front() {
            if !self.send_outbound(friend, &item.message) {
                tracing::warn!(%key, remaining = queue.len() + 1, "queued message refused by core");
                queue.push_front(item);
                break;
            }
            sent += 1;
        }

        self.offline.restore(key, queue);
        if sent > 0 {
            tracing::info!(%key, sent, "delivered queued messages");
        }
        sent
    }

    /// Send a message, or queue it if the contact is offline.
    ///
    /// # Errors
    ///
    /// - `AdapterError::UnknownContact` if `to` is not a contact
    /// - `AdapterError::UnresolvedContact` if the core has no friend for it
    /// - `AdapterError::SendFailed` if the core refused the message
    pub fn send_message(&mut self, to: &PublicKey, markup: &str) -> Result<Delivery, AdapterError> {
        let friend = self.directory.resolve(&self.core, to)?;
        let message = Outbound::from_markup(markup);

        if !self.core.friend_is_online(friend) {
            tracing::debug!(%to, "contact offline, queueing message");
            let queued_at = self.env.unix_time();
            if let Some(dropped) = self.offline.queue(*to, OfflineMessage { message, queued_at }) {
                tracing::warn!(
                    %to,
                    queued_at = dropped.queued_at,
                    "offline queue full, dropped oldest"
                );
            }
            return Ok(Delivery::Queued);
        }

        if self.offline.pending(to) > 0 {
            self.flush_offline(*to, friend);
        }

        if self.send_outbound(friend, &message) {
            Ok(Delivery::Sent)
        } else {
            Err(AdapterError::SendFailed(*to))
        }
    }

    /// Set own status and, if non-empty, status message.
    ///
    /// # Errors
    ///
    /// - `AdapterError::UnknownStatus` for an identifier outside the table
    pub fn set_status(
        &mut self,
        status_id: &str,
        message: Option<&str>,
    ) -> Result<(), AdapterError> {
        let Some(presence) = Presence::from_id(status_id) else {
            tracing::warn!(status_id, "unknown status");
            return Err(AdapterError::UnknownStatus(status_id.to_string()));
        };

        let status = StatusValue { presence, message: message.map(str::to_string) };
        tracing::debug!(status = presence.id(), "setting own status");
        self.core.set_presence(status.to_core());
        if let Some(text) = status.core_message()
            && !self.core.set_status_message(text)
        {
            tracing::warn!("core refused status message");
        }
        Ok(())
    }

    /// Add a contact the user typed in, sending a friend request.
    ///
    /// On success (or when a request was already sent) the host's contact is
    /// renamed to the bare public key and its status is queried.
    ///
    /// # Errors
    ///
    /// - `AdapterError::InvalidIdentityFormat` unless `name` is a 76-character
    ///   address; the core is not called
    /// - `AdapterError::FriendAddRejected` for every refusal except
    ///   [`FriendAddError::AlreadySent`]
    pub fn add_contact(
        &mut self,
        name: &str,
        invite: &str,
    ) -> Result<Vec<HostAction>, AdapterError> {
        let address = ToxAddress::parse(name).inspect_err(|err| {
            tracing::warn!(name, %err, "invalid friend address");
        })?;
        let key = address.public_key();

        let mut actions = Vec::new();
        let target = AddTarget::Request { address: &address, message: invite };
        match self.directory.add(&mut self.core, target) {
            Ok(_) => {},
            Err(err) if err.keeps_contact() => {
                tracing::info!(%key, %err, "friend kept despite refusal");
                actions.push(HostAction::error(err.to_string(), None));
                self.directory.track(key);
            },
            Err(err) => {
                tracing::warn!(%key, %err, "friend add rejected");
                return Err(err.into());
            },
        }

        actions.push(HostAction::RenameContact { from: name.to_string(), to: key });
        actions.extend(self.query_contact(&key));
        Ok(actions)
    }

    /// Remove a contact and anything queued for it. Returns false if the key
    /// was not a contact.
    pub fn remove_contact(&mut self, key: &PublicKey) -> bool {
        let dropped = self.offline.discard(key);
        if dropped > 0 {
            tracing::info!(%key, dropped, "dropped queued messages for removed contact");
        }
        self.directory.remove(&mut self.core, key)
    }

    /// Answer a pending friend request.
    ///
    /// A request can be answered once; later answers return no actions.
    ///
    /// # Errors
    ///
    /// - `AdapterError::FriendAddRejected` if accepting failed in the core
    pub fn authorize(
        &mut self,
        request: RequestId,
        decision: Decision,
    ) -> Result<Vec<HostAction>, AdapterError> {
        let Some(pending) = self.inbox.take(request) else {
            tracing::debug!(%request, "request already decided");
            return Ok(Vec::new());
        };

        let key = pending.from;
        if decision == Decision::Decline {
            tracing::info!(%key, "friend request declined");
            return Ok(Vec::new());
        }

        let friend = self.directory.add(&mut self.core, AddTarget::NoRequest(&key))?;
        let alias = self.core.friend_name(friend).filter(|n| !n.is_empty());
        let online = self.core.friend_is_online(friend);
        let presence = Presence::from_core(self.core.friend_presence(friend), online);

        Ok(vec![
            HostAction::AddContact { key, alias },
            HostAction::ContactStatus { key, status: StatusValue::new(presence) },
        ])
    }

    /// Change own nickname.
    pub fn set_nickname(&mut self, name: &str) -> Vec<HostAction> {
        if !self.core.set_self_name(name) {
            tracing::warn!(name, "core refused nickname");
        }
        self.nickname = Some(name.to_string());
        vec![
            HostAction::SetDisplayName(name.to_string()),
            HostAction::StoreSetting { key: SettingKey::Nickname, value: Some(name.to_string()) },
        ]
    }

    /// Notification showing own friend address.
    pub fn account_id_notice(&self) -> HostAction {
        HostAction::info(ACCOUNT_ID_TITLE, ACCOUNT_ID_TEXT, Some(self.address().to_hex()))
    }

    /// Serialize the core's account state.
    ///
    /// # Errors
    ///
    /// - `AdapterError::CorruptAccountData` if the core produced more than the
    ///   accepted maximum
    pub fn export(&self) -> Result<AccountExport, AdapterError> {
        let size = self.core.save_size();
        if size == 0 {
            return Ok(AccountExport::Empty);
        }

        let mut buffer = vec![0u8; size];
        self.core.save(&mut buffer);
        Ok(AccountExport::Blob(AccountBlob::new(buffer)?))
    }

    /// End the session and hand back the core.
    ///
    /// Undecided friend requests and queued messages are dropped.
    pub fn end(mut self) -> C {
        self.connection.stop();
        if !self.inbox.is_empty() {
            tracing::debug!(pending = self.inbox.len(), "dropping undecided friend requests");
        }
        if self.offline.total() > 0 {
            tracing::warn!(queued = self.offline.total(), "dropping undelivered offline messages");
        }
        self.core
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use toxbridge_core::SystemEnv;

    use super::*;
    use crate::{
        offline::MAX_QUEUED_PER_CONTACT,
        testing::{FakeCore, address, key},
    };

    fn start(core: FakeCore, contacts: Vec<PublicKey>) -> Session<FakeCore, SystemEnv> {
        let (session, _) = Session::start(
            core,
            SystemEnv,
            contacts,
            &AccountConfig::default(),
            ConnectionConfig::default(),
        );
        session
    }

    #[test]
    fn start_reports_connecting_and_schedules_ticks() {
        let (session, actions) = Session::start(
            FakeCore::default(),
            SystemEnv,
            Vec::new(),
            &AccountConfig::default(),
            ConnectionConfig::default(),
        );

        assert_eq!(session.state(), ConnectionState::Connecting);
        assert_eq!(session.core().bootstraps, 1);
        assert_eq!(actions[0], HostAction::Progress { text: "Connecting", step: 0, total: 2 });
        assert!(matches!(actions[1], HostAction::ScheduleTicks { .. }));
    }

    #[test]
    fn connect_queries_every_contact() {
        let mut core = FakeCore { dht: true, ..Default::default() };
        let a = core.with_friend(key(1), true);
        core.friend_mut(a).presence = CorePresence::Away;
        core.friend_mut(a).name = Some("alice".into());
        let mut session = start(core, vec![key(1), key(2)]);

        let actions = session.connectivity_tick();

        assert_eq!(actions[0], HostAction::Progress { text: "Connected", step: 1, total: 2 });
        assert_eq!(actions[1], HostAction::SetConnected);
        assert!(actions.contains(&HostAction::ContactStatus {
            key: key(1),
            status: StatusValue::new(Presence::Away)
        }));
        assert!(actions.contains(&HostAction::AliasContact { key: key(1), alias: "alice".into() }));
        assert!(actions.contains(&HostAction::ContactStatus {
            key: key(2),
            status: StatusValue::new(Presence::Offline)
        }));
        assert!(session.connectivity_tick().is_empty());
    }

    #[test]
    fn configured_nickname_is_pushed_to_core() {
        let core = FakeCore { dht: true, self_name: Some("old".into()), ..Default::default() };
        let config = AccountConfig { nickname: Some("new".into()), ..Default::default() };
        let (mut session, _) =
            Session::start(core, SystemEnv, Vec::new(), &config, ConnectionConfig::default());

        let actions = session.connectivity_tick();

        assert!(actions.contains(&HostAction::SetDisplayName("new".into())));
        assert_eq!(session.core().self_name.as_deref(), Some("new"));
    }

    #[test]
    fn core_name_is_adopted_without_nickname() {
        let core = FakeCore { dht: true, self_name: Some("core".into()), ..Default::default() };
        let mut session = start(core, Vec::new());

        let actions = session.connectivity_tick();

        assert!(actions.contains(&HostAction::SetDisplayName("core".into())));
        assert!(actions.contains(&HostAction::StoreSetting {
            key: SettingKey::Nickname,
            value: Some("core".into())
        }));
        assert_eq!(session.nickname(), Some("core"));
    }

    #[test]
    fn send_uses_action_path_for_me() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(1), true);
        let mut session = start(core, vec![key(1)]);

        assert_eq!(session.send_message(&key(1), "/me waves"), Ok(Delivery::Sent));
        let sent = &session.core().sent[0];
        assert_eq!(sent.friend, friend);
        assert!(sent.action);
        assert_eq!(sent.payload, b"waves\0");
    }

    #[test]
    fn send_to_unknown_and_unresolved() {
        let mut session = start(FakeCore::default(), vec![key(1)]);

        let result = session.send_message(&key(9), "hi");
        assert!(matches!(result, Err(AdapterError::UnknownContact(_))));
        assert_eq!(
            session.send_message(&key(1), "hi"),
            Err(AdapterError::UnresolvedContact(key(1)))
        );
    }

    #[test]
    fn refused_send_is_reported() {
        let mut core = FakeCore { refuse_sends: true, ..Default::default() };
        core.with_friend(key(1), true);
        let mut session = start(core, vec![key(1)]);

        assert_eq!(session.send_message(&key(1), "hi"), Err(AdapterError::SendFailed(key(1))));
    }

    #[test]
    fn offline_messages_flush_on_connection_in_order() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(1), false);
        let mut session = start(core, vec![key(1)]);

        assert_eq!(session.send_message(&key(1), "one"), Ok(Delivery::Queued));
        assert_eq!(session.send_message(&key(1), "two"), Ok(Delivery::Queued));
        assert!(session.core().sent.is_empty());

        session.core_mut().friend_mut(friend).online = true;
        session.core_mut().events.push(CoreEvent::FriendConnection { friend, online: true });
        let actions = session.network_tick();

        assert_eq!(actions, vec![HostAction::ContactStatus {
            key: key(1),
            status: StatusValue::new(Presence::Online)
        }]);
        let payloads: Vec<&[u8]> =
            session.core().sent.iter().map(|m| m.payload.as_slice()).collect();
        assert_eq!(payloads, vec![&b"one\0"[..], &b"two\0"[..]]);
        assert_eq!(session.offline().total(), 0);
    }

    #[test]
    fn long_offline_backlog_keeps_newest() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(1), false);
        let mut session = start(core, vec![key(1)]);

        for n in 0..=MAX_QUEUED_PER_CONTACT {
            assert_eq!(session.send_message(&key(1), &format!("m{n}")), Ok(Delivery::Queued));
        }
        assert_eq!(session.offline().pending(&key(1)), MAX_QUEUED_PER_CONTACT);

        session.core_mut().friend_mut(friend).online = true;
        session.core_mut().events.push(CoreEvent::FriendConnection { friend, online: true });
        session.network_tick();

        let sent = &session.core().sent;
        assert_eq!(sent.len(), MAX_QUEUED_PER_CONTACT);
        assert_eq!(sent[0].payload, b"m1\0");
    }

    #[test]
    fn inbound_message_uses_core_key() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(3), true);
        core.events.push(CoreEvent::Action { friend, text: b"dances\0".to_vec() });
        let mut session = start(core, Vec::new());

        let actions = session.network_tick();
        assert!(matches!(
            &actions[..],
            [HostAction::MessageReceived { from, text, .. }]
                if *from == key(3) && text == "/me dances"
        ));
    }

    #[test]
    fn name_change_only_for_known_contacts() {
        let mut core = FakeCore::default();
        let known = core.with_friend(key(1), true);
        let stranger = core.with_friend(key(2), true);
        core.events.push(CoreEvent::NameChange { friend: known, name: b"Ann\0".to_vec() });
        core.events.push(CoreEvent::NameChange { friend: stranger, name: b"Bob\0".to_vec() });
        core.events.push(CoreEvent::NameChange { friend: known, name: Vec::new() });
        let mut session = start(core, vec![key(1)]);

        let actions = session.network_tick();
        assert_eq!(actions, vec![HostAction::AliasContact { key: key(1), alias: "Ann".into() }]);
    }

    #[test]
    fn status_change_respects_liveness() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(1), false);
        core.events.push(CoreEvent::StatusChange { friend, presence: CorePresence::Busy });
        let mut session = start(core, vec![key(1)]);

        let actions = session.network_tick();
        assert_eq!(actions, vec![HostAction::ContactStatus {
            key: key(1),
            status: StatusValue::new(Presence::Offline)
        }]);
    }

    #[test]
    fn status_for_strangers_is_not_shown() {
        let mut core = FakeCore::default();
        let friend = core.with_friend(key(5), true);
        core.events.push(CoreEvent::FriendConnection { friend, online: true });
        core.events.push(CoreEvent::StatusChange { friend, presence: CorePresence::Away });
        let mut session = start(core, Vec::new());

        assert!(session.network_tick().is_empty());
    }

    #[test]
    fn request_from_existing_contact_is_dropped() {
        let mut core = FakeCore::default();
        core.events.push(CoreEvent::FriendRequest { public_key: key(1), message: b"hi".to_vec() });
        let mut session = start(core, vec![key(1)]);

        assert!(session.network_tick().is_empty());
        assert!(session.inbox().is_empty());
    }

    #[test]
    fn accept_uses_silent_add() {
        let mut core = FakeCore::default();
        core.events
            .push(CoreEvent::FriendRequest { public_key: key(4), message: b"yo\0".to_vec() });
        let mut session = start(core, Vec::new());

        let actions = session.network_tick();
        let HostAction::RequestAuthorization { request, message, .. } = &actions[0] else {
            panic!("expected prompt, got {actions:?}");
        };
        assert_eq!(message.as_deref(), Some("yo"));

        let actions = session.authorize(*request, Decision::Accept).unwrap();
        assert_eq!(actions[0], HostAction::AddContact { key: key(4), alias: None });
        assert_eq!(session.core().request_adds, 0);
        assert_eq!(session.core().quiet_adds, 1);
        assert!(session.authorize(*request, Decision::Accept).unwrap().is_empty());
        assert_eq!(session.core().quiet_adds, 1);
    }

    #[test]
    fn invalid_address_never_reaches_core() {
        let mut session = start(FakeCore::default(), Vec::new());

        let err = session.add_contact("deadbeef", "").unwrap_err();
        assert!(matches!(err, AdapterError::InvalidIdentityFormat(_)));
        assert_eq!(session.core().request_adds, 0);
        assert!(session.directory().is_empty());
    }

    #[test]
    fn add_contact_renames_to_public_key() {
        let mut session = start(FakeCore::default(), Vec::new());
        let addr = address(5);
        let name = addr.to_hex().to_uppercase();

        let actions = session.add_contact(&name, "").unwrap();
        assert_eq!(actions[0], HostAction::RenameContact { from: name, to: key(5) });
        assert!(session.directory().contains(&key(5)));
        assert_eq!(session.core().request_adds, 1);
    }

    #[test]
    fn already_sent_still_keeps_contact() {
        let mut core = FakeCore::default();
        core.with_friend(key(5), false);
        let mut session = start(core, Vec::new());

        let actions = session.add_contact(&address(5).to_hex(), "hi").unwrap();
        assert!(matches!(
            &actions[0],
            HostAction::Notify { primary, .. } if primary == "Friend request already sent"
        ));
        assert!(matches!(actions[1], HostAction::RenameContact { .. }));
        assert!(session.directory().contains(&key(5)));
    }

    #[test]
    fn rejected_add_is_an_error() {
        let core = FakeCore { add_error: Some(FriendAddError::OwnKey), ..Default::default() };
        let mut session = start(core, Vec::new());

        assert_eq!(
            session.add_contact(&address(5).to_hex(), ""),
            Err(AdapterError::FriendAddRejected(FriendAddError::OwnKey))
        );
        assert!(session.directory().is_empty());
    }

    #[test]
    fn set_status_pushes_non_empty_message() {
        let mut session = start(FakeCore::default(), Vec::new());

        session.set_status("tox_busy", Some("")).unwrap();
        assert_eq!(session.core().presence, CorePresence::Busy);
        assert_eq!(session.core().status_message, None);

        session.set_status("tox_away", Some("lunch")).unwrap();
        assert_eq!(session.core().status_message.as_deref(), Some("lunch"));

        assert_eq!(
            session.set_status("tox_invisible", None),
            Err(AdapterError::UnknownStatus("tox_invisible".into()))
        );
        assert_eq!(session.core().presence, CorePresence::Away);
    }

    #[test]
    fn empty_core_state_exports_empty_marker() {
        let session = start(FakeCore::default(), Vec::new());
        assert_eq!(session.export(), Ok(AccountExport::Empty));

        let core = FakeCore { state: b"state".to_vec(), ..Default::default() };
        let session = start(core, Vec::new());
        let export = session.export().unwrap();
        assert_eq!(export.blob().map(AccountBlob::as_bytes), Some(&b"state"[..]));
    }
}
