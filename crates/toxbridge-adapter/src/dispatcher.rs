//! Account lifecycle and command routing.
//!
//! The [`Dispatcher`] is the adapter's entry point for one host account. It
//! walks the account through its lifecycle:
//!
//! ```text
//! Idle --login--> AwaitingSetup --setup--> Active(Session) --close--> Idle
//!        \                                    ^
//!         +---------- stored account ---------+
//! ```
//!
//! All calls are synchronous and return the [`HostAction`]s to execute.
//! Setting writes in those actions are mirrored into the dispatcher's own
//! [`AccountConfig`], so it always matches what the host has stored.

use std::path::Path;

use toxbridge_core::{
    AccountBlob, AccountConfig, AccountError, AccountExport, Environment, PublicKey, SettingKey,
    StoredAccount,
    account::{read_account_file, suggested_export_name, write_account_file},
};

use crate::{
    connection::{ConnectionConfig, ConnectionState},
    error::AdapterError,
    event::{Delivery, HostAction, HostCommand, SetupChoice},
    network::NetworkCore,
    requests::{Decision, RequestId},
    session::Session,
};

/// Shown when an added contact is not a full friend address.
pub const INVALID_ADDRESS_TEXT: &str = "Invalid buddy ID given (must be 76 characters long)";

/// Shown when stored account data cannot be used at login.
pub const INVALID_STORED_ACCOUNT_TEXT: &str = "Invalid account data";

/// Shown when imported account data cannot be used.
pub const INVALID_ACCOUNT_FILE_TEXT: &str = "Account data file seems to be invalid";

enum Phase<C: NetworkCore, E: Environment> {
    Idle,
    AwaitingSetup { core: C, contacts: Vec<PublicKey> },
    Active(Session<C, E>),
}

/// Adapter entry point for one account.
pub struct Dispatcher<C: NetworkCore, E: Environment> {
    env: E,
    config: AccountConfig,
    cadence: ConnectionConfig,
    phase: Phase<C, E>,
}

impl<C: NetworkCore, E: Environment> Dispatcher<C, E> {
    /// Dispatcher for an account with the given stored settings.
    pub fn new(env: E, config: AccountConfig) -> Self {
        Self { env, config, cadence: ConnectionConfig::default(), phase: Phase::Idle }
    }

    /// Override the tick cadences.
    #[must_use]
    pub fn with_cadence(mut self, cadence: ConnectionConfig) -> Self {
        self.cadence = cadence;
        self
    }

    /// Settings as the host currently stores them.
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Active session, if logged in.
    pub fn session(&self) -> Option<&Session<C, E>> {
        match &self.phase {
            Phase::Active(session) => Some(session),
            _ => None,
        }
    }

    /// Active session, mutably.
    pub fn session_mut(&mut self) -> Option<&mut Session<C, E>> {
        match &mut self.phase {
            Phase::Active(session) => Some(session),
            _ => None,
        }
    }

    /// Returns true while the setup prompt is outstanding.
    pub fn is_awaiting_setup(&self) -> bool {
        matches!(self.phase, Phase::AwaitingSetup { .. })
    }

    /// Connection state; `Disconnected` without a session.
    pub fn connection_state(&self) -> ConnectionState {
        self.session().map_or(ConnectionState::Disconnected, Session::state)
    }

    fn active(&self) -> Result<&Session<C, E>, AdapterError> {
        self.session().ok_or(AdapterError::NoSession)
    }

    fn active_mut(&mut self) -> Result<&mut Session<C, E>, AdapterError> {
        self.session_mut().ok_or(AdapterError::NoSession)
    }

    fn track_settings(&mut self, actions: Vec<HostAction>) -> Vec<HostAction> {
        for action in &actions {
            if let HostAction::StoreSetting { key, value } = action {
                self.config.apply(*key, value.clone());
            }
        }
        actions
    }

    fn start_session(&mut self, core: C, contacts: Vec<PublicKey>) -> Vec<HostAction> {
        let (session, actions) =
            Session::start(core, self.env.clone(), contacts, &self.config, self.cadence);
        self.phase = Phase::Active(session);
        actions
    }

    /// Log in with a fresh network core and the host's current contacts.
    ///
    /// Without stored account data the host is asked to create or import an
    /// account and no session exists until [`Dispatcher::setup`]. Stored data
    /// that cannot be used is reported, cleared and followed by the same
    /// prompt. An existing session is closed first.
    pub fn login(
        &mut self,
        mut core: C,
        contacts: impl IntoIterator<Item = PublicKey>,
    ) -> Vec<HostAction> {
        let mut actions = self.close();
        let contacts: Vec<PublicKey> = contacts.into_iter().collect();

        let loaded = self.config.stored_account().and_then(|stored| match stored {
            StoredAccount::Blob(blob) => core.load(blob.as_bytes()).map(|()| Some(blob.size())),
            StoredAccount::Empty => Ok(Some(0)),
            StoredAccount::Missing => Ok(None),
        });

        match loaded {
            Ok(Some(size)) => {
                tracing::info!(size, contacts = contacts.len(), "logging in");
                actions.extend(self.start_session(core, contacts));
            },
            Ok(None) => {
                tracing::info!("first login, asking for account setup");
                self.phase = Phase::AwaitingSetup { core, contacts };
                actions.push(HostAction::setup_prompt());
            },
            Err(err) => actions.extend(self.discard_stored(core, contacts, &err)),
        }

        self.track_settings(actions)
    }

    fn discard_stored(
        &mut self,
        core: C,
        contacts: Vec<PublicKey>,
        err: &AccountError,
    ) -> Vec<HostAction> {
        tracing::warn!(%err, "stored account data is unusable, clearing it");
        self.phase = Phase::AwaitingSetup { core, contacts };
        vec![
            HostAction::error(INVALID_STORED_ACCOUNT_TEXT, Some(err.to_string())),
            HostAction::StoreSetting { key: SettingKey::Messenger, value: None },
            HostAction::setup_prompt(),
        ]
    }

    fn load_choice(core: &mut C, choice: SetupChoice) -> Result<Option<AccountBlob>, AdapterError> {
        let blob = match choice {
            SetupChoice::CreateNew => return Ok(None),
            SetupChoice::ImportFile(path) => read_account_file(&path)?,
            SetupChoice::ImportBytes(bytes) => AccountBlob::new(bytes)?,
        };
        core.load(blob.as_bytes())?;
        Ok(Some(blob))
    }

    /// Answer the account setup prompt.
    ///
    /// Imported data is validated before the core sees it and stored only
    /// once the core has accepted it. On error the prompt stays outstanding.
    ///
    /// # Errors
    ///
    /// - `AdapterError::NoSession` if no setup prompt is outstanding
    /// - `AdapterError::Io` if the import file cannot be read
    /// - `AdapterError::CorruptAccountData` for unusable account data
    pub fn setup(&mut self, choice: SetupChoice) -> Result<Vec<HostAction>, AdapterError> {
        let (mut core, contacts) = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingSetup { core, contacts } => (core, contacts),
            other => {
                self.phase = other;
                return Err(AdapterError::NoSession);
            },
        };

        match Self::load_choice(&mut core, choice) {
            Ok(blob) => {
                tracing::info!(imported = blob.is_some(), "account setup complete");
                let stored = blob.as_ref().map_or_else(String::new, AccountBlob::to_config_string);
                let store = HostAction::StoreSetting {
                    key: SettingKey::Messenger,
                    value: Some(stored),
                };
                let mut actions = vec![store];
                actions.extend(self.start_session(core, contacts));
                Ok(self.track_settings(actions))
            },
            Err(err) => {
                tracing::warn!(%err, "account setup failed");
                self.phase = Phase::AwaitingSetup { core, contacts };
                Err(err)
            },
        }
    }

    /// Import account data during setup.
    ///
    /// # Errors
    ///
    /// As for [`Dispatcher::setup`].
    pub fn import_account(&mut self, bytes: Vec<u8>) -> Result<Vec<HostAction>, AdapterError> {
        self.setup(SetupChoice::ImportBytes(bytes))
    }

    /// Run the network tick. No-op without a session.
    pub fn network_tick(&mut self) -> Vec<HostAction> {
        let actions = match &mut self.phase {
            Phase::Active(session) => session.network_tick(),
            _ => return Vec::new(),
        };
        self.track_settings(actions)
    }

    /// Run the connectivity tick. No-op without a session.
    pub fn connectivity_tick(&mut self) -> Vec<HostAction> {
        let actions = match &mut self.phase {
            Phase::Active(session) => session.connectivity_tick(),
            _ => return Vec::new(),
        };
        self.track_settings(actions)
    }

    /// Log out.
    ///
    /// Ticks are cancelled first, then the account state is stored (the empty
    /// string when the core has nothing to save), then the core is released.
    pub fn close(&mut self) -> Vec<HostAction> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => Vec::new(),
            Phase::AwaitingSetup { .. } => {
                tracing::info!("closing before account setup");
                Vec::new()
            },
            Phase::Active(session) => {
                let mut actions = vec![HostAction::CancelTicks];
                match session.export() {
                    Ok(export) => {
                        tracing::debug!(empty = export.is_empty(), "storing account state");
                        actions.push(HostAction::StoreSetting {
                            key: SettingKey::Messenger,
                            value: Some(export.to_config_string()),
                        });
                    },
                    Err(err) => {
                        tracing::warn!(%err, "could not serialize account, keeping stored copy");
                    },
                }
                drop(session.end());
                tracing::info!("session closed");
                self.track_settings(actions)
            },
        }
    }

    /// Send an instant message to a contact.
    ///
    /// # Errors
    ///
    /// - `AdapterError::UnknownContact` if `to` is not a contact's key
    /// - otherwise as for [`Session::send_message`]
    pub fn send_im(&mut self, to: &str, text: &str) -> Result<Delivery, AdapterError> {
        let session = self.active_mut()?;
        let key = PublicKey::parse(to).map_err(|_| AdapterError::UnknownContact(to.to_string()))?;
        session.send_message(&key, text)
    }

    /// Change own status.
    ///
    /// # Errors
    ///
    /// - `AdapterError::UnknownStatus` for an identifier outside the table
    pub fn set_status(
        &mut self,
        status_id: &str,
        message: Option<&str>,
    ) -> Result<(), AdapterError> {
        self.active_mut()?.set_status(status_id, message)
    }

    /// Add a contact typed in by the user.
    ///
    /// # Errors
    ///
    /// As for [`Session::add_contact`].
    pub fn add_contact(
        &mut self,
        name: &str,
        invite: &str,
    ) -> Result<Vec<HostAction>, AdapterError> {
        let actions = self.active_mut()?.add_contact(name, invite)?;
        Ok(self.track_settings(actions))
    }

    /// Remove a contact. Returns false if it was not known.
    ///
    /// # Errors
    ///
    /// - `AdapterError::UnknownContact` if `name` is not a public key
    pub fn remove_contact(&mut self, name: &str) -> Result<bool, AdapterError> {
        let session = self.active_mut()?;
        let key =
            PublicKey::parse(name).map_err(|_| AdapterError::UnknownContact(name.to_string()))?;
        Ok(session.remove_contact(&key))
    }

    /// Answer a friend request.
    ///
    /// # Errors
    ///
    /// As for [`Session::authorize`].
    pub fn authorize(
        &mut self,
        request: RequestId,
        decision: Decision,
    ) -> Result<Vec<HostAction>, AdapterError> {
        let actions = self.active_mut()?.authorize(request, decision)?;
        Ok(self.track_settings(actions))
    }

    /// Change own nickname.
    ///
    /// # Errors
    ///
    /// - `AdapterError::NoSession` without a session
    pub fn set_nickname(&mut self, name: &str) -> Result<Vec<HostAction>, AdapterError> {
        let actions = self.active_mut()?.set_nickname(name);
        Ok(self.track_settings(actions))
    }

    /// Show own friend address.
    ///
    /// # Errors
    ///
    /// - `AdapterError::NoSession` without a session
    pub fn show_account_id(&self) -> Result<Vec<HostAction>, AdapterError> {
        Ok(vec![self.active()?.account_id_notice()])
    }

    /// Serialize the current account state.
    ///
    /// # Errors
    ///
    /// As for [`Session::export`].
    pub fn export(&self) -> Result<AccountExport, AdapterError> {
        self.active()?.export()
    }

    /// File name to offer when exporting.
    ///
    /// # Errors
    ///
    /// - `AdapterError::NoSession` without a session
    pub fn suggested_export_name(&self) -> Result<String, AdapterError> {
        Ok(suggested_export_name(&self.active()?.address().public_key()))
    }

    /// Write account data to `path`. Nothing is written when the core has
    /// nothing to save.
    ///
    /// # Errors
    ///
    /// - `AdapterError::Io` if the file cannot be written
    pub fn export_account(&self, path: &Path) -> Result<Vec<HostAction>, AdapterError> {
        match self.export()? {
            AccountExport::Empty => {
                tracing::info!(path = %path.display(), "no account data to export");
            },
            AccountExport::Blob(blob) => {
                write_account_file(path, &blob)?;
                tracing::info!(path = %path.display(), size = blob.size(), "account exported");
            },
        }
        Ok(Vec::new())
    }

    /// Execute a host command, turning errors into notifications.
    pub fn handle(&mut self, command: HostCommand) -> Vec<HostAction> {
        match command {
            HostCommand::Setup(choice) => match self.setup(choice) {
                Ok(actions) => actions,
                Err(err) => {
                    let mut actions = Self::report(&err);
                    if self.is_awaiting_setup() {
                        actions.push(HostAction::setup_prompt());
                    }
                    actions
                },
            },
            HostCommand::SendMessage { to, text } => match self.send_im(&to, &text) {
                Ok(delivery) => {
                    tracing::debug!(%to, ?delivery, "message handled");
                    Vec::new()
                },
                Err(err) => Self::report(&err),
            },
            HostCommand::SetStatus { status_id, message } => {
                match self.set_status(&status_id, message.as_deref()) {
                    Ok(()) => Vec::new(),
                    Err(err) => Self::report(&err),
                }
            },
            HostCommand::AddContact { name, invite } => match self.add_contact(&name, &invite) {
                Ok(actions) => actions,
                Err(err @ AdapterError::InvalidIdentityFormat(_)) => {
                    tracing::debug!(%err, "rejecting contact");
                    vec![
                        HostAction::error(INVALID_ADDRESS_TEXT, None),
                        HostAction::RemoveContact { name },
                    ]
                },
                Err(err @ AdapterError::FriendAddRejected(_)) => {
                    let mut actions = Self::report(&err);
                    actions.push(HostAction::RemoveContact { name });
                    actions
                },
                Err(err) => Self::report(&err),
            },
            HostCommand::RemoveContact { name } => match self.remove_contact(&name) {
                Ok(removed) => {
                    tracing::debug!(%name, removed, "contact removed");
                    Vec::new()
                },
                Err(err) => Self::report(&err),
            },
            HostCommand::Authorize { request, decision } => {
                self.authorize(request, decision).unwrap_or_else(|err| Self::report(&err))
            },
            HostCommand::SetNickname(name) => {
                self.set_nickname(&name).unwrap_or_else(|err| Self::report(&err))
            },
            HostCommand::ShowAccountId => {
                self.show_account_id().unwrap_or_else(|err| Self::report(&err))
            },
            HostCommand::ExportAccount { path } => {
                self.export_account(&path).unwrap_or_else(|err| Self::report(&err))
            },
            HostCommand::Close => self.close(),
        }
    }

    fn report(err: &AdapterError) -> Vec<HostAction> {
        if !err.is_user_visible() {
            tracing::debug!(%err, "command ignored");
            return Vec::new();
        }

        tracing::warn!(%err, "command failed");
        let action = match err {
            AdapterError::Io { context, reason } => {
                HostAction::error(*context, Some(reason.clone()))
            },
            AdapterError::CorruptAccountData(inner) => {
                HostAction::error(INVALID_ACCOUNT_FILE_TEXT, Some(inner.to_string()))
            },
            other => HostAction::error(other.to_string(), None),
        };
        vec![action]
    }
}
