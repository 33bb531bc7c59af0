//! Host that records every action and keeps a model of host state.

use std::{collections::BTreeMap, convert::Infallible};

use toxbridge_adapter::{Host, HostAction, NotifyLevel, RequestId};
use toxbridge_core::{AccountConfig, PublicKey, StatusValue};

/// A contact on the simulated host's list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostContact {
    /// Alias shown instead of the name.
    pub alias: Option<String>,
    /// Last status shown.
    pub status: Option<StatusValue>,
}

/// A message shown in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Sender.
    pub from: PublicKey,
    /// Text.
    pub text: String,
    /// Receipt time.
    pub timestamp: u64,
}

/// A dialog shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotifyLevel,
    /// Title.
    pub title: String,
    /// Main text.
    pub primary: String,
    /// Detail text.
    pub secondary: Option<String>,
}

/// A friend request prompt shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPrompt {
    /// Token to answer with.
    pub request: RequestId,
    /// Requester.
    pub from: PublicKey,
    /// Request text.
    pub message: Option<String>,
}

/// Simulated IM host.
#[derive(Debug, Default)]
pub struct RecordingHost {
    trace: Vec<HostAction>,
    initial_contacts: Vec<String>,
    config: AccountConfig,
    contacts: BTreeMap<String, HostContact>,
    messages: Vec<ReceivedMessage>,
    notifications: Vec<Notification>,
    prompts: Vec<AuthorizationPrompt>,
    setup_prompts: usize,
    connected: bool,
    progress: Option<(&'static str, u32, u32)>,
    display_name: Option<String>,
    ticking: bool,
}

impl RecordingHost {
    /// Host with the given stored settings and an empty contact list.
    pub fn new(config: AccountConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Add contacts present before login.
    #[must_use]
    pub fn with_contacts(mut self, keys: impl IntoIterator<Item = PublicKey>) -> Self {
        for key in keys {
            let name = key.to_hex();
            self.initial_contacts.push(name.clone());
            self.contacts.insert(name, HostContact::default());
        }
        self
    }

    /// Execute one action against the model.
    pub fn record(&mut self, action: HostAction) {
        match &action {
            HostAction::Progress { text, step, total } => {
                if *step == 0 {
                    self.connected = false;
                }
                self.progress = Some((*text, *step, *total));
            },
            HostAction::SetConnected => self.connected = true,
            HostAction::SetDisplayName(name) => self.display_name = Some(name.clone()),
            HostAction::StoreSetting { key, value } => self.config.apply(*key, value.clone()),
            HostAction::ContactStatus { key, status } => {
                if let Some(contact) = self.contacts.get_mut(&key.to_hex()) {
                    contact.status = Some(status.clone());
                }
            },
            HostAction::MessageReceived { from, text, timestamp } => {
                self.messages.push(ReceivedMessage {
                    from: *from,
                    text: text.clone(),
                    timestamp: *timestamp,
                });
            },
            HostAction::AliasContact { key, alias } => {
                if let Some(contact) = self.contacts.get_mut(&key.to_hex()) {
                    contact.alias = Some(alias.clone());
                }
            },
            HostAction::AddContact { key, alias } => {
                let contact = self.contacts.entry(key.to_hex()).or_default();
                if alias.is_some() {
                    contact.alias.clone_from(alias);
                }
            },
            HostAction::RemoveContact { name } => {
                self.contacts.remove(name);
            },
            HostAction::RenameContact { from, to } => {
                let contact = self.contacts.remove(from).unwrap_or_default();
                self.contacts.insert(to.to_hex(), contact);
            },
            HostAction::RequestAuthorization { request, from, message, .. } => {
                self.prompts.push(AuthorizationPrompt {
                    request: *request,
                    from: *from,
                    message: message.clone(),
                });
            },
            HostAction::RequestAccountSetup { .. } => self.setup_prompts += 1,
            HostAction::Notify { level, title, primary, secondary } => {
                self.notifications.push(Notification {
                    level: *level,
                    title: title.clone(),
                    primary: primary.clone(),
                    secondary: secondary.clone(),
                });
            },
            HostAction::ScheduleTicks { .. } => self.ticking = true,
            HostAction::CancelTicks => {
                self.ticking = false;
                self.connected = false;
            },
        }
        self.trace.push(action);
    }

    /// The user typed a contact into the list.
    pub fn add_typed_contact(&mut self, name: &str) {
        self.contacts.insert(name.to_string(), HostContact::default());
    }

    /// Every action so far, in order.
    pub fn trace(&self) -> &[HostAction] {
        &self.trace
    }

    /// Contact names present before login.
    pub fn initial_contacts(&self) -> &[String] {
        &self.initial_contacts
    }

    /// Stored settings.
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Contact list by name.
    pub fn contacts(&self) -> &BTreeMap<String, HostContact> {
        &self.contacts
    }

    /// Contact entry for `key`.
    pub fn contact(&self, key: &PublicKey) -> Option<&HostContact> {
        self.contacts.get(&key.to_hex())
    }

    /// Contacts whose names are public keys.
    pub fn contact_keys(&self) -> Vec<PublicKey> {
        self.contacts.keys().filter_map(|name| PublicKey::parse(name).ok()).collect()
    }

    /// Received messages.
    pub fn messages(&self) -> &[ReceivedMessage] {
        &self.messages
    }

    /// Dialogs shown.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Error dialogs shown.
    pub fn errors(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| n.level == NotifyLevel::Error)
    }

    /// Friend request prompts shown.
    pub fn prompts(&self) -> &[AuthorizationPrompt] {
        &self.prompts
    }

    /// Number of account setup prompts shown.
    pub fn setup_prompts(&self) -> usize {
        self.setup_prompts
    }

    /// Returns true if the account shows as connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Last progress indicator.
    pub fn progress(&self) -> Option<(&'static str, u32, u32)> {
        self.progress
    }

    /// Display name set by the adapter.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns true while ticks are scheduled.
    pub fn is_ticking(&self) -> bool {
        self.ticking
    }
}

impl Host for RecordingHost {
    type Error = Infallible;

    fn apply(&mut self, action: HostAction) -> Result<(), Infallible> {
        self.record(action);
        Ok(())
    }
}
