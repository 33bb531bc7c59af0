//! Headless host: logs every action and persists settings as they change.

use tokio::sync::mpsc;
use toxbridge_adapter::{Decision, Host, HostAction, HostCommand, NotifyLevel};
use toxbridge_core::AccountConfig;

use crate::settings::{SettingsError, SettingsFile};

/// Host without a user interface.
#[derive(Debug)]
pub struct LogHost {
    settings: SettingsFile,
    config: AccountConfig,
    replies: Option<mpsc::Sender<HostCommand>>,
    connected: bool,
}

impl LogHost {
    /// Host writing settings changes to `settings`, starting from `config`.
    pub fn new(settings: SettingsFile, config: AccountConfig) -> Self {
        Self { settings, config, replies: None, connected: false }
    }

    /// Accept every friend request by answering on `replies`.
    #[must_use]
    pub fn accept_requests(mut self, replies: mpsc::Sender<HostCommand>) -> Self {
        self.replies = Some(replies);
        self
    }

    /// Current settings.
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Returns true if the account shows as connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn answer(&self, command: HostCommand) {
        let Some(replies) = &self.replies else {
            return;
        };
        if let Err(e) = replies.try_send(command) {
            tracing::warn!(error = %e, "could not answer friend request");
        }
    }
}

impl Host for LogHost {
    type Error = SettingsError;

    fn apply(&mut self, action: HostAction) -> Result<(), SettingsError> {
        match action {
            HostAction::Progress { text, step, total } => {
                if step == 0 {
                    self.connected = false;
                }
                tracing::info!(step, total, "{text}");
            },
            HostAction::SetConnected => {
                self.connected = true;
                tracing::info!("account connected");
            },
            HostAction::SetDisplayName(name) => tracing::info!(%name, "display name"),
            HostAction::StoreSetting { key, value } => {
                tracing::debug!(key = key.as_str(), present = value.is_some(), "store setting");
                self.config.apply(key, value);
                self.settings.save(&self.config)?;
            },
            HostAction::ContactStatus { key, status } => {
                tracing::info!(%key, status = status.presence.id(), "contact status");
            },
            HostAction::MessageReceived { from, text, timestamp } => {
                tracing::info!(%from, timestamp, "message: {text}");
            },
            HostAction::AliasContact { key, alias } => {
                tracing::info!(%key, %alias, "contact alias");
            },
            HostAction::AddContact { key, alias } => {
                tracing::info!(%key, alias = alias.as_deref().unwrap_or(""), "contact added");
            },
            HostAction::RemoveContact { name } => tracing::info!(%name, "contact removed"),
            HostAction::RenameContact { from, to } => {
                tracing::info!(%from, %to, "contact renamed");
            },
            HostAction::RequestAuthorization { request, from, message, .. } => {
                tracing::info!(%from, message = message.as_deref().unwrap_or(""), "friend request");
                self.answer(HostCommand::Authorize { request, decision: Decision::Accept });
            },
            HostAction::RequestAccountSetup { .. } => {
                tracing::warn!("account setup required, pass --create or --import");
            },
            HostAction::Notify { level, title, primary, secondary } => {
                let detail = secondary.unwrap_or_default();
                match level {
                    NotifyLevel::Info => tracing::info!(%title, %detail, "{primary}"),
                    NotifyLevel::Error => tracing::error!(%title, %detail, "{primary}"),
                }
            },
            HostAction::ScheduleTicks { network, connectivity } => {
                tracing::debug!(?network, ?connectivity, "ticks scheduled");
            },
            HostAction::CancelTicks => {
                self.connected = false;
                tracing::debug!("ticks cancelled");
            },
        }
        Ok(())
    }
}
