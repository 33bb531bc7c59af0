//! Status translation between the host and the network core.
//!
//! The host speaks a four-way presence (online, away, busy, offline) with an
//! optional message. The core knows only a three-way user status (none, away,
//! busy) plus a per-friend liveness bit. Liveness always wins: a friend that
//! is not connected is offline whatever status it last announced.

/// Host-facing presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Available.
    Online,
    /// Away from keyboard.
    Away,
    /// Do not disturb.
    Busy,
    /// Not connected.
    Offline,
}

/// User status as the network core represents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CorePresence {
    /// No particular status.
    #[default]
    None,
    /// Away.
    Away,
    /// Busy.
    Busy,
}

/// Status class the host uses to group its status types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPrimitive {
    /// Reachable and available.
    Available,
    /// Reachable but away.
    Away,
    /// Reachable but unavailable.
    Unavailable,
    /// Not reachable.
    Offline,
}

/// One entry of the host's status type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusType {
    /// Stable identifier the host uses for this status.
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Host status class.
    pub primitive: StatusPrimitive,
    /// Presence this status stands for.
    pub presence: Presence,
}

const STATUS_TYPES: [StatusType; 4] = [
    StatusType {
        id: "tox_online",
        title: "Online",
        primitive: StatusPrimitive::Available,
        presence: Presence::Online,
    },
    StatusType {
        id: "tox_away",
        title: "Away",
        primitive: StatusPrimitive::Away,
        presence: Presence::Away,
    },
    StatusType {
        id: "tox_busy",
        title: "Busy",
        primitive: StatusPrimitive::Unavailable,
        presence: Presence::Busy,
    },
    StatusType {
        id: "tox_offline",
        title: "Offline",
        primitive: StatusPrimitive::Offline,
        presence: Presence::Offline,
    },
];

/// Status types offered to the host, each taking an optional `message`.
pub fn status_types() -> &'static [StatusType] {
    &STATUS_TYPES
}

impl Presence {
    /// Host status identifier.
    pub fn id(self) -> &'static str {
        self.status_type().id
    }

    /// Look up a presence by host status identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        STATUS_TYPES.iter().find(|t| t.id == id).map(|t| t.presence)
    }

    fn status_type(self) -> &'static StatusType {
        match self {
            Self::Online => &STATUS_TYPES[0],
            Self::Away => &STATUS_TYPES[1],
            Self::Busy => &STATUS_TYPES[2],
            Self::Offline => &STATUS_TYPES[3],
        }
    }

    /// Core user status for this presence.
    ///
    /// Online and offline both map to [`CorePresence::None`]; going offline is
    /// expressed by disconnecting, not by a status value.
    pub fn to_core(self) -> CorePresence {
        match self {
            Self::Away => CorePresence::Away,
            Self::Busy => CorePresence::Busy,
            Self::Online | Self::Offline => CorePresence::None,
        }
    }

    /// Host presence for a friend's core status and liveness.
    pub fn from_core(presence: CorePresence, online: bool) -> Self {
        if !online {
            return Self::Offline;
        }

        match presence {
            CorePresence::Away => Self::Away,
            CorePresence::Busy => Self::Busy,
            CorePresence::None => Self::Online,
        }
    }
}

/// Host status: presence plus optional free-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusValue {
    /// Presence.
    pub presence: Presence,
    /// Free-text status message.
    pub message: Option<String>,
}

impl StatusValue {
    /// Status without a message.
    pub fn new(presence: Presence) -> Self {
        Self { presence, message: None }
    }

    /// Attach a status message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Core user status for this value.
    pub fn to_core(&self) -> CorePresence {
        self.presence.to_core()
    }

    /// Message to push to the core, if there is a non-empty one.
    pub fn core_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}
