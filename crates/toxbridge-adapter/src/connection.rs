//! Connection state machine.
//!
//! Tracks whether the network core has joined the DHT. The state only moves on
//! a *change* of the sampled liveness, so a connectivity tick that sees the
//! same value twice produces nothing the second time.
//!
//! ```text
//! Disconnected --start--> Connecting --live--> Connected
//!                              ^                   |
//!                              +------not live-----+
//! ```
//!
//! `Disconnected` is only re-entered through [`Connection::stop`] at logout.

use std::time::Duration;

/// Network tick period: how often the core is iterated.
pub const NETWORK_INTERVAL: Duration = Duration::from_millis(100);

/// Connectivity tick period: how often DHT liveness is sampled.
pub const CONNECTIVITY_INTERVAL: Duration = Duration::from_secs(2);

/// Progress label while joining the network.
pub const CONNECTING_TEXT: &str = "Connecting";

/// Progress label once joined.
pub const CONNECTED_TEXT: &str = "Connected";

/// Number of steps in the connection progress indicator.
pub const PROGRESS_STEPS: u32 = 2;

/// Tick cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Network tick period.
    pub network_interval: Duration,
    /// Connectivity tick period.
    pub connectivity_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { network_interval: NETWORK_INTERVAL, connectivity_interval: CONNECTIVITY_INTERVAL }
    }
}

/// Connection states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session.
    Disconnected,
    /// Session started, waiting for DHT liveness.
    Connecting,
    /// DHT is live.
    Connected,
}

/// State change caused by a liveness sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `Connecting -> Connected`.
    Established,
    /// `Connected -> Connecting`.
    Lost,
}

/// Edge-triggered connection tracker.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    /// New tracker in [`ConnectionState::Disconnected`].
    pub fn new() -> Self {
        Self { state: ConnectionState::Disconnected }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns true once the DHT is live.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Enter `Connecting` at login.
    pub fn start(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// Enter `Disconnected` at logout.
    pub fn stop(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Feed one liveness sample.
    pub fn observe(&mut self, live: bool) -> Option<Transition> {
        match (self.state, live) {
            (ConnectionState::Connecting, true) => {
                self.state = ConnectionState::Connected;
                Some(Transition::Established)
            },
            (ConnectionState::Connected, false) => {
                self.state = ConnectionState::Connecting;
                Some(Transition::Lost)
            },
            _ => None,
        }
    }
}
