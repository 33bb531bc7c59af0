//! One simulated account: dispatcher, core, clock and host wired together.
//!
//! Every call returns the actions it produced and applies them to the
//! [`RecordingHost`], so tests can assert on either.

use std::time::Duration;

use toxbridge_adapter::{ConnectionConfig, Dispatcher, HostAction, HostCommand, Session};
use toxbridge_core::AccountConfig;

use crate::{RecordingHost, SimCore, SimEnv};

/// Simulated account.
pub struct SimWorld {
    env: SimEnv,
    cadence: ConnectionConfig,
    dispatcher: Dispatcher<SimCore, SimEnv>,
    host: RecordingHost,
}

impl SimWorld {
    /// World around a host; the dispatcher starts from the host's settings.
    pub fn new(host: RecordingHost) -> Self {
        let env = SimEnv::new();
        let cadence = ConnectionConfig::default();
        let dispatcher =
            Dispatcher::new(env.clone(), host.config().clone()).with_cadence(cadence);
        Self { env, cadence, dispatcher, host }
    }

    /// World with an empty host and the given settings.
    pub fn with_config(config: AccountConfig) -> Self {
        Self::new(RecordingHost::new(config))
    }

    /// Simulated clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Simulated host.
    pub fn host(&self) -> &RecordingHost {
        &self.host
    }

    /// Simulated host, mutably.
    pub fn host_mut(&mut self) -> &mut RecordingHost {
        &mut self.host
    }

    /// Dispatcher under test.
    pub fn dispatcher(&self) -> &Dispatcher<SimCore, SimEnv> {
        &self.dispatcher
    }

    /// Dispatcher under test, mutably.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<SimCore, SimEnv> {
        &mut self.dispatcher
    }

    /// Core of the active session.
    pub fn core(&self) -> Option<&SimCore> {
        self.dispatcher.session().map(Session::core)
    }

    /// Core of the active session, mutably.
    pub fn core_mut(&mut self) -> Option<&mut SimCore> {
        self.dispatcher.session_mut().map(Session::core_mut)
    }

    fn apply(&mut self, actions: Vec<HostAction>) -> Vec<HostAction> {
        for action in &actions {
            self.host.record(action.clone());
        }
        actions
    }

    /// Log in with `core` and the host's current contacts.
    pub fn login(&mut self, core: SimCore) -> Vec<HostAction> {
        let contacts = self.host.contact_keys();
        let actions = self.dispatcher.login(core, contacts);
        self.apply(actions)
    }

    /// Send a host command.
    pub fn command(&mut self, command: HostCommand) -> Vec<HostAction> {
        if let HostCommand::AddContact { name, .. } = &command {
            self.host.add_typed_contact(name);
        }
        let actions = self.dispatcher.handle(command);
        self.apply(actions)
    }

    /// One network tick, without moving the clock.
    pub fn network_tick(&mut self) -> Vec<HostAction> {
        let actions = self.dispatcher.network_tick();
        self.apply(actions)
    }

    /// One connectivity tick, without moving the clock.
    pub fn connectivity_tick(&mut self) -> Vec<HostAction> {
        let actions = self.dispatcher.connectivity_tick();
        self.apply(actions)
    }

    /// Advance the clock by `duration`, ticking at the scheduled cadence
    /// while the host has ticks scheduled.
    pub fn run_for(&mut self, duration: Duration) -> Vec<HostAction> {
        let step = self.cadence.network_interval;
        let mut elapsed = Duration::ZERO;
        let mut since_connectivity = Duration::ZERO;
        let mut out = Vec::new();

        while elapsed < duration && self.host.is_ticking() {
            self.env.advance(step);
            elapsed += step;
            since_connectivity += step;

            out.extend(self.network_tick());
            if since_connectivity >= self.cadence.connectivity_interval {
                since_connectivity = Duration::ZERO;
                out.extend(self.connectivity_tick());
            }
        }
        out
    }

    /// Log out.
    pub fn close(&mut self) -> Vec<HostAction> {
        let actions = self.dispatcher.close();
        self.apply(actions)
    }

    /// Log out and hand the host back, e.g. to log in again with its
    /// stored settings.
    pub fn into_host(mut self) -> RecordingHost {
        self.close();
        self.host
    }
}
