//! Tokio runtime driving a [`Dispatcher`].
//!
//! Hosts without an event loop of their own can hand the dispatcher to a
//! [`Runtime`]. It owns the two tick timers, feeds host commands from a
//! channel and forwards every resulting action to a [`Host`].

use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{Instant, Interval, MissedTickBehavior},
};
use toxbridge_core::{Environment, PublicKey};

use crate::{
    dispatcher::Dispatcher,
    event::{HostAction, HostCommand},
    host::Host,
    network::NetworkCore,
};

/// Capacity of the command channel.
pub const COMMAND_BUFFER: usize = 64;

/// Runs a dispatcher until the host closes the account.
pub struct Runtime<C, E, H>
where
    C: NetworkCore,
    E: Environment,
    H: Host,
{
    dispatcher: Dispatcher<C, E>,
    host: H,
    commands: mpsc::Receiver<HostCommand>,
    network: Option<Interval>,
    connectivity: Option<Interval>,
}

impl<C, E, H> Runtime<C, E, H>
where
    C: NetworkCore,
    E: Environment,
    H: Host,
{
    /// Create a runtime and the sender the host uses to submit commands.
    pub fn new(dispatcher: Dispatcher<C, E>, host: H) -> (Self, mpsc::Sender<HostCommand>) {
        let (sender, commands) = mpsc::channel(COMMAND_BUFFER);
        let runtime = Self { dispatcher, host, commands, network: None, connectivity: None };
        (runtime, sender)
    }

    /// Log in and run until [`HostCommand::Close`] arrives or every sender is
    /// dropped, then log out.
    ///
    /// Returns the dispatcher and host for inspection.
    ///
    /// # Errors
    ///
    /// Returns the first error the host reports.
    pub async fn run(
        mut self,
        core: C,
        contacts: Vec<PublicKey>,
    ) -> Result<(Dispatcher<C, E>, H), H::Error> {
        let actions = self.dispatcher.login(core, contacts);
        self.dispatch(actions)?;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(HostCommand::Close) | None => break,
                    Some(command) => {
                        let actions = self.dispatcher.handle(command);
                        self.dispatch(actions)?;
                    },
                },
                () = next_tick(self.network.as_mut()) => {
                    let actions = self.dispatcher.network_tick();
                    self.dispatch(actions)?;
                },
                () = next_tick(self.connectivity.as_mut()) => {
                    let actions = self.dispatcher.connectivity_tick();
                    self.dispatch(actions)?;
                },
            }
        }

        let actions = self.dispatcher.close();
        self.dispatch(actions)?;
        tracing::debug!("runtime stopped");
        Ok((self.dispatcher, self.host))
    }

    fn dispatch(&mut self, actions: Vec<HostAction>) -> Result<(), H::Error> {
        for action in actions {
            match &action {
                HostAction::ScheduleTicks { network, connectivity } => {
                    self.network = Some(ticker(*network));
                    self.connectivity = Some(ticker(*connectivity));
                },
                HostAction::CancelTicks => {
                    self.network = None;
                    self.connectivity = None;
                },
                _ => {},
            }
            self.host.apply(action)?;
        }
        Ok(())
    }
}

fn ticker(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        },
        None => std::future::pending().await,
    }
}
