//! Host trait for executing adapter actions.
//!
//! The [`Host`] trait decouples the [`crate::Runtime`] from a concrete IM
//! host. A host plugin implements it against its own UI, contact list and
//! settings store; tests and simulations record the actions instead.

use std::convert::Infallible;

use crate::event::HostAction;

/// Executes [`HostAction`]s against an IM host.
pub trait Host {
    /// Host-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Execute one action.
    ///
    /// Tick scheduling actions are handled by the runtime and are passed on
    /// for information only.
    ///
    /// # Errors
    ///
    /// Returns an error if the host can no longer accept actions. The runtime
    /// stops on the first error.
    fn apply(&mut self, action: HostAction) -> Result<(), Self::Error>;
}

/// Collects every action in order.
impl Host for Vec<HostAction> {
    type Error = Infallible;

    fn apply(&mut self, action: HostAction) -> Result<(), Self::Error> {
        self.push(action);
        Ok(())
    }
}
