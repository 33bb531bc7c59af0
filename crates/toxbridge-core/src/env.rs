//! Environment abstraction for deterministic testing.
//!
//! Decouples adapter logic from the system clock. Production uses
//! [`SystemEnv`]; the simulation harness provides a manually advanced clock so
//! message timestamps are reproducible.

use std::time::{SystemTime, UNIX_EPOCH};

/// Abstract environment providing wall-clock time.
pub trait Environment: Clone + 'static {
    /// Current wall-clock time in seconds since the Unix epoch.
    ///
    /// Used to timestamp received messages.
    fn unix_time(&self) -> u64;
}

/// Production environment backed by the system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn unix_time(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
    }
}
