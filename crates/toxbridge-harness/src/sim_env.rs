//! Manually advanced clock.
//!
//! Clones share one clock, so a test can keep a handle and advance time while
//! the dispatcher owns another.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use toxbridge_core::Environment;

/// Wall-clock time at simulation start, seconds since the Unix epoch.
pub const SIM_EPOCH_SECS: u64 = 1_700_000_000;

/// Deterministic environment for simulation.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    elapsed_ms: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock at simulation start.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Time since simulation start.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    fn unix_time(&self) -> u64 {
        SIM_EPOCH_SECS + self.elapsed().as_secs()
    }
}
