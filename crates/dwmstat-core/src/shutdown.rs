//! Cooperative shutdown on SIGINT and SIGTERM.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::info;

/// Longest uninterrupted sleep slice.
pub const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// A cloneable flag set once when the process should stop.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token and routes SIGINT/SIGTERM into it.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let shutdown = Self::new();
        let handle = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            handle.request();
        })?;
        Ok(shutdown)
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` in slices, returning early once shutdown is
    /// requested. Returns `false` if the sleep was cut short.
    pub fn sleep(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if self.is_requested() {
                return false;
            }
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        !self.is_requested()
    }
}
