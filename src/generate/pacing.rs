//! Pacing policies for sequential generation calls.
//!
//! The batch loop calls `ready()` before every provider call; the policy decides
//! how long to wait. Time comes from `tokio::time`, so tests can run with a
//! paused clock instead of real delays.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Resolves once the next call may start.
    async fn ready(&self);
}

/// Enforces a minimum spacing between consecutive call starts.
#[derive(Debug)]
pub struct MinInterval {
    min: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinInterval {
    pub fn new(min: Duration) -> Self {
        Self {
            min,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Pacer for MinInterval {
    async fn ready(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.min).await;
        }
        *last = Some(Instant::now());
    }
}

/// No waiting at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

#[async_trait]
impl Pacer for Unpaced {
    async fn ready(&self) {}
}
