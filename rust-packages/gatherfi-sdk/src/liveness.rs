//! Discard fetch results whose consumer has gone away.
//!
//! The request itself keeps running; only its result is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Held by the consumer. Dropping it (or calling `retire`) marks every token
/// handed out as dead.
#[derive(Debug)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

/// Cheap handle carried into in-flight fetches.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            alive: self.alive.clone(),
        }
    }

    pub fn retire(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Liveness {
    fn drop(&mut self) {
        self.retire();
    }
}

impl LivenessToken {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Await `fut`, returning its output only if the consumer is still there
    pub async fn deliver<F: Future>(&self, fut: F) -> Option<F::Output> {
        let output = fut.await;
        if self.is_alive() {
            Some(output)
        } else {
            tracing::debug!("Consumer gone, discarding fetch result");
            None
        }
    }
}
