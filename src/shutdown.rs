/*!
# Shutdown Coordinator

A single `AtomicBool` flipped by a SIGINT handler, polled once per accept-loop
iteration by both front-ends and once per LF dispatch cycle. This is the
whole of the source's process-global "free everything on signal" lambda,
minus the freeing: Rust's `Drop` impls already release the listener, graph,
and worker threads once `main` returns.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared shutdown flag, observed cooperatively rather than by cancelling
/// any thread.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    terminate: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Registers a `ctrlc` SIGINT handler that flips the flag, and returns
    /// the coordinator observing it. Fails only if a handler is already
    /// registered for this process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let terminate = Arc::new(AtomicBool::new(false));
        let handler_flag = Arc::clone(&terminate);
        ctrlc::set_handler(move || {
            tracing::info!("received shutdown signal");
            handler_flag.store(true, Ordering::Release);
        })?;
        Ok(Self { terminate })
    }

    /// Builds a coordinator with no signal handler attached, for embedding
    /// (tests, the `Demo`-style single-threaded driver) where the caller
    /// flips the flag itself via [`ShutdownCoordinator::trigger`].
    pub fn manual() -> Self {
        Self {
            terminate: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn trigger(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_starts_clear_and_observes_a_trigger() {
        let coordinator = ShutdownCoordinator::manual();
        assert!(!coordinator.is_shutting_down());
        coordinator.trigger();
        assert!(coordinator.is_shutting_down());
    }

    #[test]
    fn clones_observe_the_same_flag() {
        let coordinator = ShutdownCoordinator::manual();
        let clone = coordinator.clone();
        coordinator.trigger();
        assert!(clone.is_shutting_down());
    }
}
