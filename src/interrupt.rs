//! # Interrupt Handling
//!
//! Turns the operator's Ctrl+C into a stop signal on a broadcast channel.
//! The scheduler selects on its receiver while waiting for workers; once the
//! signal fires it records the interruption and stops waiting.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Owner of the stop channel
#[derive(Debug, Clone)]
pub struct InterruptController {
    sender: broadcast::Sender<()>,
}

impl InterruptController {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    /// Receiver observing every stop signal sent after this call
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Fire the stop signal
    pub fn trigger(&self) {
        if self.sender.send(()).is_err() {
            debug!("Stop signal sent with no active receivers");
        }
    }

    /// Listen for Ctrl+C in the background and fire the stop signal on it
    pub fn install(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => controller.trigger(),
                Err(e) => warn!("Unable to listen for Ctrl+C: {}", e),
            }
        })
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let controller = InterruptController::new();
        let mut first = controller.subscribe();
        let mut second = controller.subscribe();

        controller.trigger();

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers_is_harmless() {
        InterruptController::new().trigger();
    }
}
