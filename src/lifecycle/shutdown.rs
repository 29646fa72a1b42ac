//! Shutdown coordination for the proxy.

use tokio::sync::broadcast;

use crate::lifecycle::signals;

/// Broadcasts a single "stop" to every long-running task.
///
/// Cloning hands out another trigger for the same channel.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver that resolves once `trigger` is called.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Calling again, or with no subscribers, is harmless.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Trigger once SIGINT or SIGTERM arrives.
    pub fn trigger_on_signal(&self) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            signals::wait_for_termination().await;
            this.trigger();
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
