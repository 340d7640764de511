//! Coordinated shutdown for the prober and the health endpoint server.

use tokio::sync::broadcast;

/// Fan-out shutdown notification.
///
/// The prober task and the HTTP accept loop each hold a receiver; a single
/// `shutdown` call (typically from the ctrl-c handler) releases both. Clones
/// share the underlying channel, so any clone can trigger it.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    /// Obtain a receiver that resolves once shutdown is triggered.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Notify every subscriber. Safe to call with none listening.
    pub fn shutdown(&self) {
        let _ = self.sender.send(());
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
