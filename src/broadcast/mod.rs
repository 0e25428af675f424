/// Live total fan-out
///
/// Every mutation of the global counter publishes the new total here; SSE
/// streams subscribe and forward frames to connected clients. Dropping a
/// receiver (client disconnect) unsubscribes it automatically.
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

/// Broadcasts updated grand totals to live subscribers
#[derive(Debug)]
pub struct TotalBroadcaster {
    tx: broadcast::Sender<i64>,
}

impl TotalBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a new grand total
    ///
    /// Send errors only mean no subscriber is currently connected.
    pub fn publish(&self, total: i64) {
        let _ = self.tx.send(total);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<i64> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for TotalBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
