// src/shutdown.rs

use tokio::sync::watch;

/// Creates the shutdown signal shared by every worker. Send `true` to stop.
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Resolves once shutdown has been requested or the sender is gone.
pub async fn requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Non-blocking check, for use between timer ticks.
pub fn is_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}
