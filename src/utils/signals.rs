//! Signal handling for graceful shutdown

use futures::stream::StreamExt;
use signal_hook_tokio::Signals;
use tracing::{info, warn};

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// If the handler cannot be installed the future pends forever; the host
/// then only exits through its normal completion path.
pub async fn shutdown_signal() {
    let signals = Signals::new([signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT]);
    match signals {
        Ok(mut signals) => {
            if let Some(signal) = signals.next().await {
                info!("Received signal: {}", signal);
            }
        }
        Err(e) => {
            warn!("Failed to install signal handler: {}", e);
            futures::future::pending::<()>().await;
        }
    }
}
