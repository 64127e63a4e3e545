//! Signal handling for graceful shutdown

use futures::stream::StreamExt;
use signal_hook_tokio::Signals;
use tracing::debug;

/// Wait for a shutdown signal and report which one arrived.
///
/// Listens for SIGTERM and SIGINT. Only the binary uses this, to cut a round
/// short cleanly; the engine itself never installs signal handlers.
pub async fn shutdown_signal() -> i32 {
    let mut signals = Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ])
    .expect("Failed to create signal handler");

    match signals.next().await {
        Some(signal) => {
            debug!("Caught signal {}", signal);
            signal
        }
        // The signal stream only closes on handle teardown; treat it as
        // a shutdown request all the same.
        None => 0,
    }
}

/// Human-readable name for the signals [`shutdown_signal`] listens for.
pub fn signal_name(signal: i32) -> &'static str {
    match signal {
        s if s == signal_hook::consts::SIGTERM => "SIGTERM",
        s if s == signal_hook::consts::SIGINT => "SIGINT",
        _ => "unknown",
    }
}
