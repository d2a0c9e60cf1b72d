//! Graceful shutdown handling.

use std::io;

use log::warn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` on the first Ctrl-C.
///
/// The running batch stops admitting checks, lets in-flight ones finish, and
/// saves its checkpoint.
pub fn spawn_ctrl_c_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            signal = tokio::signal::ctrl_c() => on_signal(signal, &cancel),
        }
    })
}

/// Cancels only on a real interrupt. A listener that failed to install
/// leaves the run going without Ctrl-C support.
fn on_signal(signal: io::Result<()>, cancel: &CancellationToken) {
    match signal {
        Ok(()) => {
            warn!("Interrupt received, finishing in-flight checks and saving progress");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to listen for Ctrl-C, interrupts will not be handled: {e}"),
    }
}

/// Stops the signal listener once the run is over.
pub async fn shutdown_gracefully(listener: Option<JoinHandle<()>>) {
    if let Some(listener) = listener {
        listener.abort();
        let _ = listener.await;
    }
}
