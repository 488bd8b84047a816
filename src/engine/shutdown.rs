//! Cooperative cancellation for the tail loop.
//!
//! The engine checks the signal at each suspension point (backend calls and the inter-poll
//! sleep). A keyboard interrupt flips it through [`spawn_ctrl_c_listener`].

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Triggers shutdown; cheap to clone
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

/// Observes shutdown
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/signal pair
pub fn channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        log::debug!("Shutdown triggered");
        self.tx.send_replace(true);
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is triggered. Never resolves if every handle is dropped first.
    /// Cancel safe.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Forward the first Ctrl-C to `handle`.
///
/// Installing the listener replaces the default SIGINT behaviour, so call it only once the
/// interactive startup phase is over.
pub fn spawn_ctrl_c_listener(handle: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => handle.trigger(),
            Err(e) => log::warn!("Unable to listen for Ctrl-C: {}", e),
        }
    })
}
