use std::{
    collections::BTreeSet,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

type InFlight = Arc<Mutex<BTreeSet<String>>>;

/// Cancels running scans on SIGINT or SIGTERM. Scans stop between pages,
/// so the last saved watermark stays valid. Scans register themselves with
/// [`ShutdownCoordinator::track`] so an interrupt can name what it cut short.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
    shutdown_requested: Arc<AtomicBool>,
    in_flight: InFlight,
}

/// Marks one scan as running until dropped.
pub struct ScanGuard {
    label: String,
    in_flight: InFlight,
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.label);
    }
}

impl ShutdownCoordinator {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::default(),
        }
    }

    pub fn register_handlers(&self) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            coordinator.request_shutdown(signal);
        });
    }

    pub fn track(&self, connector_id: &str, datasource_id: &str) -> ScanGuard {
        let label = format!("{connector_id}/{datasource_id}");
        lock(&self.in_flight).insert(label.clone());
        ScanGuard {
            label,
            in_flight: self.in_flight.clone(),
        }
    }

    /// Scans that are still running, as `connector/datasource`.
    pub fn running(&self) -> Vec<String> {
        lock(&self.in_flight).iter().cloned().collect()
    }

    pub fn request_shutdown(&self, reason: &str) {
        if self.shutdown_requested.swap(true, Ordering::SeqCst) {
            return;
        }
        let running = self.running();
        info!(
            reason,
            interrupted = running.len(),
            scans = ?running,
            "Stopping scans, watermarks of finished pages are kept"
        );
        self.cancel_token.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, BTreeSet<String>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Resolves with the name of the first termination signal received.
async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(%err, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(%err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Exit codes for the CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    ShutdownRequested = 130, // Standard exit code for SIGINT
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
