//! Outbound signals from the engine to its host.

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSignal {
    /// Install finished; the host may activate without a waiting period.
    SkipWaiting,
    /// Activation finished; start serving all existing clients now.
    ClaimClients,
}

/// Receiver side of [`HostSignal`]s.
pub trait HostSignals: Send + Sync {
    fn signal(&self, signal: HostSignal);
}

impl HostSignals for mpsc::UnboundedSender<HostSignal> {
    fn signal(&self, signal: HostSignal) {
        if self.send(signal).is_err() {
            tracing::debug!(?signal, "host signal receiver dropped");
        }
    }
}

/// Host that only records signals in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSignals;

impl HostSignals for LogSignals {
    fn signal(&self, signal: HostSignal) {
        tracing::info!(?signal, "host signal");
    }
}
