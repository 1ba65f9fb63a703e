//! Relayer metrics.
//!
//! Recorded through the global `metrics` recorder. Nothing is exported unless the embedding
//! process installs a recorder.

use metrics::Counter;
use metrics_derive::Metrics;

/// Per-route relay metrics.
#[derive(Metrics, Clone)]
#[metrics(scope = "lz_relayer")]
pub struct RelayMetrics {
    /// Number of `PacketSent` events picked up
    packets_seen: Counter,
    /// Number of packets executed on the destination
    packets_delivered: Counter,
    /// Number of packets left undelivered because of their on-chain state
    packets_abandoned: Counter,
}

impl RelayMetrics {
    /// Metrics for packets relayed from `source` to `destination`.
    pub fn for_route(source: &str, destination: &str) -> Self {
        Self::new_with_labels(&[
            ("source", source.to_string()),
            ("destination", destination.to_string()),
        ])
    }

    pub fn record_seen(&self) {
        self.packets_seen.increment(1);
    }

    pub fn record_delivered(&self) {
        self.packets_delivered.increment(1);
    }

    pub fn record_abandoned(&self) {
        self.packets_abandoned.increment(1);
    }
}
