//! In-memory latency histograms for Gateway calls, one per operation.
//! The HTTP gateway records, the stats route reads.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

/// Percentiles for one operation, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

/// Values stored in microseconds, 1us to 100s, 3 significant figures.
pub struct LatencyStats {
    inner: Mutex<BTreeMap<&'static str, Histogram<u64>>>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn record(&self, operation: &'static str, d: Duration) {
        let us = d.as_micros().clamp(1, 100_000_000) as u64;
        let Ok(mut map) = self.inner.lock() else { return };
        let histogram = match map.entry(operation) {
            std::collections::btree_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::btree_map::Entry::Vacant(e) => {
                let Ok(h) = Histogram::new_with_bounds(1, 100_000_000, 3) else { return };
                e.insert(h)
            }
        };
        let _ = histogram.record(us);
    }

    /// Summary per operation; operations without samples are absent.
    pub fn summary(&self) -> BTreeMap<&'static str, LatencySummary> {
        let Ok(map) = self.inner.lock() else {
            return BTreeMap::new();
        };
        map.iter()
            .filter(|(_, h)| h.len() > 0)
            .map(|(op, h)| {
                let ms = |q: f64| h.value_at_quantile(q) as f64 / 1000.0;
                (
                    *op,
                    LatencySummary {
                        samples: h.len(),
                        p50_ms: ms(0.5),
                        p95_ms: ms(0.95),
                        p99_ms: ms(0.99),
                    },
                )
            })
            .collect()
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}
