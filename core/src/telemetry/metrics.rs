use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug)]
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Engine counters since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub alerts_dispatched: u64,
    pub overspeed_reports: u64,
    pub sync_ok: u64,
    pub sync_failures: u64,
    pub selections_rejected: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn bump(&self, field: impl FnOnce(&mut MetricsSnapshot) -> &mut u64) {
        if let Ok(mut metrics) = self.inner.lock() {
            *field(&mut *metrics) += 1;
        }
    }

    pub fn record_tick(&self) {
        self.bump(|m| &mut m.ticks);
    }

    pub fn record_alert(&self) {
        self.bump(|m| &mut m.alerts_dispatched);
    }

    pub fn record_overspeed(&self) {
        self.bump(|m| &mut m.overspeed_reports);
    }

    pub fn record_sync_ok(&self) {
        self.bump(|m| &mut m.sync_ok);
    }

    pub fn record_sync_failure(&self) {
        self.bump(|m| &mut m.sync_failures);
    }

    pub fn record_rejection(&self) {
        self.bump(|m| &mut m.selections_rejected);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = MetricsRecorder::new();
        metrics.record_tick();
        metrics.record_tick();
        metrics.record_sync_failure();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.sync_failures, 1);
        assert_eq!(snapshot.alerts_dispatched, 0);
    }
}
