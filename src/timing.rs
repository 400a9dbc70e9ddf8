// SPDX-License-Identifier: Apache-2.0

//! Explicit scoped timers collected into a per-session report.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingEntry {
    pub count: u64,
    pub total: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct TimingReport {
    entries: BTreeMap<String, TimingEntry>,
}

impl TimingReport {
    pub fn record(&mut self, label: &str, elapsed: Duration) {
        let e = self.entries.entry(label.to_string()).or_default();
        e.count += 1;
        e.total += elapsed;
    }

    pub fn get(&self, label: &str) -> Option<&TimingEntry> {
        self.entries.get(label)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &TimingEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn log_summary(&self) {
        log::info!("timing summary:");
        for (label, e) in &self.entries {
            log::info!(
                "  {:<24} {:>6} call(s) {:>12.3} ms",
                label,
                e.count,
                e.total.as_secs_f64() * 1e3
            );
        }
    }
}

#[must_use = "a timer records nothing until finish() is called"]
pub struct ScopedTimer {
    label: &'static str,
    start: Instant,
}

impl ScopedTimer {
    pub fn start(label: &'static str) -> Self {
        ScopedTimer {
            label,
            start: Instant::now(),
        }
    }

    pub fn finish(self, report: &mut TimingReport) -> Duration {
        let elapsed = self.start.elapsed();
        log::debug!("<{}> took {:?}", self.label, elapsed);
        report.record(self.label, elapsed);
        elapsed
    }
}
