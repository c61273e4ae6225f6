//! Byte usage ratio.
//!
//! Tracks how many of the bytes currently resident in the cache have actually been
//! touched. A ratio well below 1 means lines are fetched mostly for bytes nobody reads.

use serde::Serialize;

use crate::events::{EventSink, Pass};

/// Resident and accessed byte totals at one commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UsageSample {
    /// Commit time.
    pub time: u64,
    /// Resident bytes that have been accessed.
    pub accessed: u64,
    /// Resident bytes.
    pub valid: u64,
}

impl UsageSample {
    /// `accessed / valid`, or 0 for an empty cache.
    pub fn ratio(&self) -> f64 {
        if self.valid == 0 {
            0.0
        } else {
            self.accessed as f64 / self.valid as f64
        }
    }
}

/// Accumulates `on_byte_usage` deltas and samples them at each commit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    accessed: i64,
    valid: i64,
    /// Highest resident byte count seen at a commit.
    pub peak_valid: u64,
    /// Samples taken at commits where the totals changed.
    pub samples: Vec<UsageSample>,
}

impl UsageStats {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resident bytes that have been accessed, right now.
    pub const fn accessed(&self) -> u64 {
        self.accessed as u64
    }

    /// Resident bytes, right now.
    pub const fn valid(&self) -> u64 {
        self.valid as u64
    }

    /// Current `accessed / valid`, or 0 for an empty cache.
    pub fn usage_ratio(&self) -> f64 {
        if self.valid == 0 {
            0.0
        } else {
            self.accessed as f64 / self.valid as f64
        }
    }

    /// Mean ratio over the samples of non-empty caches, or 0 without samples.
    pub fn mean_ratio(&self) -> f64 {
        let (sum, n) = self
            .samples
            .iter()
            .filter(|s| s.valid > 0)
            .fold((0.0, 0u64), |(sum, n), s| (sum + s.ratio(), n + 1));
        if n == 0 { 0.0 } else { sum / n as f64 }
    }
}

impl EventSink for UsageStats {
    fn on_byte_usage(&mut self, delta_accessed: i64, delta_valid: i64) {
        self.accessed += delta_accessed;
        self.valid += delta_valid;
        debug_assert!(self.accessed >= 0 && self.accessed <= self.valid);
    }

    fn commit(&mut self, time: u64) {
        let sample = UsageSample {
            time,
            accessed: self.accessed(),
            valid: self.valid(),
        };
        let changed = self
            .samples
            .last()
            .is_none_or(|last| last.accessed != sample.accessed || last.valid != sample.valid);
        if changed {
            self.samples.push(sample);
        }
        self.peak_valid = self.peak_valid.max(sample.valid);
    }

    fn begin_pass(&mut self, _pass: Pass) {
        *self = Self::default();
    }
}
