//! Hit, miss and traffic counters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::common::data::AccessRecord;
use crate::events::{EventSink, Pass};

/// Per-thread line-level hit and miss counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ThreadCounts {
    /// Pieces that hit.
    pub hits: u64,
    /// Pieces that missed.
    pub misses: u64,
}

/// Counts every event kind the cache emits.
///
/// Hits and misses are counted per line-level piece, so a record spanning two lines
/// contributes two outcomes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HitMissStats {
    /// Pieces that hit.
    pub hits: u64,
    /// Pieces that missed.
    pub misses: u64,
    /// Bytes served by hits.
    pub hit_bytes: u64,
    /// Blocks fetched.
    pub fetches: u64,
    /// Blocks evicted, including the final flush.
    pub evictions: u64,
    /// Evicted blocks that were dirty.
    pub dirty_evictions: u64,
    /// Write-backs.
    pub writebacks: u64,
    /// Commits observed: one per instruction plus the final flush commit.
    pub commits: u64,
    /// Breakdown by thread id.
    pub per_thread: BTreeMap<u32, ThreadCounts>,
}

impl HitMissStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total line-level pieces observed.
    pub const fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// `hits / (hits + misses)`, or 0 when nothing was accessed.
    pub fn hit_ratio(&self) -> f64 {
        if self.accesses() == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses() as f64
        }
    }

    /// `misses / (hits + misses)`, or 0 when nothing was accessed.
    pub fn miss_ratio(&self) -> f64 {
        if self.accesses() == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses() as f64
        }
    }
}

impl EventSink for HitMissStats {
    fn on_hit(&mut self, record: &AccessRecord, bytes: u32) {
        self.hits += 1;
        self.hit_bytes += bytes as u64;
        self.per_thread.entry(record.thread).or_default().hits += 1;
    }

    fn on_miss(&mut self, record: &AccessRecord) {
        self.misses += 1;
        self.per_thread.entry(record.thread).or_default().misses += 1;
    }

    fn on_fetch(&mut self, _set: usize, _tag: u64, _time: u64) {
        self.fetches += 1;
    }

    fn on_evict(&mut self, _set: usize, _tag: u64, _time: u64, was_dirty: bool) {
        self.evictions += 1;
        if was_dirty {
            self.dirty_evictions += 1;
        }
    }

    fn on_writeback(&mut self, _time: u64) {
        self.writebacks += 1;
    }

    fn commit(&mut self, _time: u64) {
        self.commits += 1;
    }

    fn begin_pass(&mut self, _pass: Pass) {
        *self = Self::default();
    }
}
