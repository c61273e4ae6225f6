//! Still-in-use eviction classification.
//!
//! An eviction is still-in-use (SIU) if the same tag is fetched into the same set again
//! before the trace ends: the cache threw out a block the program had not finished
//! with. The time between the eviction and the re-fetch is the eviction duration.
//!
//! The sink works in both replay shapes:
//! - **Two passes:** pass 1 records every fetch time per block. In pass 2 the k-th
//!   eviction of a block is SIU iff the block has a (k+1)-th fetch, so each eviction
//!   is classified the moment it happens.
//! - **One pass:** an eviction stays pending until a re-fetch of the block resolves it.
//!   Totals match the two-pass result; only the per-commit timeline differs, since
//!   classifications arrive later.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::lifetime::BlockKey;
use crate::events::{EventSink, Pass};

/// Running SIU totals at one commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SiuSample {
    /// Commit time.
    pub time: u64,
    /// Evictions so far.
    pub evictions: u64,
    /// Evictions classified still-in-use so far.
    pub still_in_use: u64,
}

/// Lookahead sink classifying evictions as still-in-use.
#[derive(Clone, Debug, Serialize)]
pub struct SiuStats {
    #[serde(skip)]
    pass: Pass,
    #[serde(skip)]
    fetch_times: BTreeMap<BlockKey, Vec<u64>>,
    #[serde(skip)]
    evictions_seen: BTreeMap<BlockKey, usize>,
    #[serde(skip)]
    pending: BTreeMap<BlockKey, u64>,
    /// Evictions observed, including the final flush.
    pub evictions: u64,
    /// Evictions followed by a re-fetch of the same block.
    pub still_in_use: u64,
    /// Histogram of eviction durations (re-fetch time minus eviction time) for SIU evictions.
    pub durations: BTreeMap<u64, u64>,
    /// Samples taken at commits where the totals changed.
    pub timeline: Vec<SiuSample>,
}

impl Default for SiuStats {
    fn default() -> Self {
        Self {
            pass: Pass::Single,
            fetch_times: BTreeMap::new(),
            evictions_seen: BTreeMap::new(),
            pending: BTreeMap::new(),
            evictions: 0,
            still_in_use: 0,
            durations: BTreeMap::new(),
            timeline: Vec::new(),
        }
    }
}

impl SiuStats {
    /// Creates an empty classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evictions never followed by a re-fetch.
    pub const fn not_in_use(&self) -> u64 {
        self.evictions - self.still_in_use
    }

    /// `still_in_use / evictions`, or 0 without evictions.
    pub fn siu_ratio(&self) -> f64 {
        if self.evictions == 0 {
            0.0
        } else {
            self.still_in_use as f64 / self.evictions as f64
        }
    }

    /// Mean eviction duration over SIU evictions, or 0 without any.
    pub fn mean_duration(&self) -> f64 {
        if self.still_in_use == 0 {
            return 0.0;
        }
        let total: u64 = self.durations.iter().map(|(d, n)| d * n).sum();
        total as f64 / self.still_in_use as f64
    }

    /// Evictions still waiting for a re-fetch in single-pass mode.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn record_siu(&mut self, duration: u64) {
        self.still_in_use += 1;
        *self.durations.entry(duration).or_default() += 1;
    }
}

impl EventSink for SiuStats {
    fn on_fetch(&mut self, set: usize, tag: u64, time: u64) {
        let key = (set, tag);
        match self.pass {
            Pass::First => self.fetch_times.entry(key).or_default().push(time),
            Pass::Single => {
                if let Some(evicted_at) = self.pending.remove(&key) {
                    self.record_siu(time - evicted_at);
                }
            }
            Pass::Second => {}
        }
    }

    fn on_evict(&mut self, set: usize, tag: u64, time: u64, _was_dirty: bool) {
        let key = (set, tag);
        match self.pass {
            Pass::First => {}
            Pass::Second => {
                self.evictions += 1;
                let seen = self.evictions_seen.entry(key).or_default();
                let k = *seen;
                *seen += 1;
                let next_fetch = self
                    .fetch_times
                    .get(&key)
                    .and_then(|times| times.get(k + 1))
                    .copied();
                if let Some(next) = next_fetch {
                    self.record_siu(next - time);
                }
            }
            Pass::Single => {
                self.evictions += 1;
                let _ = self.pending.insert(key, time);
            }
        }
    }

    fn commit(&mut self, time: u64) {
        if !self.pass.is_final() {
            return;
        }
        let sample = SiuSample {
            time,
            evictions: self.evictions,
            still_in_use: self.still_in_use,
        };
        let changed = self.timeline.last().is_none_or(|last| {
            last.evictions != sample.evictions || last.still_in_use != sample.still_in_use
        });
        if changed {
            self.timeline.push(sample);
        }
    }

    fn lookahead(&self) -> bool {
        true
    }

    fn begin_pass(&mut self, pass: Pass) {
        let fetch_times = if pass == Pass::Second {
            std::mem::take(&mut self.fetch_times)
        } else {
            BTreeMap::new()
        };
        *self = Self {
            pass,
            fetch_times,
            ..Self::default()
        };
    }
}
