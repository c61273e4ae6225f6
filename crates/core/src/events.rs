//! Cache event contract.
//!
//! The cache reports everything it does through the [`EventSink`] trait and never names a
//! concrete statistics type. This module provides:
//! 1. **The Contract:** [`EventSink`], every method defaulting to a no-op.
//! 2. **Fan-out:** [`SinkSet`] forwards each event to several sinks in registration order.
//! 3. **Recording:** [`EventLog`] keeps every event as a [`CacheEvent`] value.
//!
//! # Event order
//!
//! For each line-level piece of an access the cache emits, in order:
//!
//! - hit: `on_hit`, `on_byte_usage(newly_accessed, 0)`
//! - miss: `on_miss`, then for a displaced block `on_evict`,
//!   `on_byte_usage(-accessed, -line_size)` and `on_writeback` if it was dirty,
//!   then `on_fetch` and `on_byte_usage(newly_accessed, line_size)`
//!
//! The replay controller calls `commit` once per instruction, after all of its records.

use serde::Serialize;

use crate::common::data::AccessRecord;

/// Which replay pass is currently feeding a sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Pass {
    /// The only pass of a single-pass replay.
    Single,
    /// First pass of a two-pass replay; only lookahead sinks are active.
    First,
    /// Second pass of a two-pass replay; every sink is active.
    Second,
}

impl Pass {
    /// Returns `true` for the pass whose results a replay retains.
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::First)
    }
}

/// Receiver of cache events.
///
/// A sink may implement any subset of these methods.
#[allow(unused_variables)]
pub trait EventSink {
    /// A line-level piece of `record` hit, covering `bytes` bytes.
    fn on_hit(&mut self, record: &AccessRecord, bytes: u32) {}

    /// A line-level piece of `record` missed.
    fn on_miss(&mut self, record: &AccessRecord) {}

    /// Block `tag` was brought into set `set` at `time`.
    fn on_fetch(&mut self, set: usize, tag: u64, time: u64) {}

    /// Block `tag` left set `set` at `time`.
    fn on_evict(&mut self, set: usize, tag: u64, time: u64, was_dirty: bool) {}

    /// A dirty block was written back at `time`.
    fn on_writeback(&mut self, time: u64) {}

    /// Change in accessed bytes and valid (resident) bytes across the whole cache.
    fn on_byte_usage(&mut self, delta_accessed: i64, delta_valid: i64) {}

    /// Every record with logical time `time` has been applied.
    fn commit(&mut self, time: u64) {}

    /// Whether the sink needs a preliminary pass over the whole trace.
    fn lookahead(&self) -> bool {
        false
    }

    /// Called before the first event of each pass the sink takes part in.
    fn begin_pass(&mut self, pass: Pass) {}
}

/// Sink that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {}

/// Forwards events to a list of sinks in registration order.
///
/// With `lookahead_only` set, sinks whose [`EventSink::lookahead`] is `false` are skipped.
pub struct SinkSet<'s, 'a> {
    sinks: &'s mut [&'a mut dyn EventSink],
    lookahead_only: bool,
}

impl std::fmt::Debug for SinkSet<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.sinks.len())
            .field("lookahead_only", &self.lookahead_only)
            .finish()
    }
}

impl<'s, 'a> SinkSet<'s, 'a> {
    /// Fans out to every sink.
    pub fn new(sinks: &'s mut [&'a mut dyn EventSink]) -> Self {
        Self {
            sinks,
            lookahead_only: false,
        }
    }

    /// Fans out to lookahead sinks only.
    pub fn lookahead_only(sinks: &'s mut [&'a mut dyn EventSink]) -> Self {
        Self {
            sinks,
            lookahead_only: true,
        }
    }

    /// Number of sinks that receive events.
    pub fn active(&self) -> usize {
        self.sinks
            .iter()
            .filter(|s| !self.lookahead_only || s.lookahead())
            .count()
    }

    fn each(&mut self, mut f: impl FnMut(&mut dyn EventSink)) {
        let only = self.lookahead_only;
        for sink in self.sinks.iter_mut() {
            if !only || sink.lookahead() {
                f(&mut **sink);
            }
        }
    }
}

impl EventSink for SinkSet<'_, '_> {
    fn on_hit(&mut self, record: &AccessRecord, bytes: u32) {
        self.each(|s| s.on_hit(record, bytes));
    }

    fn on_miss(&mut self, record: &AccessRecord) {
        self.each(|s| s.on_miss(record));
    }

    fn on_fetch(&mut self, set: usize, tag: u64, time: u64) {
        self.each(|s| s.on_fetch(set, tag, time));
    }

    fn on_evict(&mut self, set: usize, tag: u64, time: u64, was_dirty: bool) {
        self.each(|s| s.on_evict(set, tag, time, was_dirty));
    }

    fn on_writeback(&mut self, time: u64) {
        self.each(|s| s.on_writeback(time));
    }

    fn on_byte_usage(&mut self, delta_accessed: i64, delta_valid: i64) {
        self.each(|s| s.on_byte_usage(delta_accessed, delta_valid));
    }

    fn commit(&mut self, time: u64) {
        self.each(|s| s.commit(time));
    }

    fn lookahead(&self) -> bool {
        self.sinks.iter().any(|s| s.lookahead())
    }

    fn begin_pass(&mut self, pass: Pass) {
        self.each(|s| s.begin_pass(pass));
    }
}

/// One emitted event, as recorded by [`EventLog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEvent {
    /// See [`EventSink::on_hit`].
    Hit {
        /// Record time.
        time: u64,
        /// Record thread.
        thread: u32,
        /// Record address (not the piece address).
        addr: u64,
        /// Bytes in the piece.
        bytes: u32,
    },
    /// See [`EventSink::on_miss`].
    Miss {
        /// Record time.
        time: u64,
        /// Record thread.
        thread: u32,
        /// Record address.
        addr: u64,
    },
    /// See [`EventSink::on_fetch`].
    Fetch {
        /// Set index.
        set: usize,
        /// Block tag.
        tag: u64,
        /// Fetch time.
        time: u64,
    },
    /// See [`EventSink::on_evict`].
    Evict {
        /// Set index.
        set: usize,
        /// Block tag.
        tag: u64,
        /// Eviction time.
        time: u64,
        /// Whether the block was dirty.
        dirty: bool,
    },
    /// See [`EventSink::on_writeback`].
    Writeback {
        /// Write-back time.
        time: u64,
    },
    /// See [`EventSink::on_byte_usage`].
    ByteUsage {
        /// Change in accessed bytes.
        accessed: i64,
        /// Change in valid bytes.
        valid: i64,
    },
    /// See [`EventSink::commit`].
    Commit {
        /// Committed time.
        time: u64,
    },
}

/// Sink that records every event of the passes it sees.
///
/// The log is cleared at the start of each pass, so after a replay it holds the
/// retained pass only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    /// Recorded events in emission order.
    pub events: Vec<CacheEvent>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events of a given shape, e.g. `log.count(|e| matches!(e, CacheEvent::Hit { .. }))`.
    pub fn count(&self, pred: impl Fn(&CacheEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    fn push(&mut self, event: CacheEvent) {
        self.events.push(event);
    }
}

impl EventSink for EventLog {
    fn on_hit(&mut self, record: &AccessRecord, bytes: u32) {
        self.push(CacheEvent::Hit {
            time: record.time,
            thread: record.thread,
            addr: record.addr,
            bytes,
        });
    }

    fn on_miss(&mut self, record: &AccessRecord) {
        self.push(CacheEvent::Miss {
            time: record.time,
            thread: record.thread,
            addr: record.addr,
        });
    }

    fn on_fetch(&mut self, set: usize, tag: u64, time: u64) {
        self.push(CacheEvent::Fetch { set, tag, time });
    }

    fn on_evict(&mut self, set: usize, tag: u64, time: u64, was_dirty: bool) {
        self.push(CacheEvent::Evict {
            set,
            tag,
            time,
            dirty: was_dirty,
        });
    }

    fn on_writeback(&mut self, time: u64) {
        self.push(CacheEvent::Writeback { time });
    }

    fn on_byte_usage(&mut self, delta_accessed: i64, delta_valid: i64) {
        self.push(CacheEvent::ByteUsage {
            accessed: delta_accessed,
            valid: delta_valid,
        });
    }

    fn commit(&mut self, time: u64) {
        self.push(CacheEvent::Commit { time });
    }

    fn begin_pass(&mut self, _pass: Pass) {
        self.events.clear();
    }
}
