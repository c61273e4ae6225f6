//! Block lifetime intervals.
//!
//! For every `(set, tag)` block the tracker records when it was resident in the cache
//! (alive intervals, `(time_in, time_out)`) and when it sat in main memory between an
//! eviction and the next fetch of the same tag into the same set (dead intervals,
//! `(time_out, time_in)`).
//!
//! An eviction is *still-in-use* exactly when the dead interval it opens is later
//! closed by a re-fetch. Dead intervals opened by the final flush stay open.
//!
//! Both bounds of a closing interval are recorded as `time - 1`, clamped so an interval
//! never ends before it starts (a block fetched and evicted within one instruction
//! gets the degenerate interval `(t, t)`).

use std::collections::BTreeMap;

use crate::common::error::SimError;

/// Key identifying a block: set index and tag.
pub type BlockKey = (usize, u64);

/// A closed or still-open time range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    /// First time covered.
    pub start: u64,
    /// Last time covered; `None` while open.
    pub end: Option<u64>,
}

impl Interval {
    /// An interval opened at `start`.
    pub const fn open(start: u64) -> Self {
        Self { start, end: None }
    }

    /// Returns `true` if the interval has not been closed.
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// `end - start` for a closed interval.
    pub fn duration(&self) -> Option<u64> {
        self.end.map(|end| end - self.start)
    }

    fn close(&mut self, time: u64) -> Self {
        self.end = Some(time.saturating_sub(1).max(self.start));
        *self
    }
}

/// Alive and dead intervals of one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockHistory {
    /// Cache residencies, oldest first.
    pub alive: Vec<Interval>,
    /// Main-memory residencies between an eviction and the following fetch, oldest first.
    pub dead: Vec<Interval>,
}

impl BlockHistory {
    /// Evictions that were followed by a re-fetch.
    pub fn still_in_use(&self) -> usize {
        self.dead.iter().filter(|d| !d.is_open()).count()
    }
}

/// Interval bookkeeping for every block seen during a pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LifetimeTracker {
    blocks: BTreeMap<BlockKey, BlockHistory>,
}

impl LifetimeTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fetch of `key` at `time`.
    ///
    /// Closes the block's open dead interval, if any, and returns it: a `Some` here
    /// means the preceding eviction was still-in-use. Then opens a new alive interval.
    pub fn fetch(&mut self, key: BlockKey, time: u64) -> Option<Interval> {
        let history = self.blocks.entry(key).or_default();
        let reclaimed = history
            .dead
            .last_mut()
            .filter(|d| d.is_open())
            .map(|d| d.close(time));
        history.alive.push(Interval::open(time));
        reclaimed
    }

    /// Records an eviction of `key` at `time`.
    ///
    /// Closes the open alive interval and opens a dead interval starting at `time - 1`.
    ///
    /// # Errors
    ///
    /// [`SimError::EvictionWithoutFetch`] if the block has no open alive interval.
    pub fn evict(&mut self, key: BlockKey, time: u64) -> Result<Interval, SimError> {
        let missing = SimError::EvictionWithoutFetch {
            set: key.0,
            tag: key.1,
            time,
        };
        let history = self.blocks.get_mut(&key).ok_or_else(|| missing.clone())?;
        let alive = history
            .alive
            .last_mut()
            .filter(|a| a.is_open())
            .ok_or(missing)?
            .close(time);
        history.dead.push(Interval::open(time.saturating_sub(1)));
        Ok(alive)
    }

    /// History of one block.
    pub fn history(&self, key: BlockKey) -> Option<&BlockHistory> {
        self.blocks.get(&key)
    }

    /// All blocks in `(set, tag)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&BlockKey, &BlockHistory)> + '_ {
        self.blocks.iter()
    }

    /// Number of distinct blocks seen.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if nothing was ever fetched.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total evictions recorded.
    pub fn evictions(&self) -> usize {
        self.blocks.values().map(|h| h.dead.len()).sum()
    }

    /// Total still-in-use evictions (dead intervals closed by a re-fetch).
    pub fn still_in_use_evictions(&self) -> usize {
        self.blocks.values().map(BlockHistory::still_in_use).sum()
    }

    /// Returns `true` if every alive interval has been closed.
    pub fn is_settled(&self) -> bool {
        self.blocks
            .values()
            .all(|h| h.alive.iter().all(|a| !a.is_open()))
    }
}
