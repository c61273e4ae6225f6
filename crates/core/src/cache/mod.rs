//! Set-Associative Cache Model.
//!
//! This module implements a single-level set-associative cache with LRU replacement,
//! driven one access record at a time. It splits accesses at line boundaries, tracks
//! per-byte usage and dirty state, keeps block lifetime intervals, and reports every
//! transition to an [`EventSink`].

/// Block lifetime interval bookkeeping.
pub mod lifetime;

/// Line slot with dirty bit and byte bitmap.
pub mod line;

/// LRU-ordered set of line slots.
pub mod set;

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use self::lifetime::{BlockKey, LifetimeTracker};
use self::line::Line;
use self::set::Set;
use crate::common::addr::{AddressDecoder, DecodedAddr, SubAccess};
use crate::common::data::AccessRecord;
use crate::common::error::SimError;
use crate::config::CacheGeometry;
use crate::events::EventSink;

/// Running totals kept by the cache itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    /// Line-level pieces processed.
    pub sub_accesses: u64,
    /// Pieces that hit.
    pub hits: u64,
    /// Pieces that missed.
    pub misses: u64,
    /// Blocks brought in.
    pub fetches: u64,
    /// Blocks displaced, including those removed by flush.
    pub evictions: u64,
    /// Dirty blocks written back.
    pub writebacks: u64,
}

/// Hit and miss counts for one access record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessOutcome {
    /// Pieces of the record that hit.
    pub hits: u32,
    /// Pieces of the record that missed.
    pub misses: u32,
}

impl AccessOutcome {
    /// Returns `true` if every piece hit (vacuously true for a zero-size record).
    pub const fn is_hit(&self) -> bool {
        self.misses == 0
    }
}

/// Simulated cache.
///
/// Every resident line appears in exactly one set and exactly one `index` entry.
/// The index is only used for point lookups, so its iteration order never affects
/// results.
#[derive(Debug)]
pub struct Cache {
    decoder: AddressDecoder,
    sets: Vec<Set>,
    index: HashMap<(u64, usize), usize>,
    lifetimes: LifetimeTracker,
    counters: CacheCounters,
}

impl Cache {
    /// Creates an empty cache.
    ///
    /// # Errors
    ///
    /// [`SimError::Geometry`] if `geometry` does not validate.
    pub fn new(geometry: &CacheGeometry) -> Result<Self, SimError> {
        let decoder = AddressDecoder::new(geometry)?;
        let ways = geometry.associativity as usize;
        let num_sets = geometry.num_sets() as usize;
        Ok(Self {
            decoder,
            sets: (0..num_sets)
                .map(|_| Set::new(ways, geometry.line_size))
                .collect(),
            index: HashMap::with_capacity(num_sets * ways),
            lifetimes: LifetimeTracker::new(),
            counters: CacheCounters::default(),
        })
    }

    /// Address decoder for this geometry.
    pub const fn decoder(&self) -> &AddressDecoder {
        &self.decoder
    }

    /// Set `index`, or `None` if out of range.
    pub fn set(&self, index: usize) -> Option<&Set> {
        self.sets.get(index)
    }

    /// Number of sets.
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// Running totals.
    pub const fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// Lifetime intervals recorded so far.
    pub const fn lifetimes(&self) -> &LifetimeTracker {
        &self.lifetimes
    }

    /// Consumes the cache, keeping its lifetime intervals.
    pub fn into_lifetimes(self) -> LifetimeTracker {
        self.lifetimes
    }

    /// Number of resident blocks.
    pub fn resident_blocks(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the line containing `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        self.decoder
            .split(addr)
            .is_ok_and(|d| self.index.contains_key(&(d.tag, d.index)))
    }

    /// Applies one access record.
    ///
    /// The address range is validated before any state changes, so an out-of-range
    /// record leaves the cache untouched. A bookkeeping error aborts the record part
    /// way through; earlier pieces stay applied, but sets and index remain consistent.
    ///
    /// # Errors
    ///
    /// - [`SimError::AddressOutOfRange`] if the first or last byte is wider than `arch_bits`.
    /// - [`SimError::OutOfBoundsAccess`] or [`SimError::EvictionWithoutFetch`] if internal
    ///   bookkeeping is inconsistent.
    pub fn access(
        &mut self,
        record: &AccessRecord,
        sink: &mut dyn EventSink,
    ) -> Result<AccessOutcome, SimError> {
        let time = Some(record.time);
        self.decoder.check(record.addr, time)?;
        if let Some(last) = record.last_byte() {
            self.decoder.check(last, time)?;
            if last - record.addr != record.size as u64 - 1 {
                // Saturated at the top of the address space.
                return Err(SimError::AddressOutOfRange {
                    addr: record.addr,
                    arch_bits: self.decoder.arch_bits(),
                    time,
                });
            }
        }

        let is_write = record.kind.is_write();
        let mut outcome = AccessOutcome::default();
        for piece in self.decoder.sub_accesses(record.addr, record.size) {
            self.counters.sub_accesses += 1;
            let DecodedAddr { tag, index, offset } = piece.decoded;
            let key = (tag, index);

            if let Some(&way) = self.index.get(&key) {
                self.sets[index].promote(way);
                let newly = self.mark(record, &piece, way, is_write)?;
                self.counters.hits += 1;
                outcome.hits += 1;
                sink.on_hit(record, piece.len);
                sink.on_byte_usage(newly as i64, 0);
                continue;
            }

            self.counters.misses += 1;
            outcome.misses += 1;
            sink.on_miss(record);

            // Retire the victim before placing the new line so a failure never
            // leaves an unindexed line behind.
            if self.sets[index].is_full() {
                if let Some(victim) = self.sets[index].pop_lru() {
                    self.retire(index, &victim, record.time, sink)?;
                }
            }
            let line_size = self.decoder.line_size();
            let insertion = self.sets[index].insert(Line::fetched(tag, line_size, is_write));
            debug_assert!(insertion.evicted.is_none());
            let _ = self.index.insert(key, insertion.way);

            self.counters.fetches += 1;
            sink.on_fetch(index, tag, record.time);
            if let Some(dead) = self.lifetimes.fetch((index, tag), record.time) {
                trace!(
                    set = index,
                    tag,
                    time = record.time,
                    since = dead.start,
                    "re-fetch of still-in-use block"
                );
            }

            let newly = self.mark(record, &piece, insertion.way, false)?;
            sink.on_byte_usage(newly as i64, line_size as i64);
        }
        Ok(outcome)
    }

    /// Marks the bytes of `piece` in `way` of its set, returning the newly marked count.
    fn mark(
        &mut self,
        record: &AccessRecord,
        piece: &SubAccess,
        way: usize,
        is_write: bool,
    ) -> Result<u32, SimError> {
        let DecodedAddr { tag, index, offset } = piece.decoded;
        self.sets[index]
            .line_mut(way)
            .access(offset, piece.len, is_write)
            .ok_or(SimError::OutOfBoundsAccess {
                time: record.time,
                set: index,
                tag,
                offset,
                len: piece.len,
                line_size: self.decoder.line_size(),
            })
    }

    /// Evicts every resident block at `final_time`, set by set from LRU to MRU.
    ///
    /// Afterwards every set is empty and every alive interval is closed.
    ///
    /// # Errors
    ///
    /// [`SimError::EvictionWithoutFetch`] if interval bookkeeping is inconsistent.
    pub fn flush(&mut self, final_time: u64, sink: &mut dyn EventSink) -> Result<(), SimError> {
        for index in 0..self.sets.len() {
            while let Some(victim) = self.sets[index].pop_lru() {
                self.retire(index, &victim, final_time, sink)?;
            }
        }
        debug_assert!(self.index.is_empty());
        debug_assert!(self.lifetimes.is_settled());
        Ok(())
    }

    /// Bookkeeping shared by replacement and flush for a line that has left set `index`.
    fn retire(
        &mut self,
        index: usize,
        victim: &Line,
        time: u64,
        sink: &mut dyn EventSink,
    ) -> Result<(), SimError> {
        let Some(tag) = victim.tag() else {
            return Ok(());
        };
        let key: BlockKey = (index, tag);
        let _ = self.index.remove(&(tag, index));
        let alive = self.lifetimes.evict(key, time)?;
        trace!(set = index, tag, time, resident_since = alive.start, "evict");

        self.counters.evictions += 1;
        let dirty = victim.is_dirty();
        sink.on_evict(index, tag, time, dirty);
        sink.on_byte_usage(-(victim.accessed_count() as i64), -(victim.size() as i64));
        if dirty {
            self.counters.writebacks += 1;
            sink.on_writeback(time);
        }
        Ok(())
    }
}
