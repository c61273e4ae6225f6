//! # Property Tests
//!
//! Invariants that must hold for every valid geometry and ordered trace.

use cachereplay_core::common::addr::AddressDecoder;
use cachereplay_core::config::ReplayMode;
use cachereplay_core::events::{CacheEvent, EventLog};
use cachereplay_core::stats::{HitMissStats, SiuStats, UsageStats};
use cachereplay_core::{AccessKind, AccessRecord, Cache, CacheGeometry};
use proptest::prelude::*;

use crate::common::harness::{replay, small_geometry};

/// Valid geometries: `(arch_bits, cache_size, line_size, ways)`.
fn geometry() -> impl Strategy<Value = CacheGeometry> {
    (2u32..=7, 0u32..=4, 0u32..=3, 12u32..=64).prop_filter_map(
        "tag field must be non-empty",
        |(line_log, sets_log, ways_log, arch_bits)| {
            let line_size = 1u32 << line_log;
            let ways = 1u32 << ways_log;
            let cache_size = (u64::from(line_size) * u64::from(ways)) << sets_log;
            let g = CacheGeometry::new(arch_bits, cache_size, line_size, ways);
            g.validate().ok().map(|()| g)
        },
    )
}

/// Ordered traces over a 4 KiB window of the small geometry's address space.
fn trace() -> impl Strategy<Value = Vec<AccessRecord>> {
    prop::collection::vec(
        (0u64..3, 0u32..4, any::<bool>(), 0u32..24, 0u64..0x1000),
        0..64,
    )
    .prop_map(|steps| {
        let mut time = 0;
        steps
            .into_iter()
            .map(|(dt, thread, write, size, addr)| {
                time += dt;
                let kind = if write {
                    AccessKind::Write
                } else {
                    AccessKind::Read
                };
                AccessRecord::new(time, thread, kind, size, addr)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn split_and_combine_round_trip(g in geometry(), raw in any::<u64>()) {
        let decoder = AddressDecoder::new(&g).unwrap();
        let a = if g.arch_bits == 64 { raw } else { raw & ((1u64 << g.arch_bits) - 1) };
        let d = decoder.split(a).unwrap();
        prop_assert!(u64::from(d.offset) < u64::from(g.line_size));
        prop_assert!((d.index as u64) < g.num_sets());
        prop_assert_eq!(decoder.combine(d), a);
    }

    #[test]
    fn pieces_stay_within_one_line(g in geometry(), start in 0u64..4096, size in 0u32..512) {
        let decoder = AddressDecoder::new(&g).unwrap();
        prop_assume!(decoder.in_range(start + u64::from(size)));
        let mut next = start;
        for piece in decoder.sub_accesses(start, size) {
            prop_assert_eq!(piece.addr, next);
            prop_assert!(piece.len > 0);
            prop_assert!(piece.decoded.offset + piece.len <= g.line_size);
            next += u64::from(piece.len);
        }
        prop_assert_eq!(next, start + u64::from(size));
    }

    /// After `ways + 1` distinct tags map to one set, the first is gone.
    #[test]
    fn lru_evicts_oldest(g in geometry()) {
        let mut cache = Cache::new(&g).unwrap();
        let mut log = EventLog::new();
        let stride = g.num_sets() * u64::from(g.line_size);
        let blocks = u64::from(g.associativity) + 1;
        let decoder = AddressDecoder::new(&g).unwrap();
        prop_assume!(stride.checked_mul(blocks).is_some_and(|end| decoder.in_range(end)));
        for i in 0..blocks {
            let _ = cache.access(&AccessRecord::read(i, i * stride, 1), &mut log).unwrap();
        }
        prop_assert!(!cache.contains(0));
        prop_assert!((1..blocks).all(|i| cache.contains(i * stride)));
    }

    /// The same trace always produces the same event stream.
    #[test]
    fn replay_is_deterministic(records in trace()) {
        let mut first = EventLog::new();
        let mut second = EventLog::new();
        let a = replay(small_geometry(), ReplayMode::SinglePass, &records, &mut [&mut first]);
        let b = replay(small_geometry(), ReplayMode::SinglePass, &records, &mut [&mut second]);
        prop_assert_eq!(a, b);
        prop_assert_eq!(first.events, second.events);
    }

    /// Fetches balance evictions, and byte usage nets to zero, once the cache is flushed.
    #[test]
    fn flush_conserves_blocks_and_bytes(records in trace()) {
        let mut hits = HitMissStats::new();
        let mut usage = UsageStats::new();
        let mut log = EventLog::new();
        let report = replay(
            small_geometry(),
            ReplayMode::SinglePass,
            &records,
            &mut [&mut hits, &mut usage, &mut log],
        );
        prop_assert_eq!(hits.fetches, hits.evictions);
        prop_assert_eq!(
            report.counters.hits + report.counters.misses,
            report.counters.sub_accesses
        );
        prop_assert_eq!(hits.misses, report.counters.fetches);
        prop_assert_eq!(hits.dirty_evictions, hits.writebacks);
        prop_assert_eq!((usage.accessed(), usage.valid()), (0, 0));
        prop_assert!(report.lifetimes.is_settled());
        prop_assert_eq!(report.lifetimes.evictions() as u64, report.counters.evictions);

        let mut resident: i64 = 0;
        for e in &log.events {
            match e {
                CacheEvent::Fetch { .. } => resident += 1,
                CacheEvent::Evict { .. } => resident -= 1,
                _ => {}
            }
            prop_assert!((0..=16).contains(&resident));
        }
    }

    /// Single-pass and two-pass classification agree on every total.
    #[test]
    fn siu_totals_independent_of_mode(records in trace()) {
        let mut single = SiuStats::new();
        let mut two = SiuStats::new();
        let a = replay(small_geometry(), ReplayMode::SinglePass, &records, &mut [&mut single]);
        let b = replay(small_geometry(), ReplayMode::TwoPass, &records, &mut [&mut two]);
        prop_assert_eq!(a.counters, b.counters);
        prop_assert_eq!(single.evictions, two.evictions);
        prop_assert_eq!(single.still_in_use, two.still_in_use);
        prop_assert_eq!(&single.durations, &two.durations);
        prop_assert_eq!(single.still_in_use as usize, a.lifetimes.still_in_use_evictions());
        prop_assert_eq!(
            single.timeline.last().map(|s| (s.evictions, s.still_in_use)),
            two.timeline.last().map(|s| (s.evictions, s.still_in_use))
        );
    }
}
