//! Trace-driven cache simulator library.
//!
//! This crate replays an ordered memory-access trace through a single-level
//! set-associative LRU cache and reports every transition. It contains:
//! 1. **Common:** Access records, address decomposition and the error taxonomy.
//! 2. **Config:** Cache geometry and replay settings.
//! 3. **Cache:** Lines, sets, the cache itself and block lifetime intervals.
//! 4. **Events:** The sink contract the cache reports through.
//! 5. **Simulation:** Instruction grouping and the one- or two-pass replay controller.
//! 6. **Statistics:** Hit/miss, byte usage and still-in-use sinks.
//!
//! ```
//! use cachereplay_core::{AccessRecord, CacheGeometry, EventSink, ReplayController};
//! use cachereplay_core::config::ReplayConfig;
//! use cachereplay_core::stats::HitMissStats;
//!
//! let geometry = CacheGeometry::new(16, 256, 16, 2);
//! let trace = [AccessRecord::read(0, 0x100, 4), AccessRecord::read(1, 0x104, 4)];
//!
//! let mut hits = HitMissStats::new();
//! let mut controller = ReplayController::new(geometry, ReplayConfig::default()).unwrap();
//! let sinks: &mut [&mut dyn EventSink] = &mut [&mut hits];
//! let report = controller.run(&trace, sinks).unwrap();
//!
//! assert_eq!(report.counters.misses, 1);
//! assert_eq!(hits.hits, 1);
//! ```

/// Cache model (lines, sets, lifetime intervals).
pub mod cache;
/// Common types (records, addresses, errors).
pub mod common;
/// Configuration structures.
pub mod config;
/// Event sink contract and fan-out.
pub mod events;
/// Replay controller.
pub mod sim;
/// Statistics sinks.
pub mod stats;

/// The cache; build with `Cache::new` and drive with `Cache::access`.
pub use crate::cache::Cache;
/// One trace record.
pub use crate::common::data::{AccessKind, AccessRecord};
/// Error taxonomy.
pub use crate::common::error::{GeometryError, SimError};
/// Cache shape and root configuration.
pub use crate::config::{CacheGeometry, Config};
/// Event contract.
pub use crate::events::{EventSink, Pass};
/// Replay controller; construct with `ReplayController::new`.
pub use crate::sim::replay::{ReplayController, ReplayReport};
