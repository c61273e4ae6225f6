//! # Unit Components
//!
//! Tests grouped by the module under test.

/// Address decoding, access records and error formatting.
pub mod common;


/// Lines, sets, lifetime intervals and the cache itself.
pub mod cache;

/// Sink fan-out, recording and serialization.
pub mod events;


/// Statistics sinks.
pub mod stats;

/// Invariants checked over generated geometries and traces.
pub mod properties;
