//! Statistics sinks.
//!
//! Concrete [`EventSink`](crate::events::EventSink) implementations built on the cache's
//! event stream. The cache never refers to these types. It provides:
//! 1. **Hit/miss counts:** Totals, traffic and a per-thread breakdown.
//! 2. **Byte usage:** The fraction of resident bytes actually touched, sampled per commit.
//! 3. **Still-in-use evictions:** Lookahead classification and eviction durations.

/// Hit, miss and traffic counters.
pub mod hit_miss;

/// Still-in-use eviction classification.
pub mod siu;

/// Resident byte usage.
pub mod usage;

pub use hit_miss::{HitMissStats, ThreadCounts};
pub use siu::{SiuSample, SiuStats};
pub use usage::{UsageSample, UsageStats};
