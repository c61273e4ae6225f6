//! Trace replay.
//!
//! This module turns an ordered record stream into cache activity:
//! 1. **Instructions:** Grouping of same-time records into committed units.
//! 2. **Controller:** Pass orchestration, the logical clock, ordering checks and flush.

/// Instruction grouping.
pub mod instruction;

/// Replay controller and report.
pub mod replay;

pub use instruction::{Instruction, Instructions};
pub use replay::{ReplayController, ReplayReport, ReplayState};
