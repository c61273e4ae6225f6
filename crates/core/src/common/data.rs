//! Memory Access Records.
//!
//! This module defines the unit of input consumed by the replay engine. These types are
//! used for the following:
//! 1. **Trace Replay:** Each record is one load or store observed in the traced program.
//! 2. **Dirty Tracking:** Writes mark the receiving lines dirty.
//! 3. **Statistics Tracking:** Thread ids and sizes are forwarded to event sinks unchanged.

use serde::{Deserialize, Serialize};

/// Direction of a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AccessKind {
    /// Data read (load).
    #[serde(alias = "R", alias = "read")]
    Read,

    /// Data write (store). Marks every touched line dirty.
    #[serde(alias = "W", alias = "write")]
    Write,
}

impl AccessKind {
    /// Returns `true` for [`AccessKind::Write`].
    #[inline(always)]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

/// One recorded memory access.
///
/// Records sharing a `time` belong to the same instruction and are committed together.
/// The `thread` field labels the origin and does not imply concurrent execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    /// Logical timestamp; non-decreasing across a trace.
    pub time: u64,
    /// Originating thread id.
    pub thread: u32,
    /// Read or write.
    pub kind: AccessKind,
    /// Number of bytes accessed.
    pub size: u32,
    /// Absolute address of the first byte.
    pub addr: u64,
}

impl AccessRecord {
    /// Creates a record from its parts.
    pub const fn new(time: u64, thread: u32, kind: AccessKind, size: u32, addr: u64) -> Self {
        Self {
            time,
            thread,
            kind,
            size,
            addr,
        }
    }

    /// Creates a read record on thread 0.
    pub const fn read(time: u64, addr: u64, size: u32) -> Self {
        Self::new(time, 0, AccessKind::Read, size, addr)
    }

    /// Creates a write record on thread 0.
    pub const fn write(time: u64, addr: u64, size: u32) -> Self {
        Self::new(time, 0, AccessKind::Write, size, addr)
    }

    /// Returns the same record attributed to `thread`.
    pub const fn on_thread(mut self, thread: u32) -> Self {
        self.thread = thread;
        self
    }

    /// Address of the last byte touched, or `None` for a zero-size access.
    ///
    /// Saturates at `u64::MAX` so that an access running off the top of the
    /// address space is still reported as out of range.
    pub const fn last_byte(&self) -> Option<u64> {
        if self.size == 0 {
            None
        } else {
            Some(self.addr.saturating_add(self.size as u64 - 1))
        }
    }
}
