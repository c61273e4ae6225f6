//! Simulation error definitions.
//!
//! This module defines every failure the replay engine can report. It provides:
//! 1. **Geometry Errors:** Configuration-time rejection of cache shapes that cannot be decoded.
//! 2. **Access Errors:** Addresses wider than the architecture and line-bound violations.
//! 3. **Replay Errors:** Out-of-order traces and broken fetch/evict pairing.
//!
//! All variants are fatal for the pass that raised them. The simulation is a pure
//! function of its input, so nothing here is ever retried.

use thiserror::Error;

/// Reasons a [`CacheGeometry`](crate::config::CacheGeometry) is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// A size or count field was zero.
    #[error("{field} must be positive")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The architecture address width is outside `1..=64`.
    #[error("arch_bits {arch_bits} is outside 1..=64")]
    ArchBits {
        /// Configured address width in bits.
        arch_bits: u32,
    },

    /// The line size is not a power of two.
    #[error("line_size {line_size} is not a power of two")]
    LineSize {
        /// Configured line size in bytes.
        line_size: u64,
    },

    /// `cache_size` is not an exact multiple of `associativity * line_size`.
    #[error("cache_size {cache_size} is not a multiple of {way_bytes} (associativity * line_size)")]
    Indivisible {
        /// Configured cache size in bytes.
        cache_size: u64,
        /// Bytes covered by one line in every way.
        way_bytes: u64,
    },

    /// The derived number of sets is not a power of two.
    #[error("set count {num_sets} is not a power of two")]
    SetCount {
        /// Derived number of sets.
        num_sets: u64,
    },

    /// No bits are left over for the tag.
    #[error("tag width is {tag_bits} bits (arch {arch_bits}, index {index_bits}, offset {offset_bits})")]
    TagBits {
        /// Remaining tag width, possibly negative.
        tag_bits: i64,
        /// Configured address width.
        arch_bits: u32,
        /// Derived index width.
        index_bits: u32,
        /// Derived offset width.
        offset_bits: u32,
    },
}

/// Fatal conditions raised while configuring or replaying a cache.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimError {
    /// The cache geometry cannot be decoded.
    #[error("invalid cache geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// An address (or the last byte of an access) needs more than `arch_bits` bits.
    #[error(
        "address {addr:#x} does not fit in {arch_bits} bits{}",
        .time.map_or_else(String::new, |t| format!(" (record at time {t})"))
    )]
    AddressOutOfRange {
        /// Offending address.
        addr: u64,
        /// Configured address width.
        arch_bits: u32,
        /// Time of the offending record; `None` when raised by a bare
        /// [`AddressDecoder::split`](crate::common::addr::AddressDecoder::split).
        time: Option<u64>,
    },

    /// A sub-access still crosses the end of its line after splitting.
    #[error(
        "access of {len} bytes at offset {offset} overruns a {line_size}-byte line \
         (tag {tag:#x}, set {set}, time {time})"
    )]
    OutOfBoundsAccess {
        /// Time of the record the sub-access belongs to.
        time: u64,
        /// Set index of the line.
        set: usize,
        /// Tag of the line.
        tag: u64,
        /// Byte offset within the line.
        offset: u32,
        /// Length of the sub-access.
        len: u32,
        /// Configured line size.
        line_size: u32,
    },

    /// Logical time went backwards.
    #[error("trace time {time} precedes previous time {previous}")]
    UnorderedTrace {
        /// Time of the offending record.
        time: u64,
        /// Time of the record (or start time) before it.
        previous: u64,
    },

    /// A block was evicted without an open residency interval.
    #[error("eviction of tag {tag:#x} from set {set} at time {time} without a prior fetch")]
    EvictionWithoutFetch {
        /// Set index of the evicted block.
        set: usize,
        /// Tag of the evicted block.
        tag: u64,
        /// Logical time of the eviction.
        time: u64,
    },
}
