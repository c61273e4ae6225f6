//! Address decomposition.
//!
//! This module splits byte addresses into the three fields a set-associative cache
//! indexes by. It provides the following:
//! 1. **Field Extraction:** `(tag, index, offset)` from a raw address, with range checking.
//! 2. **Recombination:** The inverse mapping, used by the splitter and by tests.
//! 3. **Line Splitting:** Decomposition of a multi-byte access into per-line sub-accesses.

use crate::common::error::SimError;
use crate::config::CacheGeometry;

/// An address broken into cache fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecodedAddr {
    /// High-order bits identifying the block within its set.
    pub tag: u64,
    /// Set index.
    pub index: usize,
    /// Byte offset within the line.
    pub offset: u32,
}

/// Precomputed masks and shifts for one cache geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressDecoder {
    arch_bits: u32,
    offset_bits: u32,
    index_bits: u32,
    offset_mask: u64,
    index_mask: u64,
    line_size: u32,
}

impl AddressDecoder {
    /// Builds a decoder for `geometry`.
    ///
    /// A valid geometry has `offset_bits + index_bits < arch_bits <= 64`, so every
    /// shift below stays in range.
    ///
    /// # Errors
    ///
    /// [`SimError::Geometry`] when the geometry does not validate.
    pub fn new(geometry: &CacheGeometry) -> Result<Self, SimError> {
        geometry.validate()?;
        let offset_bits = geometry.offset_bits();
        let index_bits = geometry.index_bits();
        Ok(Self {
            arch_bits: geometry.arch_bits,
            offset_bits,
            index_bits,
            offset_mask: (1u64 << offset_bits) - 1,
            index_mask: (1u64 << index_bits) - 1,
            line_size: geometry.line_size,
        })
    }

    /// Address width this decoder accepts.
    #[inline(always)]
    pub const fn arch_bits(&self) -> u32 {
        self.arch_bits
    }

    /// Width of the offset field.
    #[inline(always)]
    pub const fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    /// Width of the index field.
    #[inline(always)]
    pub const fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Width of the tag field.
    #[inline(always)]
    pub const fn tag_bits(&self) -> u32 {
        self.arch_bits - self.index_bits - self.offset_bits
    }

    /// Line size in bytes.
    #[inline(always)]
    pub const fn line_size(&self) -> u32 {
        self.line_size
    }

    /// Returns `true` if `addr` needs no more than `arch_bits` bits.
    #[inline(always)]
    pub const fn in_range(&self, addr: u64) -> bool {
        self.arch_bits >= 64 || addr >> self.arch_bits == 0
    }

    /// Validates that `addr` fits the architecture width.
    ///
    /// # Errors
    ///
    /// [`SimError::AddressOutOfRange`] carrying the address, the configured width and
    /// `time` when the address belongs to a trace record.
    pub const fn check(&self, addr: u64, time: Option<u64>) -> Result<(), SimError> {
        if self.in_range(addr) {
            Ok(())
        } else {
            Err(SimError::AddressOutOfRange {
                addr,
                arch_bits: self.arch_bits,
                time,
            })
        }
    }

    /// Splits `addr` into `(tag, index, offset)`.
    ///
    /// # Errors
    ///
    /// [`SimError::AddressOutOfRange`] if the address is wider than `arch_bits`.
    pub fn split(&self, addr: u64) -> Result<DecodedAddr, SimError> {
        self.check(addr, None)?;
        Ok(self.split_unchecked(addr))
    }

    /// Field extraction for an address already known to be in range.
    #[inline(always)]
    const fn split_unchecked(&self, addr: u64) -> DecodedAddr {
        DecodedAddr {
            tag: addr >> (self.offset_bits + self.index_bits),
            index: ((addr >> self.offset_bits) & self.index_mask) as usize,
            offset: (addr & self.offset_mask) as u32,
        }
    }

    /// Reassembles an address from its fields.
    #[inline(always)]
    pub const fn combine(&self, decoded: DecodedAddr) -> u64 {
        (decoded.tag << (self.index_bits + self.offset_bits))
            | ((decoded.index as u64) << self.offset_bits)
            | decoded.offset as u64
    }

    /// Iterates the per-line pieces of an access of `size` bytes at `addr`.
    ///
    /// The iterator does not range-check; callers validate the first and last byte
    /// with [`check`](Self::check) before applying any piece.
    pub const fn sub_accesses(&self, addr: u64, size: u32) -> SubAccesses {
        SubAccesses {
            decoder: *self,
            addr,
            remaining: size,
        }
    }
}

/// One line-contained piece of an access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubAccess {
    /// Address of the first byte of this piece.
    pub addr: u64,
    /// Decoded fields of `addr`.
    pub decoded: DecodedAddr,
    /// Bytes in this piece; never crosses the end of the line.
    pub len: u32,
}

/// Iterator returned by [`AddressDecoder::sub_accesses`].
#[derive(Clone, Debug)]
pub struct SubAccesses {
    decoder: AddressDecoder,
    addr: u64,
    remaining: u32,
}

impl Iterator for SubAccesses {
    type Item = SubAccess;

    fn next(&mut self) -> Option<SubAccess> {
        if self.remaining == 0 {
            return None;
        }
        let decoded = self.decoder.split_unchecked(self.addr);
        let len = self.remaining.min(self.decoder.line_size - decoded.offset);
        let piece = SubAccess {
            addr: self.addr,
            decoded,
            len,
        };
        self.remaining -= len;
        self.addr = self.addr.wrapping_add(len as u64);
        Some(piece)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            return (0, Some(0));
        }
        let head = self.decoder.line_size - (self.addr & self.decoder.offset_mask) as u32;
        let tail = self.remaining.saturating_sub(head);
        let n = 1 + tail.div_ceil(self.decoder.line_size) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SubAccesses {}
