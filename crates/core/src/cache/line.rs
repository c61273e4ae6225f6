//! Cache line slot.
//!
//! A line is either empty (`tag == None`) or holds one block. Besides the tag and dirty
//! bit it keeps a per-byte bitmap of which bytes the program actually touched while the
//! block was resident, which is what usage statistics are computed from.

/// Fixed-length bitmap with one bit per byte of a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByteMask {
    words: Vec<u64>,
    len: u32,
}

impl ByteMask {
    /// Creates an all-clear mask of `len` bits.
    pub fn new(len: u32) -> Self {
        Self {
            words: vec![0; len.div_ceil(64) as usize],
            len,
        }
    }

    /// Number of bits in the mask.
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` for a zero-length mask.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether bit `i` is set. Out-of-range bits read as clear.
    pub fn get(&self, i: u32) -> bool {
        i < self.len && self.words[(i / 64) as usize] >> (i % 64) & 1 == 1
    }

    /// Sets bits `[start, start + len)` and returns how many were previously clear.
    ///
    /// The caller guarantees `start + len <= self.len()`.
    pub fn set_range(&mut self, start: u32, len: u32) -> u32 {
        let end = start + len;
        let mut newly_set = 0;
        let mut bit = start;
        while bit < end {
            let word = (bit / 64) as usize;
            let lo = bit % 64;
            let hi = (end - (bit - lo)).min(64);
            let mask = if hi - lo == 64 {
                u64::MAX
            } else {
                ((1u64 << (hi - lo)) - 1) << lo
            };
            newly_set += (mask & !self.words[word]).count_ones();
            self.words[word] |= mask;
            bit += hi - lo;
        }
        newly_set
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }
}

/// One line slot of a set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    tag: Option<u64>,
    dirty: bool,
    accessed: ByteMask,
}

impl Line {
    /// Creates an empty slot for lines of `line_size` bytes.
    pub fn empty(line_size: u32) -> Self {
        Self {
            tag: None,
            dirty: false,
            accessed: ByteMask::new(line_size),
        }
    }

    /// Creates a freshly fetched line holding `tag` with no bytes accessed yet.
    pub fn fetched(tag: u64, line_size: u32, dirty: bool) -> Self {
        Self {
            tag: Some(tag),
            dirty,
            accessed: ByteMask::new(line_size),
        }
    }

    /// Tag of the resident block; `None` for an empty slot.
    #[inline(always)]
    pub const fn tag(&self) -> Option<u64> {
        self.tag
    }

    /// Returns `true` if the slot holds a block.
    #[inline(always)]
    pub const fn is_valid(&self) -> bool {
        self.tag.is_some()
    }

    /// Returns `true` if the block was written since it was fetched.
    #[inline(always)]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Line size in bytes.
    pub const fn size(&self) -> u32 {
        self.accessed.len()
    }

    /// Byte-level access bitmap.
    pub const fn accessed(&self) -> &ByteMask {
        &self.accessed
    }

    /// Marks `[offset, offset + len)` accessed and folds `is_write` into the dirty bit.
    ///
    /// Returns the number of bytes touched for the first time, or `None` without any
    /// change if the range runs past the end of the line.
    pub fn access(&mut self, offset: u32, len: u32, is_write: bool) -> Option<u32> {
        if offset.checked_add(len)? > self.accessed.len() {
            return None;
        }
        self.dirty |= is_write;
        Some(self.accessed.set_range(offset, len))
    }

    /// Number of distinct bytes accessed while resident.
    pub fn accessed_count(&self) -> u32 {
        self.accessed.count_ones()
    }

    /// Returns the slot to the empty state: no tag, clean, nothing accessed.
    pub fn reset(&mut self) {
        self.tag = None;
        self.dirty = false;
        self.accessed.clear();
    }
}
