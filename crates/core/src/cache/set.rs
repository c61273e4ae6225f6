//! Set with Least Recently Used ordering.
//!
//! Lines live in a fixed arena of `associativity` slots so that a resident block keeps
//! the same way index for its whole lifetime; the cache's lookup index stores that way.
//! Recency is a separate usage stack of way indices: index 0 is MRU, the last entry is
//! LRU. Every insert and touch moves a way to the unique front position, so the order
//! is strict and ties cannot occur.
//!
//! # Performance
//!
//! - `insert()`, `touch()`, `promote()`: O(W) where W is the associativity
//! - `pop_lru()`: O(1)

use super::line::Line;

/// Result of [`Set::insert`].
#[derive(Debug)]
pub struct Insertion {
    /// Way the new line was placed in.
    pub way: usize,
    /// Line displaced to make room, if the set was full.
    pub evicted: Option<Line>,
}

/// One cache set.
#[derive(Clone, Debug)]
pub struct Set {
    slots: Vec<Line>,
    /// Occupied ways, MRU first.
    usage: Vec<usize>,
}

impl Set {
    /// Creates an empty set of `ways` slots holding `line_size`-byte lines.
    pub fn new(ways: usize, line_size: u32) -> Self {
        Self {
            slots: vec![Line::empty(line_size); ways],
            usage: Vec::with_capacity(ways),
        }
    }

    /// Associativity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of resident lines.
    pub fn len(&self) -> usize {
        self.usage.len()
    }

    /// Returns `true` if no line is resident.
    pub fn is_empty(&self) -> bool {
        self.usage.is_empty()
    }

    /// Returns `true` if every way holds a line.
    pub fn is_full(&self) -> bool {
        self.usage.len() == self.slots.len()
    }

    /// Way holding `tag`, if resident.
    pub fn find(&self, tag: u64) -> Option<usize> {
        self.usage
            .iter()
            .copied()
            .find(|&way| self.slots[way].tag() == Some(tag))
    }

    /// Line in slot `way`.
    pub fn line(&self, way: usize) -> &Line {
        &self.slots[way]
    }

    /// Mutable line in slot `way`.
    pub fn line_mut(&mut self, way: usize) -> &mut Line {
        &mut self.slots[way]
    }

    /// Way of the least recently used line.
    pub fn lru_way(&self) -> Option<usize> {
        self.usage.last().copied()
    }

    /// Moves `way` to the MRU position. No-op for an unoccupied way.
    pub fn promote(&mut self, way: usize) {
        if let Some(pos) = self.usage.iter().position(|&w| w == way) {
            let _ = self.usage.remove(pos);
            self.usage.insert(0, way);
        }
    }

    /// Moves the line holding `tag` to the MRU position.
    ///
    /// Returns its way, or `None` if the tag is not resident.
    pub fn touch(&mut self, tag: u64) -> Option<usize> {
        let way = self.find(tag)?;
        self.promote(way);
        Some(way)
    }

    /// Places `line` at the MRU position.
    ///
    /// If the set is full the LRU line is displaced and returned; its slot is reused.
    pub fn insert(&mut self, line: Line) -> Insertion {
        debug_assert!(line.tag().is_some_and(|t| self.find(t).is_none()));
        if self.is_full() {
            // usage is non-empty whenever the set is full and has at least one way.
            if let Some(way) = self.usage.pop() {
                let evicted = std::mem::replace(&mut self.slots[way], line);
                self.usage.insert(0, way);
                return Insertion {
                    way,
                    evicted: Some(evicted),
                };
            }
        }
        let way = self
            .slots
            .iter()
            .position(|slot| !slot.is_valid())
            .unwrap_or(0);
        self.slots[way] = line;
        self.usage.insert(0, way);
        Insertion { way, evicted: None }
    }

    /// Removes and returns the LRU line, leaving its slot empty.
    pub fn pop_lru(&mut self) -> Option<Line> {
        let way = self.usage.pop()?;
        let line = self.slots[way].clone();
        self.slots[way].reset();
        Some(line)
    }

    /// Resident lines from MRU to LRU.
    pub fn iter(&self) -> impl Iterator<Item = &Line> + '_ {
        self.usage.iter().map(|&way| &self.slots[way])
    }

    /// Resident tags from MRU to LRU.
    pub fn tags_by_recency(&self) -> Vec<u64> {
        self.iter().filter_map(Line::tag).collect()
    }
}
