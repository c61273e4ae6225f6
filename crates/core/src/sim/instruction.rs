//! Grouping of records into instructions.
//!
//! An instruction is a maximal run of consecutive records sharing one logical time.
//! Grouping does not check ordering; the replay controller does.

use crate::common::data::AccessRecord;

/// Records applied and committed as one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction<'a> {
    /// Shared logical time.
    pub time: u64,
    /// Records in stream order.
    pub records: &'a [AccessRecord],
}

/// Iterator over the instructions of a record slice.
#[derive(Clone, Debug)]
pub struct Instructions<'a> {
    rest: &'a [AccessRecord],
}

impl<'a> Instructions<'a> {
    /// Groups `records`.
    pub const fn new(records: &'a [AccessRecord]) -> Self {
        Self { rest: records }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Instruction<'a>;

    fn next(&mut self) -> Option<Instruction<'a>> {
        let time = self.rest.first()?.time;
        let len = self
            .rest
            .iter()
            .position(|r| r.time != time)
            .unwrap_or(self.rest.len());
        let (records, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(Instruction { time, records })
    }
}
