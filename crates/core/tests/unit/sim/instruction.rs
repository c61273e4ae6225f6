//! # Instruction Grouping Tests

use cachereplay_core::AccessRecord;
use cachereplay_core::sim::Instructions;

#[test]
fn groups_consecutive_equal_times() {
    let trace = [
        AccessRecord::read(0, 0x00, 4),
        AccessRecord::write(0, 0x40, 4),
        AccessRecord::read(1, 0x80, 4),
        AccessRecord::read(3, 0xC0, 4),
        AccessRecord::read(3, 0x00, 4),
    ];
    let groups: Vec<(u64, usize)> = Instructions::new(&trace)
        .map(|i| (i.time, i.records.len()))
        .collect();
    assert_eq!(groups, vec![(0, 2), (1, 1), (3, 2)]);
}

/// Grouping only looks at neighbours; a repeated time later is a new instruction.
#[test]
fn non_adjacent_equal_times_stay_separate() {
    let trace = [
        AccessRecord::read(2, 0, 1),
        AccessRecord::read(1, 0, 1),
        AccessRecord::read(2, 0, 1),
    ];
    assert_eq!(Instructions::new(&trace).count(), 3);
}

#[test]
fn empty_trace_has_no_instructions() {
    assert_eq!(Instructions::new(&[]).count(), 0);
}

#[test]
fn records_keep_stream_order() {
    let trace = [AccessRecord::read(5, 0x10, 1), AccessRecord::write(5, 0x20, 1)];
    let first = Instructions::new(&trace).next().unwrap();
    assert_eq!(first.records, &trace[..]);
}
