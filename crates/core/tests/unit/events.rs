//! # Event Sink Tests
//!
//! Fan-out order, lookahead filtering and event serialization.

use cachereplay_core::events::{CacheEvent, EventLog, NoopSink, SinkSet};
use cachereplay_core::{AccessRecord, EventSink, Pass};
use pretty_assertions::assert_eq;

/// Appends its id to a shared journal on every commit.
struct Tagged<'j> {
    id: u8,
    lookahead: bool,
    journal: &'j std::cell::RefCell<Vec<(u8, u64)>>,
}

impl EventSink for Tagged<'_> {
    fn commit(&mut self, time: u64) {
        self.journal.borrow_mut().push((self.id, time));
    }

    fn lookahead(&self) -> bool {
        self.lookahead
    }
}

#[test]
fn sinks_receive_events_in_registration_order() {
    let journal = std::cell::RefCell::new(Vec::new());
    let mut a = Tagged {
        id: 1,
        lookahead: false,
        journal: &journal,
    };
    let mut b = Tagged {
        id: 2,
        lookahead: true,
        journal: &journal,
    };
    let sinks: &mut [&mut dyn EventSink] = &mut [&mut a, &mut b];
    let mut set = SinkSet::new(sinks);
    set.commit(4);
    set.commit(5);
    assert_eq!(journal.into_inner(), vec![(1, 4), (2, 4), (1, 5), (2, 5)]);
}

#[test]
fn lookahead_only_skips_plain_sinks() {
    let journal = std::cell::RefCell::new(Vec::new());
    let mut a = Tagged {
        id: 1,
        lookahead: false,
        journal: &journal,
    };
    let mut b = Tagged {
        id: 2,
        lookahead: true,
        journal: &journal,
    };
    let sinks: &mut [&mut dyn EventSink] = &mut [&mut a, &mut b];
    let mut set = SinkSet::lookahead_only(sinks);
    assert_eq!(set.active(), 1);
    assert!(set.lookahead());
    set.commit(9);
    assert_eq!(journal.into_inner(), vec![(2, 9)]);
}

#[test]
fn set_without_lookahead_sinks_reports_none() {
    let mut noop = NoopSink;
    let mut log = EventLog::new();
    let sinks: &mut [&mut dyn EventSink] = &mut [&mut noop, &mut log];
    let set = SinkSet::new(sinks);
    assert!(!set.lookahead());
    assert_eq!(set.active(), 2);
}

#[test]
fn log_records_and_clears_per_pass() {
    let mut log = EventLog::new();
    log.on_hit(&AccessRecord::read(1, 0x20, 4).on_thread(3), 4);
    log.on_writeback(2);
    assert_eq!(log.count(|e| matches!(e, CacheEvent::Hit { thread: 3, .. })), 1);
    assert_eq!(log.events.len(), 2);

    log.begin_pass(Pass::Second);
    assert!(log.events.is_empty());
}

#[test]
fn pass_finality() {
    assert!(Pass::Single.is_final());
    assert!(!Pass::First.is_final());
    assert!(Pass::Second.is_final());
}

#[test]
fn events_serialize_tagged() {
    let evict = CacheEvent::Evict {
        set: 2,
        tag: 5,
        time: 7,
        dirty: true,
    };
    assert_eq!(
        serde_json::to_value(evict).unwrap(),
        serde_json::json!({ "event": "evict", "set": 2, "tag": 5, "time": 7, "dirty": true })
    );

    let usage = CacheEvent::ByteUsage {
        accessed: -4,
        valid: -16,
    };
    assert_eq!(
        serde_json::to_string(&usage).unwrap(),
        r#"{"event":"byte_usage","accessed":-4,"valid":-16}"#
    );
}
