//! # Error Tests
//!
//! Verifies that every error renders the context needed to reproduce it.

use cachereplay_core::{GeometryError, SimError};

#[test]
fn address_out_of_range_message() {
    let err = SimError::AddressOutOfRange {
        addr: 0x1_0000,
        arch_bits: 16,
        time: None,
    };
    assert_eq!(err.to_string(), "address 0x10000 does not fit in 16 bits");
}

/// Errors raised during replay name the record time.
#[test]
fn address_out_of_range_message_with_time() {
    let err = SimError::AddressOutOfRange {
        addr: 0x1_0001,
        arch_bits: 16,
        time: Some(42),
    };
    assert_eq!(
        err.to_string(),
        "address 0x10001 does not fit in 16 bits (record at time 42)"
    );
}

#[test]
fn geometry_error_wraps_reason() {
    let err = SimError::from(GeometryError::SetCount { num_sets: 3 });
    assert_eq!(
        err.to_string(),
        "invalid cache geometry: set count 3 is not a power of two"
    );
}

#[test]
fn unordered_trace_message() {
    let err = SimError::UnorderedTrace {
        time: 3,
        previous: 5,
    };
    assert_eq!(err.to_string(), "trace time 3 precedes previous time 5");
}

#[test]
fn eviction_without_fetch_message() {
    let err = SimError::EvictionWithoutFetch {
        set: 2,
        tag: 0x1F,
        time: 9,
    };
    assert_eq!(
        err.to_string(),
        "eviction of tag 0x1f from set 2 at time 9 without a prior fetch"
    );
}

#[test]
fn out_of_bounds_message() {
    let err = SimError::OutOfBoundsAccess {
        time: 7,
        set: 3,
        tag: 0x2A,
        offset: 12,
        len: 8,
        line_size: 16,
    };
    assert_eq!(
        err.to_string(),
        "access of 8 bytes at offset 12 overruns a 16-byte line (tag 0x2a, set 3, time 7)"
    );
}

#[test]
fn zero_field_names_field() {
    let err = GeometryError::Zero { field: "line_size" };
    assert_eq!(err.to_string(), "line_size must be positive");
}

#[test]
fn errors_implement_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    takes_error(&SimError::UnorderedTrace {
        time: 0,
        previous: 1,
    });
    takes_error(&GeometryError::ArchBits { arch_bits: 65 });
}
