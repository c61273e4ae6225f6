//! # Byte Usage Statistics Tests

use cachereplay_core::config::ReplayMode;
use cachereplay_core::stats::{UsageSample, UsageStats};
use cachereplay_core::AccessRecord;
use pretty_assertions::assert_eq;

use crate::common::harness::{replay, small_geometry};

#[test]
fn samples_track_accessed_and_valid_bytes() {
    let trace = [AccessRecord::read(0, 0x00, 4), AccessRecord::read(1, 0x04, 4)];
    let mut usage = UsageStats::new();
    let _ = replay(small_geometry(), ReplayMode::Auto, &trace, &mut [&mut usage]);

    assert_eq!(
        usage.samples,
        vec![
            UsageSample {
                time: 0,
                accessed: 4,
                valid: 16
            },
            UsageSample {
                time: 1,
                accessed: 8,
                valid: 16
            },
            UsageSample {
                time: 1,
                accessed: 0,
                valid: 0
            },
        ]
    );
    assert_eq!(usage.peak_valid, 16);
    assert_eq!((usage.accessed(), usage.valid()), (0, 0));
    assert!((usage.mean_ratio() - 0.375).abs() < 1e-12);
}

/// Commits without a change in totals add no sample.
#[test]
fn unchanged_commits_are_not_sampled() {
    let trace = [
        AccessRecord::read(0, 0x00, 4),
        AccessRecord::read(1, 0x00, 4),
        AccessRecord::read(2, 0x00, 4),
    ];
    let mut usage = UsageStats::new();
    let _ = replay(small_geometry(), ReplayMode::Auto, &trace, &mut [&mut usage]);
    let times: Vec<u64> = usage.samples.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![0, 2]);
}

#[test]
fn ratio_of_empty_cache_is_zero() {
    let usage = UsageStats::new();
    assert!(usage.usage_ratio().abs() < f64::EPSILON);
    assert!(usage.mean_ratio().abs() < f64::EPSILON);
    let empty = UsageSample {
        time: 0,
        accessed: 0,
        valid: 0,
    };
    assert!(empty.ratio().abs() < f64::EPSILON);
}

#[test]
fn eviction_removes_line_bytes() {
    let trace = [
        AccessRecord::read(0, 0x000, 16),
        AccessRecord::read(1, 0x080, 2),
        AccessRecord::read(2, 0x100, 2),
    ];
    let mut usage = UsageStats::new();
    let _ = replay(small_geometry(), ReplayMode::Auto, &trace, &mut [&mut usage]);
    assert_eq!(
        usage.samples[2],
        UsageSample {
            time: 2,
            accessed: 4,
            valid: 32
        }
    );
}
