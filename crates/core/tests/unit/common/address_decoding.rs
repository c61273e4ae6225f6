//! # Address Decoding Tests
//!
//! Verifies field extraction, range checking, recombination and the split of
//! multi-byte accesses into line-contained pieces.

use cachereplay_core::common::addr::{AddressDecoder, DecodedAddr, SubAccess};
use cachereplay_core::{CacheGeometry, SimError};
use rstest::rstest;

use crate::common::harness::small_geometry;

fn decoder() -> AddressDecoder {
    AddressDecoder::new(&small_geometry()).unwrap()
}

#[rstest]
#[case::small(16, 256, 16, 2, 4, 3, 9)]
#[case::default_l1(64, 32 * 1024, 64, 8, 6, 6, 52)]
#[case::thirty_two_bit(32, 4096, 32, 4, 5, 5, 22)]
#[case::direct_mapped(32, 1024, 64, 1, 6, 4, 22)]
#[case::fully_associative(8, 16, 4, 4, 2, 0, 6)]
fn field_widths(
    #[case] arch_bits: u32,
    #[case] cache_size: u64,
    #[case] line_size: u32,
    #[case] ways: u32,
    #[case] offset_bits: u32,
    #[case] index_bits: u32,
    #[case] tag_bits: u32,
) {
    let geometry = CacheGeometry::new(arch_bits, cache_size, line_size, ways);
    let decoder = AddressDecoder::new(&geometry).unwrap();
    assert_eq!(decoder.offset_bits(), offset_bits);
    assert_eq!(decoder.index_bits(), index_bits);
    assert_eq!(decoder.tag_bits(), tag_bits);
    assert_eq!(geometry.tag_bits(), tag_bits);
}

/// 0x1234 = tag 0x24 | index 3 | offset 4.
#[test]
fn split_extracts_fields() {
    let d = decoder().split(0x1234).unwrap();
    assert_eq!(
        d,
        DecodedAddr {
            tag: 0x24,
            index: 3,
            offset: 4
        }
    );
}

#[test]
fn split_highest_address() {
    let d = decoder().split(0xFFFF).unwrap();
    assert_eq!((d.tag, d.index, d.offset), (0x1FF, 7, 15));
}

#[test]
fn split_rejects_address_wider_than_arch() {
    assert_eq!(
        decoder().split(0x1_0000),
        Err(SimError::AddressOutOfRange {
            addr: 0x1_0000,
            arch_bits: 16,
            time: None
        })
    );
}

#[test]
fn full_width_architecture_accepts_every_address() {
    let decoder = AddressDecoder::new(&CacheGeometry::default()).unwrap();
    assert!(decoder.in_range(u64::MAX));
    let d = decoder.split(u64::MAX).unwrap();
    assert_eq!(decoder.combine(d), u64::MAX);
}

#[test]
fn combine_inverts_split() {
    let decoder = decoder();
    for a in [0u64, 1, 0x7F, 0x80, 0x1234, 0xBEEF, 0xFFFF] {
        assert_eq!(decoder.combine(decoder.split(a).unwrap()), a, "addr {a:#x}");
    }
}

#[test]
fn invalid_geometry_is_rejected() {
    let geometry = CacheGeometry::new(16, 96, 16, 2);
    assert!(matches!(
        AddressDecoder::new(&geometry),
        Err(SimError::Geometry(_))
    ));
}

// ──────────────────────────────────────────────────────────
// Line splitting
// ──────────────────────────────────────────────────────────

/// 20 bytes starting 8 bytes into a 16-byte line: 8 bytes, then 12.
#[test]
fn access_spanning_two_lines_splits_8_then_12() {
    let pieces: Vec<SubAccess> = decoder().sub_accesses(8, 20).collect();
    assert_eq!(pieces.len(), 2);

    assert_eq!(pieces[0].addr, 8);
    assert_eq!(pieces[0].len, 8);
    assert_eq!(pieces[0].decoded.index, 0);
    assert_eq!(pieces[0].decoded.offset, 8);

    assert_eq!(pieces[1].addr, 16);
    assert_eq!(pieces[1].len, 12);
    assert_eq!(pieces[1].decoded.index, 1);
    assert_eq!(pieces[1].decoded.offset, 0);
}

#[test]
fn aligned_full_line_is_one_piece() {
    let pieces: Vec<SubAccess> = decoder().sub_accesses(16, 16).collect();
    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].len, 16);
}

#[test]
fn zero_size_access_has_no_pieces() {
    let pieces = decoder().sub_accesses(0x40, 0);
    assert_eq!(pieces.len(), 0);
    assert_eq!(pieces.count(), 0);
}

/// 18 bytes at offset 15: 1 + 16 + 1.
#[test]
fn access_spanning_three_lines() {
    let pieces = decoder().sub_accesses(15, 18);
    assert_eq!(pieces.len(), 3);
    let lens: Vec<u32> = pieces.map(|p| p.len).collect();
    assert_eq!(lens, vec![1, 16, 1]);
}

/// Crossing from set 7 into set 0 increments the tag.
#[test]
fn split_wraps_index_into_next_tag() {
    let start = (5 << 7) | (7 << 4) | 12;
    let pieces: Vec<SubAccess> = decoder().sub_accesses(start, 8).collect();
    assert_eq!(pieces.len(), 2);
    assert_eq!((pieces[0].decoded.tag, pieces[0].decoded.index), (5, 7));
    assert_eq!((pieces[1].decoded.tag, pieces[1].decoded.index), (6, 0));
}

#[test]
fn piece_lengths_sum_to_access_size() {
    let decoder = decoder();
    for (start, size) in [(0u64, 1u32), (3, 64), (0x100, 100), (0xFFF0, 16)] {
        let total: u32 = decoder.sub_accesses(start, size).map(|p| p.len).sum();
        assert_eq!(total, size);
    }
}
