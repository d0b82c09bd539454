/*!
 * Allocator Tests
 * Allocation, release, coalescing and OOM handling
 */

use nextfit::{AllocError, Allocator, AllocatorConfig, MemoryInfo, HEADER_SIZE};
use pretty_assertions::assert_eq;

const H: usize = HEADER_SIZE;

fn regions(allocator: &Allocator) -> Vec<(usize, usize)> {
    allocator
        .free_regions()
        .map(|r| (r.address, r.size))
        .collect()
}

#[test]
fn test_reference_sequence() {
    let mut allocator = Allocator::initialize(500, 1000).unwrap();

    let first = allocator.allocate(200).unwrap();
    assert_eq!(first.header_address(), 500);
    assert_eq!(first.payload_address(), 500 + H);
    assert_eq!(first.payload_size(), 200);

    // immediately after the first carve
    let second = allocator.allocate(200).unwrap();
    assert_eq!(second.header_address(), 700 + H);
    assert_eq!(second.payload_address(), 700 + 2 * H);

    allocator.release(first).unwrap();
    assert_eq!(
        regions(&allocator),
        vec![(500, 200 + H), (900 + 2 * H, 600 - 2 * H)]
    );

    // the released region is the last touched and lowest, so the cursor sits on it
    let third = allocator.allocate(100).unwrap();
    assert_eq!(third.header_address(), 500);
    assert_eq!(
        regions(&allocator),
        vec![(600 + H, 100), (900 + 2 * H, 600 - 2 * H)]
    );

    // closes the gap on both sides
    allocator.release(second).unwrap();
    assert_eq!(regions(&allocator), vec![(600 + H, 900 - H)]);

    allocator.release(third).unwrap();
    assert_eq!(regions(&allocator), vec![(500, 1000)]);
    assert_eq!(allocator.outstanding(), 0);
}

#[test]
fn test_round_trip_restores_range() {
    for size in [1, 17, 200, 1000 - H] {
        let mut allocator = Allocator::initialize(4096, 1000).unwrap();
        let header = allocator.allocate(size).unwrap();
        allocator.release(header).unwrap();
        assert_eq!(regions(&allocator), vec![(4096, 1000)]);
    }
}

#[test]
fn test_release_merges_with_unrelated_neighbours_only_when_adjacent() {
    let mut allocator = Allocator::initialize(0, 1000).unwrap();
    let a = allocator.allocate(100).unwrap();
    let b = allocator.allocate(100).unwrap();
    let c = allocator.allocate(100).unwrap();

    allocator.release(a).unwrap();
    allocator.release(c).unwrap();
    // c merged with the tail; a stays separate because b sits between them
    assert_eq!(
        regions(&allocator),
        vec![(0, 100 + H), (200 + 2 * H, 800 - 2 * H)]
    );

    allocator.release(b).unwrap();
    assert_eq!(regions(&allocator), vec![(0, 1000)]);
    allocator.free_list().verify().unwrap();
}

#[test]
fn test_out_of_memory_leaves_free_list_unmodified() {
    let mut allocator = Allocator::initialize(0, 1000).unwrap();
    let a = allocator.allocate(400).unwrap();
    let _b = allocator.allocate(100).unwrap();
    allocator.release(a).unwrap();

    let before = regions(&allocator);
    let cursor_before = allocator.free_list().cursor_region();

    // plenty of free bytes in total, but fragmented
    let err = allocator.allocate(500).unwrap_err();
    match err {
        AllocError::OutOfMemory {
            requested,
            largest_free,
            free_total,
        } => {
            assert_eq!(requested, 500 + H);
            assert!(largest_free < requested);
            assert!(free_total >= requested);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(regions(&allocator), before);
    assert_eq!(allocator.free_list().cursor_region(), cursor_before);
    assert_eq!(allocator.outstanding(), 1);
}

#[test]
fn test_exhaust_and_recover() {
    let mut allocator = Allocator::initialize(0, 10 * (50 + H)).unwrap();
    let mut headers = Vec::new();
    for _ in 0..10 {
        headers.push(allocator.allocate(50).unwrap());
    }
    assert!(allocator.free_list().is_empty());
    assert!(matches!(
        allocator.allocate(1),
        Err(AllocError::OutOfMemory { .. })
    ));

    // releasing every other allocation leaves five separate holes
    let mut kept = Vec::new();
    for (i, header) in headers.into_iter().enumerate() {
        if i % 2 == 0 {
            allocator.release(header).unwrap();
        } else {
            kept.push(header);
        }
    }
    assert_eq!(allocator.free_list().len(), 5);
    assert!(matches!(
        allocator.allocate(51),
        Err(AllocError::OutOfMemory { .. })
    ));

    for header in kept {
        allocator.release(header).unwrap();
    }
    assert_eq!(regions(&allocator), vec![(0, 10 * (50 + H))]);
}

#[test]
fn test_header_from_other_allocator_rejected() {
    let mut left = Allocator::initialize(0, 1000).unwrap();
    let mut right = Allocator::initialize(0, 1000).unwrap();
    assert_ne!(left.id(), right.id());

    let foreign = left.allocate(100).unwrap();
    let _local = right.allocate(100).unwrap();
    assert!(!right.is_outstanding(&foreign));

    let before = regions(&right);
    let err = right.release(foreign).unwrap_err();
    assert!(matches!(err, AllocError::InvalidHandle { address: 0, .. }));
    assert_eq!(regions(&right), before);
    assert_eq!(right.outstanding(), 1);
}

#[test]
fn test_with_config() {
    let config = AllocatorConfig::with_range(0x1000, 0x400);
    let allocator = Allocator::with_config(&config).unwrap();
    assert_eq!(allocator.base(), 0x1000);
    assert_eq!(allocator.size(), 0x400);
    assert_eq!(regions(&allocator), vec![(0x1000, 0x400)]);
}

#[test]
fn test_stats_serialize() {
    let mut allocator = Allocator::initialize(0, 1000).unwrap();
    let _header = allocator.allocate(100).unwrap();

    let stats = allocator.stats();
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["outstanding"], 1);
    assert_eq!(json["used_bytes"], 100 + H);
    assert_eq!(json["free_regions"], 1);

    let (total, used, available) = allocator.info();
    assert_eq!((total, used, available), (1000, 100 + H, 900 - H));
}
