/*!
 * Next-Fit Placement Tests
 * Verifies that searches resume at the cursor instead of the lowest address
 */

use nextfit::{Allocator, FreeList, FreeRegion, HEADER_SIZE};
use pretty_assertions::assert_eq;

const H: usize = HEADER_SIZE;

#[test]
fn test_search_resumes_at_cursor() {
    let mut allocator = Allocator::initialize(0, 1000).unwrap();
    let a = allocator.allocate(100).unwrap();
    let _b = allocator.allocate(100).unwrap();

    // R1 = [0, 100 + H) becomes free and takes the cursor
    allocator.release(a).unwrap();
    assert_eq!(
        allocator.free_list().cursor_region(),
        Some(FreeRegion::new(0, 100 + H))
    );

    // too big for R1: the scan moves on and parks the cursor on R2
    let d = allocator.allocate(300).unwrap();
    assert_eq!(d.header_address(), 200 + 2 * H);

    // fits R1, but next-fit keeps going from R2
    let e = allocator.allocate(50).unwrap();
    assert_eq!(e.header_address(), 500 + 3 * H);
    assert_eq!(
        allocator.free_regions().next(),
        Some(FreeRegion::new(0, 100 + H))
    );
}

#[test]
fn test_first_search_starts_at_head() {
    let mut list = FreeList::new();
    list.insert(300, 50).unwrap();
    list.insert(100, 50).unwrap();
    assert!(list.cursor_region().is_none());

    let id = list.search(50).unwrap();
    assert_eq!(list.region(id).unwrap(), FreeRegion::new(100, 50));
}

#[test]
fn test_scan_wraps_to_front() {
    let mut list = FreeList::new();
    list.insert(0, 80).unwrap();
    list.insert(200, 30).unwrap();
    list.insert(400, 90).unwrap();

    // cursor on the last region
    let last = list.search(81).unwrap();
    assert_eq!(list.region(last).unwrap(), FreeRegion::new(400, 90));
    list.split(last, 50).unwrap();

    // nothing from [450, 490) onward fits 70, so the scan wraps to 0
    let id = list.search(70).unwrap();
    assert_eq!(list.region(id).unwrap(), FreeRegion::new(0, 80));
    assert_eq!(list.cursor_region(), Some(FreeRegion::new(0, 80)));
}

#[test]
fn test_full_circle_without_fit() {
    let mut list = FreeList::new();
    list.insert(0, 10).unwrap();
    list.insert(20, 10).unwrap();
    list.insert(40, 10).unwrap();
    let head = list.search(10).unwrap();
    list.split(head, 5).unwrap();

    assert!(list.search(11).is_none());
    assert_eq!(list.cursor_region(), Some(FreeRegion::new(5, 5)));
}

#[test]
fn test_exact_fit_clears_cursor_then_restarts_at_head() {
    let mut allocator = Allocator::initialize(0, 1000).unwrap();
    let a = allocator.allocate(100).unwrap();
    let _b = allocator.allocate(100).unwrap();
    allocator.release(a).unwrap();

    // consumes R1 exactly, which unsets the cursor
    let c = allocator.allocate(100).unwrap();
    assert_eq!(c.header_address(), 0);
    assert!(allocator.free_list().cursor_region().is_none());

    let d = allocator.allocate(10).unwrap();
    assert_eq!(d.header_address(), 200 + 2 * H);
    allocator.free_list().verify().unwrap();
}
