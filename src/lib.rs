/*!
 * Next-Fit Region Allocator
 *
 * Manages a fixed abstract address range and hands out sub-ranges on
 * request. Free space is an address-ordered free list searched next-fit,
 * split in place on allocation and coalesced on release.
 *
 * ```
 * use nextfit::{Allocator, HEADER_SIZE};
 *
 * let mut allocator = Allocator::initialize(500, 1000).unwrap();
 * let header = allocator.allocate(200).unwrap();
 * assert_eq!(header.header_address(), 500);
 * assert_eq!(header.payload_address(), 500 + HEADER_SIZE);
 *
 * allocator.release(header).unwrap();
 * assert_eq!(allocator.free_regions().count(), 1);
 * ```
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::{Address, AllocatorConfig, AllocatorId, Size, HEADER_SIZE};
pub use memory::{
    AllocError, AllocResult, AllocationHeader, Allocator, AllocatorStats, FreeList, FreeRegion,
    MemoryInfo, MemoryPressure, RegionAllocator, RegionId,
};
pub use monitoring::init_tracing;
