/*!
 * Memory Traits
 * Allocation abstractions
 */

use super::types::*;
use crate::core::types::Size;

/// Region allocator interface
pub trait RegionAllocator {
    /// Carve `size` payload bytes (plus header) out of the managed range
    fn allocate(&mut self, size: Size) -> AllocResult<AllocationHeader>;

    /// Return an allocation to the free pool, consuming its header
    fn release(&mut self, header: AllocationHeader) -> AllocResult<()>;
}

/// Memory statistics provider
pub trait MemoryInfo {
    /// Get overall allocator statistics
    fn stats(&self) -> AllocatorStats;

    /// Get memory info as (total, used, available)
    fn info(&self) -> (Size, Size, Size);

    /// Get memory pressure level
    fn pressure(&self) -> MemoryPressure {
        self.stats().pressure()
    }
}
