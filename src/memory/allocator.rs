/*!
 * Next-Fit Region Allocator
 * Allocation and release over one managed address range
 */

use super::free_list::{FreeList, Regions};
use super::traits::{MemoryInfo, RegionAllocator};
use super::types::{
    AllocError, AllocResult, AllocationHeader, AllocatorStats, FreeRegion, MemoryPressure,
};
use crate::core::config::AllocatorConfig;
use crate::core::limits::HEADER_SIZE;
use crate::core::types::{Address, AllocatorId, Size};
use ahash::RandomState;
use log::{debug, info, warn};
use std::collections::HashMap;

/// Allocator over `[base, base + size)`.
///
/// Free space is tracked by a single address-ordered [`FreeList`] searched
/// next-fit. Outstanding allocations are remembered by address so that
/// headers from another allocator, or ones no longer outstanding, are
/// rejected before they can corrupt the free list.
///
/// Not thread-safe: wrap it in a lock to share it.
#[derive(Debug)]
pub struct Allocator {
    id: AllocatorId,
    base: Address,
    size: Size,
    free_list: FreeList,
    // header address -> bytes held (header included)
    outstanding: HashMap<Address, Size, RandomState>,
    used: Size,
}

impl Allocator {
    /// Manage `[base, base + size)` as one free region
    pub fn initialize(base: Address, size: Size) -> AllocResult<Self> {
        if size == 0 || base.checked_add(size).is_none() {
            return Err(AllocError::InvalidRange { base, size });
        }

        let free_list = FreeList::with_region(base, size)?;
        let id = AllocatorId::next();
        info!(
            "Allocator {} initialized over [0x{:x}, 0x{:x}) ({} bytes, {} byte headers)",
            id,
            base,
            base + size,
            size,
            HEADER_SIZE
        );

        Ok(Self {
            id,
            base,
            size,
            free_list,
            outstanding: HashMap::with_hasher(RandomState::new()),
            used: 0,
        })
    }

    /// Create an allocator from configuration
    pub fn with_config(config: &AllocatorConfig) -> AllocResult<Self> {
        Self::initialize(config.base, config.size)
    }

    pub fn id(&self) -> AllocatorId {
        self.id
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Read-only view of the free list
    pub fn free_list(&self) -> &FreeList {
        &self.free_list
    }

    /// Free regions in ascending address order
    pub fn free_regions(&self) -> Regions<'_> {
        self.free_list.regions()
    }

    /// Number of outstanding allocations
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Whether `header` is currently outstanding in this allocator
    pub fn is_outstanding(&self, header: &AllocationHeader) -> bool {
        header.owner() == self.id
            && self.outstanding.get(&header.header_address()) == Some(&header.total_size())
    }

    /// Allocate `size` payload bytes.
    ///
    /// Consumes `size + HEADER_SIZE` bytes from the first region found by a
    /// next-fit search. Fails without touching the free list when no single
    /// region is large enough.
    pub fn allocate(&mut self, size: Size) -> AllocResult<AllocationHeader> {
        if size == 0 {
            warn!("Allocator {}: rejected zero-sized allocation", self.id);
            return Err(AllocError::ZeroSize);
        }

        let size_with_header = size
            .checked_add(HEADER_SIZE)
            .ok_or_else(|| self.out_of_memory(Size::MAX))?;

        let region = self
            .free_list
            .search(size_with_header)
            .ok_or_else(|| self.out_of_memory(size_with_header))?;
        let header_address = self.free_list.split(region, size_with_header)?;

        self.outstanding.insert(header_address, size_with_header);
        self.used += size_with_header;

        let header = AllocationHeader::new(header_address, size, self.id);
        self.log_allocation(&header);
        Ok(header)
    }

    /// Return an allocation to the free list, coalescing with its neighbours.
    ///
    /// Headers from another allocator, or whose address is not outstanding
    /// here, are rejected with [`AllocError::InvalidHandle`] and the free list
    /// is left untouched.
    pub fn release(&mut self, header: AllocationHeader) -> AllocResult<()> {
        let address = header.header_address();
        let size = header.total_size();

        if !self.is_outstanding(&header) {
            warn!(
                "Allocator {}: rejected release of header 0x{:x} from allocator {}",
                self.id,
                address,
                header.owner()
            );
            return Err(AllocError::InvalidHandle {
                address,
                owner: header.owner(),
            });
        }

        self.free_list.insert(address, size)?;
        self.outstanding.remove(&address);
        self.used -= size;

        debug!(
            "Released {} bytes at 0x{:x} ({} free regions, {} bytes free)",
            size,
            address,
            self.free_list.len(),
            self.size - self.used
        );
        Ok(())
    }

    /// Current statistics snapshot
    pub fn stats(&self) -> AllocatorStats {
        let free_bytes = self.free_list.total_free();
        AllocatorStats {
            base: self.base,
            total: self.size,
            free_bytes,
            used_bytes: self.used,
            outstanding: self.outstanding.len(),
            free_regions: self.free_list.len(),
            largest_free: self.free_list.largest(),
            usage_percentage: (self.used as f64 / self.size as f64) * 100.0,
        }
    }

    fn out_of_memory(&self, requested: Size) -> AllocError {
        let largest_free = self.free_list.largest();
        let free_total = self.free_list.total_free();
        warn!(
            "OOM: allocator {} needs {} bytes, largest free region {} bytes ({} free in {} regions)",
            self.id,
            requested,
            largest_free,
            free_total,
            self.free_list.len()
        );
        AllocError::OutOfMemory {
            requested,
            largest_free,
            free_total,
        }
    }

    fn log_allocation(&self, header: &AllocationHeader) {
        let ratio = self.used as f64 / self.size as f64;
        match MemoryPressure::from_ratio(ratio) {
            MemoryPressure::Low => debug!(
                "Allocated {} bytes at 0x{:x} (header 0x{:x})",
                header.payload_size(),
                header.payload_address(),
                header.header_address()
            ),
            level => warn!(
                "Memory pressure {}: allocated {} bytes at 0x{:x} ({:.1}% used: {} / {})",
                level,
                header.payload_size(),
                header.payload_address(),
                ratio * 100.0,
                self.used,
                self.size
            ),
        }
    }
}

impl RegionAllocator for Allocator {
    fn allocate(&mut self, size: Size) -> AllocResult<AllocationHeader> {
        Allocator::allocate(self, size)
    }

    fn release(&mut self, header: AllocationHeader) -> AllocResult<()> {
        Allocator::release(self, header)
    }
}

impl MemoryInfo for Allocator {
    fn stats(&self) -> AllocatorStats {
        Allocator::stats(self)
    }

    fn info(&self) -> (Size, Size, Size) {
        (self.size, self.used, self.size - self.used)
    }
}

impl<'a> IntoIterator for &'a Allocator {
    type Item = FreeRegion;
    type IntoIter = Regions<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.free_regions()
    }
}
