/*!
 * Memory Types
 * Common types for the free-space engine
 */

use crate::core::limits::{HEADER_SIZE, PRESSURE_CRITICAL, PRESSURE_HIGH, PRESSURE_MEDIUM};
use crate::core::types::{Address, AllocatorId, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Memory operation result
pub type AllocResult<T> = Result<T, AllocError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("Out of memory: requested {requested} bytes (header included), largest free region {largest_free} bytes, {free_total} bytes free in total")]
    OutOfMemory {
        requested: Size,
        largest_free: Size,
        free_total: Size,
    },

    #[error("Zero-sized allocation requested")]
    ZeroSize,

    #[error("Invalid handle: header at 0x{address:x} (allocator {owner}) is not outstanding here")]
    InvalidHandle { address: Address, owner: AllocatorId },

    #[error("Invalid range: base 0x{base:x}, size {size}")]
    InvalidRange { base: Address, size: Size },

    #[error("Stale free region handle {0}")]
    StaleRegion(RegionId),

    #[error("Free list corruption detected: {0}")]
    CorruptionDetected(String),
}

/// Slot handle for a region in the free list arena.
/// The generation changes every time the slot is recycled, so a handle
/// outliving its region is detected instead of aliasing a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Contiguous free interval `[address, address + size)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRegion {
    pub address: Address,
    pub size: Size,
}

impl FreeRegion {
    pub fn new(address: Address, size: Size) -> Self {
        Self { address, size }
    }

    /// One past the last free address
    pub fn end(&self) -> Address {
        self.address + self.size
    }
}

/// Metadata for one outstanding allocation.
///
/// Only `Allocator::allocate` creates these. The type is neither `Clone` nor
/// `Copy`, and `Allocator::release` takes it by value, so each header is
/// handed back at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct AllocationHeader {
    header_address: Address,
    payload_address: Address,
    payload_size: Size,
    owner: AllocatorId,
}

impl AllocationHeader {
    pub(crate) fn new(header_address: Address, payload_size: Size, owner: AllocatorId) -> Self {
        Self {
            header_address,
            payload_address: header_address + HEADER_SIZE,
            payload_size,
            owner,
        }
    }

    /// Start of the carved-out region (header included)
    pub fn header_address(&self) -> Address {
        self.header_address
    }

    /// First address usable by the caller
    pub fn payload_address(&self) -> Address {
        self.payload_address
    }

    /// Bytes usable by the caller
    pub fn payload_size(&self) -> Size {
        self.payload_size
    }

    /// Bytes this allocation occupies in the managed range
    pub fn total_size(&self) -> Size {
        self.payload_size + HEADER_SIZE
    }

    /// Allocator that produced this header
    pub fn owner(&self) -> AllocatorId {
        self.owner
    }
}

/// Allocator statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorStats {
    pub base: Address,
    pub total: Size,
    pub free_bytes: Size,
    /// Bytes held by outstanding allocations, header overhead included
    pub used_bytes: Size,
    pub outstanding: usize,
    pub free_regions: usize,
    pub largest_free: Size,
    pub usage_percentage: f64,
}

impl AllocatorStats {
    pub fn pressure(&self) -> MemoryPressure {
        MemoryPressure::from_ratio(self.usage_percentage / 100.0)
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl MemoryPressure {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= PRESSURE_CRITICAL {
            MemoryPressure::Critical
        } else if ratio >= PRESSURE_HIGH {
            MemoryPressure::High
        } else if ratio >= PRESSURE_MEDIUM {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

impl fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
