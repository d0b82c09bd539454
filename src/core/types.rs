/*!
 * Core Types
 * Common types used across the allocator
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Address type for memory operations
pub type Address = usize;

/// Size type for memory operations
pub type Size = usize;

/// Identity of one allocator instance, stamped into every header it hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocatorId(pub u64);

static NEXT_ALLOCATOR_ID: AtomicU64 = AtomicU64::new(1);

impl AllocatorId {
    /// Generate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_ALLOCATOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AllocatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
