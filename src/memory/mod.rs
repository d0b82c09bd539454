/*!
 * Memory Module
 *
 * Free-space tracking for one managed address range.
 *
 * ## Placement
 *
 * Free regions are kept in a single **address-ordered free list** searched
 * **next-fit**: each search resumes at the region where the previous one
 * succeeded and wraps around once before giving up.
 *
 * ## Features
 *
 * - **Splitting**: the low end of a region is handed out, the remainder stays free in place
 * - **Coalescing**: released ranges merge with address-adjacent neighbours on both sides
 * - **Handle provenance**: headers are move-only and checked against the issuing allocator
 * - **Memory pressure tracking**: Warns at 60% / 80%, critical at 95%
 */

pub mod allocator;
pub mod free_list;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use allocator::Allocator;
pub use free_list::{FreeList, Regions};
pub use traits::*;
pub use types::*;
