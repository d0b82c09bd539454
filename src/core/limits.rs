/*!
 * Allocator Limits and Constants
 *
 * Centralized location for the fixed sizes and thresholds used by the engine.
 */

use super::types::{Address, Size};

// =============================================================================
// HEADER
// =============================================================================

/// Bookkeeping overhead charged to every allocation.
/// Three address-width words: header address, payload address, payload size.
pub const HEADER_SIZE: Size = 3 * std::mem::size_of::<Address>();

// =============================================================================
// DEFAULT RANGE
// =============================================================================

/// Default base address of the managed range
pub const DEFAULT_BASE: Address = 500;

/// Default size of the managed range
pub const DEFAULT_SIZE: Size = 1000;

// =============================================================================
// MEMORY PRESSURE
// =============================================================================

/// Usage ratio at which pressure is reported as MEDIUM
pub const PRESSURE_MEDIUM: f64 = 0.60;

/// Usage ratio at which pressure is reported as HIGH
pub const PRESSURE_HIGH: f64 = 0.80;

/// Usage ratio at which pressure is reported as CRITICAL
pub const PRESSURE_CRITICAL: f64 = 0.95;
