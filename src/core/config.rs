/*!
 * Allocator Configuration
 *
 * Managed range settings with environment overrides.
 */

use super::limits::{DEFAULT_BASE, DEFAULT_SIZE};
use super::types::{Address, Size};
use log::warn;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the base address
pub const ENV_BASE: &str = "NEXTFIT_BASE";

/// Environment variable overriding the range size
pub const ENV_SIZE: &str = "NEXTFIT_SIZE";

/// Range managed by one allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// First address of the managed range (default: 500)
    pub base: Address,

    /// Number of addressable units in the range (default: 1000)
    pub size: Size,
}

impl AllocatorConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            base: DEFAULT_BASE,
            size: DEFAULT_SIZE,
        }
    }

    /// Create configuration for an explicit range
    pub fn with_range(base: Address, size: Size) -> Self {
        Self { base, size }
    }

    /// Defaults overridden by `NEXTFIT_BASE` / `NEXTFIT_SIZE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` yields for each variable
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(base) = parse_var(&lookup, ENV_BASE) {
            config.base = base;
        }
        if let Some(size) = parse_var(&lookup, ENV_SIZE) {
            config.size = size;
        }
        config
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
