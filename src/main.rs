/*!
 * Next-Fit Allocator - Demo Entry Point
 *
 * Replays a short allocate/release sequence against one allocator and
 * prints where each allocation landed and what the free list looks like.
 */

use anyhow::{Context, Result};
use tracing::{info, info_span};

use nextfit::{
    init_tracing, AllocationHeader, Allocator, AllocatorConfig, MemoryInfo, RegionAllocator,
};

/// Environment variable enabling a JSON stats dump at exit
const ENV_STATS_JSON: &str = "NEXTFIT_STATS_JSON";

fn allocate<A: RegionAllocator>(
    allocator: &mut A,
    size: usize,
) -> Result<AllocationHeader> {
    let header = allocator
        .allocate(size)
        .with_context(|| format!("allocating {} bytes", size))?;
    println!(
        "Allocated memory at: {} with size: {}",
        header.payload_address(),
        header.payload_size()
    );
    Ok(header)
}

fn release<A: RegionAllocator>(
    allocator: &mut A,
    header: AllocationHeader,
) -> Result<()> {
    let address = header.header_address();
    allocator
        .release(header)
        .with_context(|| format!("releasing header at {}", address))?;
    println!("Freed memory at: {}", address);
    Ok(())
}

fn print_free_list(allocator: &Allocator) {
    for region in allocator {
        println!(
            "Free block at: {} with size: {}",
            region.address, region.size
        );
    }
}

fn main() -> Result<()> {
    init_tracing();

    let config = AllocatorConfig::from_env();
    info!(base = config.base, size = config.size, "Starting next-fit demo");

    let mut allocator = Allocator::with_config(&config).context("initializing allocator")?;
    let _span = info_span!("demo", allocator = %allocator.id()).entered();

    let first = allocate(&mut allocator, 200)?;
    let second = allocate(&mut allocator, 200)?;

    release(&mut allocator, first)?;

    let third = allocate(&mut allocator, 100)?;

    print_free_list(&allocator);

    release(&mut allocator, second)?;
    release(&mut allocator, third)?;

    let stats = allocator.stats();
    info!(
        free_regions = stats.free_regions,
        free_bytes = stats.free_bytes,
        pressure = %allocator.pressure(),
        "Demo complete"
    );

    let dump_json = std::env::var(ENV_STATS_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);
    if dump_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}
