/*!
 * Address-Ordered Free List
 * Next-fit search, in-place splitting and adjacency coalescing
 */

use super::types::{AllocError, AllocResult, FreeRegion, RegionId};
use crate::core::types::{Address, Size};
use log::{debug, trace};

/// Region node; `prev`/`next` are slot indices in address order
#[derive(Debug, Clone)]
struct Node {
    address: Address,
    size: Size,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Node {
    fn end(&self) -> Address {
        self.address + self.size
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Occupied { generation: u32, node: Node },
    Vacant { generation: u32, next_vacant: Option<usize> },
}

/// Address-ordered free list with a next-fit cursor.
///
/// Regions live in an arena of slots and link to their neighbours by index.
/// Slots released by merges or exact-fit splits are chained into a vacant
/// list and reused by later inserts.
///
/// Invariants (checked by [`FreeList::verify`]):
/// - regions are strictly ascending by address
/// - no region ends exactly where its successor starts
/// - every size is positive
/// - the cursor, when set, names a live region
#[derive(Debug, Clone, Default)]
pub struct FreeList {
    slots: Vec<Slot>,
    vacant: Option<usize>,
    head: Option<usize>,
    cursor: Option<usize>,
    len: usize,
}

impl FreeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// List holding the single region `[address, address + size)`
    pub fn with_region(address: Address, size: Size) -> AllocResult<Self> {
        let mut list = Self::new();
        list.insert(address, size)?;
        Ok(list)
    }

    /// Number of free regions
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Region the next search starts from, if the cursor is set
    pub fn cursor_region(&self) -> Option<FreeRegion> {
        self.cursor.map(|idx| self.region_at(idx))
    }

    /// Look up a region by handle
    pub fn region(&self, id: RegionId) -> AllocResult<FreeRegion> {
        let idx = self.resolve(id)?;
        Ok(self.region_at(idx))
    }

    /// Free regions in ascending address order
    pub fn regions(&self) -> Regions<'_> {
        Regions {
            list: self,
            next: self.head,
        }
    }

    /// Sum of all free region sizes
    pub fn total_free(&self) -> Size {
        self.regions().map(|r| r.size).sum()
    }

    /// Size of the largest free region (0 when empty)
    pub fn largest(&self) -> Size {
        self.regions().map(|r| r.size).max().unwrap_or(0)
    }

    /// Next-fit search.
    ///
    /// Starts at the cursor (or the head when unset), walks forward and wraps
    /// once. The first region of at least `requested` bytes becomes the
    /// cursor and is returned. A failed search leaves the list untouched.
    pub fn search(&mut self, requested: Size) -> Option<RegionId> {
        let head = self.head?;
        let start = self.cursor.unwrap_or(head);
        let mut current = start;

        loop {
            let node = self.node(current);
            if node.size >= requested {
                trace!(
                    "next-fit: {} bytes satisfied by region 0x{:x} ({} bytes)",
                    requested,
                    node.address,
                    node.size
                );
                self.cursor = Some(current);
                return Some(self.id_of(current));
            }

            current = node.next.unwrap_or(head);
            if current == start {
                break;
            }
        }

        trace!("next-fit: no region of {} bytes after full scan", requested);
        None
    }

    /// Carve `requested` bytes off the low end of a region.
    ///
    /// An exact fit removes the region; otherwise it shrinks in place and
    /// keeps its slot. Returns the carved start address.
    pub fn split(&mut self, id: RegionId, requested: Size) -> AllocResult<Address> {
        let idx = self.resolve(id)?;
        let (address, size) = {
            let node = self.node(idx);
            (node.address, node.size)
        };

        if size < requested {
            return Err(AllocError::OutOfMemory {
                requested,
                largest_free: size,
                free_total: self.total_free(),
            });
        }

        if size == requested {
            self.remove_index(idx);
            debug!("Split consumed whole region 0x{:x} ({} bytes)", address, size);
        } else {
            let node = self.node_mut(idx);
            node.address += requested;
            node.size -= requested;
            debug!(
                "Split region 0x{:x}: carved {} bytes, {} bytes remain at 0x{:x}",
                address,
                requested,
                size - requested,
                address + requested
            );
        }

        Ok(address)
    }

    /// Insert `[address, address + size)` in address order and coalesce.
    ///
    /// Returns the handle of the region now covering the inserted range,
    /// which may be a neighbour that absorbed it. Rejects empty ranges and
    /// ranges overlapping an existing free region without touching the list.
    pub fn insert(&mut self, address: Address, size: Size) -> AllocResult<RegionId> {
        let end = match address.checked_add(size) {
            Some(end) if size > 0 => end,
            _ => {
                return Err(AllocError::InvalidRange {
                    base: address,
                    size,
                })
            }
        };

        let mut prev = None;
        let mut next = self.head;
        while let Some(idx) = next {
            let node = self.node(idx);
            if node.address >= address {
                break;
            }
            prev = Some(idx);
            next = node.next;
        }

        let overlaps_prev = prev.map_or(false, |p| self.node(p).end() > address);
        let overlaps_next = next.map_or(false, |n| end > self.node(n).address);
        if overlaps_prev || overlaps_next {
            return Err(AllocError::InvalidRange {
                base: address,
                size,
            });
        }

        let idx = self.alloc_slot(Node {
            address,
            size,
            prev,
            next,
        });
        match prev {
            Some(p) => self.node_mut(p).next = Some(idx),
            None => self.head = Some(idx),
        }
        if let Some(n) = next {
            self.node_mut(n).prev = Some(idx);
        }
        self.len += 1;

        let mut current = idx;

        // Merge into the predecessor
        if let Some(p) = prev {
            if self.node(p).end() == address {
                let pred = self.node_mut(p);
                pred.size += size;
                pred.next = next;
                if let Some(n) = next {
                    self.node_mut(n).prev = Some(p);
                }
                self.free_slot(idx);
                self.len -= 1;
                current = p;
                debug!("Coalesced 0x{:x} into predecessor", address);
            }
        }

        // Absorb the successor
        if let Some(n) = self.node(current).next {
            if self.node(current).end() == self.node(n).address {
                let (succ_size, succ_next) = {
                    let succ = self.node(n);
                    (succ.size, succ.next)
                };
                let merged = self.node_mut(current);
                merged.size += succ_size;
                merged.next = succ_next;
                if let Some(after) = succ_next {
                    self.node_mut(after).prev = Some(current);
                }
                if self.cursor == Some(n) {
                    self.cursor = Some(current);
                }
                self.free_slot(n);
                self.len -= 1;
                debug!("Coalesced successor into region 0x{:x}", self.node(current).address);
            }
        }

        if let Some(c) = self.cursor {
            if self.node(current).address < self.node(c).address {
                self.cursor = Some(current);
            }
        }

        Ok(self.id_of(current))
    }

    /// Unlink a region from the list, clearing the cursor if it pointed here
    pub fn remove(&mut self, id: RegionId) -> AllocResult<FreeRegion> {
        let idx = self.resolve(id)?;
        Ok(self.remove_index(idx))
    }

    /// Walk the list and check every structural invariant
    pub fn verify(&self) -> AllocResult<()> {
        let mut count = 0;
        let mut prev: Option<usize> = None;
        let mut current = self.head;
        let mut cursor_seen = self.cursor.is_none();

        while let Some(idx) = current {
            let node = match self.slots.get(idx) {
                Some(Slot::Occupied { node, .. }) => node,
                _ => {
                    return Err(AllocError::CorruptionDetected(format!(
                        "link to vacant slot {}",
                        idx
                    )))
                }
            };

            if node.prev != prev {
                return Err(AllocError::CorruptionDetected(format!(
                    "back link of region 0x{:x} is broken",
                    node.address
                )));
            }
            if node.size == 0 {
                return Err(AllocError::CorruptionDetected(format!(
                    "empty region at 0x{:x}",
                    node.address
                )));
            }
            if let Some(p) = prev {
                let before = self.node(p);
                if before.address >= node.address {
                    return Err(AllocError::CorruptionDetected(format!(
                        "region 0x{:x} follows 0x{:x}",
                        node.address, before.address
                    )));
                }
                if before.end() >= node.address {
                    return Err(AllocError::CorruptionDetected(format!(
                        "regions 0x{:x} and 0x{:x} touch or overlap",
                        before.address, node.address
                    )));
                }
            }
            if self.cursor == Some(idx) {
                cursor_seen = true;
            }

            count += 1;
            if count > self.slots.len() {
                return Err(AllocError::CorruptionDetected("cycle in free list".into()));
            }
            prev = Some(idx);
            current = node.next;
        }

        if count != self.len {
            return Err(AllocError::CorruptionDetected(format!(
                "count {} does not match {} linked regions",
                self.len, count
            )));
        }
        if !cursor_seen {
            return Err(AllocError::CorruptionDetected(
                "cursor names a region outside the list".into(),
            ));
        }
        Ok(())
    }

    fn remove_index(&mut self, idx: usize) -> FreeRegion {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };
        let region = self.region_at(idx);

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            self.node_mut(n).prev = prev;
        }
        if self.cursor == Some(idx) {
            self.cursor = None;
        }

        self.free_slot(idx);
        self.len -= 1;
        region
    }

    fn region_at(&self, idx: usize) -> FreeRegion {
        let node = self.node(idx);
        FreeRegion::new(node.address, node.size)
    }

    fn resolve(&self, id: RegionId) -> AllocResult<usize> {
        match self.slots.get(id.index) {
            Some(Slot::Occupied { generation, .. }) if *generation == id.generation => Ok(id.index),
            _ => Err(AllocError::StaleRegion(id)),
        }
    }

    fn id_of(&self, idx: usize) -> RegionId {
        let generation = match &self.slots[idx] {
            Slot::Occupied { generation, .. } | Slot::Vacant { generation, .. } => *generation,
        };
        RegionId {
            index: idx,
            generation,
        }
    }

    fn node(&self, idx: usize) -> &Node {
        match &self.slots[idx] {
            Slot::Occupied { node, .. } => node,
            Slot::Vacant { .. } => unreachable!("free list links to vacant slot {}", idx),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        match &mut self.slots[idx] {
            Slot::Occupied { node, .. } => node,
            Slot::Vacant { .. } => unreachable!("free list links to vacant slot {}", idx),
        }
    }

    fn alloc_slot(&mut self, node: Node) -> usize {
        match self.vacant {
            Some(idx) => {
                let (generation, next_vacant) = match &self.slots[idx] {
                    Slot::Vacant {
                        generation,
                        next_vacant,
                    } => (*generation, *next_vacant),
                    Slot::Occupied { .. } => unreachable!("vacant chain holds live slot {}", idx),
                };
                self.vacant = next_vacant;
                self.slots[idx] = Slot::Occupied { generation, node };
                idx
            }
            None => {
                self.slots.push(Slot::Occupied {
                    generation: 0,
                    node,
                });
                self.slots.len() - 1
            }
        }
    }

    fn free_slot(&mut self, idx: usize) {
        let generation = match &self.slots[idx] {
            Slot::Occupied { generation, .. } | Slot::Vacant { generation, .. } => {
                generation.wrapping_add(1)
            }
        };
        self.slots[idx] = Slot::Vacant {
            generation,
            next_vacant: self.vacant,
        };
        self.vacant = Some(idx);
    }
}

/// Iterator over free regions in ascending address order
pub struct Regions<'a> {
    list: &'a FreeList,
    next: Option<usize>,
}

impl<'a> Iterator for Regions<'a> {
    type Item = FreeRegion;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = self.list.node(idx);
        self.next = node.next;
        Some(FreeRegion::new(node.address, node.size))
    }
}
