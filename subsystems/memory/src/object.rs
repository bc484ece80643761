//! # Reference-Counted Object Heap
//!
//! Individually owned objects whose lifetime is tracked by a reference count.
//!
//! The heap draws payload memory from its own buffer, never from an arena,
//! so an object survives any arena scope it was created in. Payload space is
//! managed by an address-ordered free list (first fit, split on allocation,
//! coalesced with both neighbours on free).
//!
//! ## Handles
//!
//! Objects are addressed by [`ObjRef`], an index into a fixed slot table
//! plus the generation of that slot. Freeing an object advances the
//! generation, so every outstanding handle to it goes stale:
//!
//! ```text
//!  ObjRef { index: 2, generation: 5 }
//!             │
//!             ▼
//!  slots: [ .. | .. | header{rc,size} gen=5 extent ─┐ | .. ]
//!                                                   │
//!  memory: ┌──────┬────────────┬────────┬───────────▼──────┬──────┐
//!          │ free │  object 0  │  free  │     object 2     │ free │
//!          └──────┴────────────┴────────┴──────────────────┴──────┘
//! ```
//!
//! Reference cycles are never reclaimed.

use core::mem::size_of;

use heapless::Vec;

use crate::stats::StatsTracker;
use crate::{align_offset_of, align_up, MemError, MemResult, OBJECT_ALIGN};

// =============================================================================
// HEADER
// =============================================================================

/// Per-object bookkeeping
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectHeader {
    /// Live references
    pub refcount: u32,
    /// Payload size in bytes
    pub size: u32,
}

static_assertions::const_assert_eq!(size_of::<ObjectHeader>(), 8);

/// Slot table entry
#[derive(Debug, Clone, Copy)]
struct Slot {
    header: ObjectHeader,
    generation: u32,
    /// Payload offset in the heap buffer
    offset: usize,
    /// Extent reserved for the payload
    capacity: usize,
}

impl Slot {
    const EMPTY: Self = Self {
        header: ObjectHeader {
            refcount: 0,
            size: 0,
        },
        generation: 0,
        offset: 0,
        capacity: 0,
    };
}

/// Free range of the heap buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    offset: usize,
    len: usize,
}

impl Extent {
    #[inline]
    fn end(&self) -> usize {
        self.offset + self.len
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Handle to a reference-counted object
///
/// The generation is 32 bits wide. A slot whose generation is exhausted is
/// retired instead of wrapping, so no handle ever refers to a later object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

impl ObjRef {
    /// Slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation the handle was issued for
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

// =============================================================================
// OBJECT HEAP
// =============================================================================

/// Reference-counted allocator with room for `SLOTS` live objects
#[derive(Debug)]
pub struct ObjectHeap<'a, const SLOTS: usize> {
    /// Payload region, starting on an `OBJECT_ALIGN` boundary
    memory: &'a mut [u8],
    /// Object headers, indexed by `ObjRef::index`
    slots: [Slot; SLOTS],
    /// Unused slot indices (stack)
    free_slots: Vec<u32, SLOTS>,
    /// Free payload ranges, sorted by offset, never adjacent
    free_extents: Vec<Extent, SLOTS>,
    /// Objects currently live
    live: usize,
    /// Shared counters
    stats: &'a StatsTracker,
}

impl<'a, const SLOTS: usize> ObjectHeap<'a, SLOTS> {
    /// Create a heap over `buffer`.
    ///
    /// Leading bytes before the first aligned address and trailing bytes
    /// short of a full `OBJECT_ALIGN` unit are not used.
    pub fn new(buffer: &'a mut [u8], stats: &'a StatsTracker) -> Self {
        debug_assert!(SLOTS <= u32::MAX as usize);

        let skip = align_offset_of(buffer, OBJECT_ALIGN);
        let (_, rest) = buffer.split_at_mut(skip);
        let usable = rest.len() & !(OBJECT_ALIGN - 1);
        let (memory, _) = rest.split_at_mut(usable);

        let mut free_slots = Vec::new();
        for index in (0..SLOTS as u32).rev() {
            let _ = free_slots.push(index);
        }

        let mut free_extents = Vec::new();
        if usable > 0 && free_extents.push(Extent { offset: 0, len: usable }).is_err() {
            log::warn!("ObjectHeap: no slots, heap is unusable");
        }

        log::debug!("ObjectHeap: {} bytes, {} slots", usable, SLOTS);

        Self {
            memory,
            slots: [Slot::EMPTY; SLOTS],
            free_slots,
            free_extents,
            live: 0,
            stats,
        }
    }

    /// Allocate a zeroed object of `size` bytes with a reference count of 1
    pub fn alloc(&mut self, size: usize) -> MemResult<ObjRef> {
        let header_size = u32::try_from(size).map_err(|_| MemError::OutOfMemory)?;
        let needed = align_up(size.max(1), OBJECT_ALIGN).ok_or(MemError::OutOfMemory)?;

        let Some(pos) = self.free_extents.iter().position(|e| e.len >= needed) else {
            log::warn!(
                "ObjectHeap: out of memory (requested {}, largest free {})",
                size,
                self.largest_free_extent()
            );
            return Err(MemError::OutOfMemory);
        };
        let Some(index) = self.free_slots.pop() else {
            log::warn!("ObjectHeap: out of slots ({} live)", self.live);
            return Err(MemError::OutOfMemory);
        };

        let extent = &mut self.free_extents[pos];
        let offset = extent.offset;
        if extent.len == needed {
            self.free_extents.remove(pos);
        } else {
            extent.offset += needed;
            extent.len -= needed;
        }

        self.memory[offset..offset + needed].fill(0);

        let slot = &mut self.slots[index as usize];
        slot.header = ObjectHeader {
            refcount: 1,
            size: header_size,
        };
        slot.offset = offset;
        slot.capacity = needed;

        self.live += 1;
        self.stats.record_alloc(size);
        log::trace!("ObjectHeap: alloc {} bytes in slot {}", size, index);

        Ok(ObjRef {
            index,
            generation: slot.generation,
        })
    }

    /// Add a reference; returns the same handle
    pub fn retain(&mut self, obj: ObjRef) -> MemResult<ObjRef> {
        let slot = self.live_slot_mut(obj)?;
        slot.header.refcount = slot
            .header
            .refcount
            .checked_add(1)
            .ok_or(MemError::RefcountOverflow)?;
        Ok(obj)
    }

    /// Drop a reference; returns the remaining count.
    ///
    /// At zero the payload goes back to the free list and every handle to
    /// the object becomes stale. Releasing a stale handle fails with
    /// [`MemError::StaleHandle`].
    pub fn release(&mut self, obj: ObjRef) -> MemResult<u32> {
        let slot = self.live_slot_mut(obj)?;
        slot.header.refcount -= 1;
        if slot.header.refcount > 0 {
            return Ok(slot.header.refcount);
        }

        let size = slot.header.size as usize;
        let extent = Extent {
            offset: slot.offset,
            len: slot.capacity,
        };
        let exhausted = slot.generation == u32::MAX;
        slot.generation = slot.generation.wrapping_add(1);
        slot.header = ObjectHeader::default();

        self.free_extent(extent);
        if exhausted {
            log::debug!("ObjectHeap: slot {} retired, generations exhausted", obj.index);
        } else {
            let pushed = self.free_slots.push(obj.index).is_ok();
            debug_assert!(pushed);
        }

        self.live -= 1;
        self.stats.record_free(size);
        log::trace!("ObjectHeap: freed slot {} ({} bytes)", obj.index, size);

        Ok(0)
    }

    /// Current reference count, 0 once the object has been freed
    pub fn refcount(&self, obj: ObjRef) -> u32 {
        self.live_slot(obj).map(|slot| slot.header.refcount).unwrap_or(0)
    }

    /// Header of a live object
    pub fn header(&self, obj: ObjRef) -> MemResult<ObjectHeader> {
        self.live_slot(obj).map(|slot| slot.header)
    }

    /// Payload size of a live object
    pub fn size(&self, obj: ObjRef) -> MemResult<usize> {
        self.live_slot(obj).map(|slot| slot.header.size as usize)
    }

    /// Borrow the payload of a live object
    pub fn data(&self, obj: ObjRef) -> MemResult<&[u8]> {
        let slot = self.live_slot(obj)?;
        let (offset, size) = (slot.offset, slot.header.size as usize);
        Ok(&self.memory[offset..offset + size])
    }

    /// Mutably borrow the payload of a live object
    pub fn data_mut(&mut self, obj: ObjRef) -> MemResult<&mut [u8]> {
        let slot = self.live_slot(obj)?;
        let (offset, size) = (slot.offset, slot.header.size as usize);
        Ok(&mut self.memory[offset..offset + size])
    }

    /// Usable payload capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Number of live objects
    #[inline]
    pub fn live_objects(&self) -> usize {
        self.live
    }

    /// Total free payload bytes
    pub fn free_bytes(&self) -> usize {
        self.free_extents.iter().map(|e| e.len).sum()
    }

    /// Largest single allocation that could currently succeed (rounded)
    pub fn largest_free_extent(&self) -> usize {
        self.free_extents.iter().map(|e| e.len).max().unwrap_or(0)
    }

    fn live_slot(&self, obj: ObjRef) -> MemResult<&Slot> {
        match self.slots.get(obj.index as usize) {
            Some(slot) if slot.generation == obj.generation && slot.header.refcount > 0 => {
                Ok(slot)
            }
            _ => {
                #[cfg(feature = "debug")]
                log::warn!("ObjectHeap: stale handle {:?}", obj);
                Err(MemError::StaleHandle)
            }
        }
    }

    fn live_slot_mut(&mut self, obj: ObjRef) -> MemResult<&mut Slot> {
        match self.slots.get_mut(obj.index as usize) {
            Some(slot) if slot.generation == obj.generation && slot.header.refcount > 0 => {
                Ok(slot)
            }
            _ => {
                #[cfg(feature = "debug")]
                log::warn!("ObjectHeap: stale handle {:?}", obj);
                Err(MemError::StaleHandle)
            }
        }
    }

    /// Return `extent` to the free list, merging with adjacent ranges
    fn free_extent(&mut self, extent: Extent) {
        let pos = self
            .free_extents
            .partition_point(|e| e.offset < extent.offset);

        let merge_prev = pos > 0 && self.free_extents[pos - 1].end() == extent.offset;
        let merge_next =
            pos < self.free_extents.len() && extent.end() == self.free_extents[pos].offset;

        match (merge_prev, merge_next) {
            (true, true) => {
                let next = self.free_extents.remove(pos);
                self.free_extents[pos - 1].len += extent.len + next.len;
            }
            (true, false) => self.free_extents[pos - 1].len += extent.len,
            (false, true) => {
                let next = &mut self.free_extents[pos];
                next.offset = extent.offset;
                next.len += extent.len;
            }
            (false, false) => {
                // Free ranges are separated by live objects, so there are
                // never more of them than slots.
                let inserted = self.free_extents.insert(pos, extent).is_ok();
                debug_assert!(inserted);
            }
        }
    }
}

static_assertions::assert_impl_all!(ObjRef: Send, Sync, Copy);
static_assertions::assert_impl_all!(ObjectHeap<'static, 16>: Send);
