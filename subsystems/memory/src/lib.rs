//! # GCRT Memory Subsystem
//!
//! Deterministic memory management for constrained runtimes. Nothing in this
//! crate touches a general-purpose heap: every byte handed out comes from a
//! buffer the caller supplied.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      GCRT Memory Subsystem                      │
//! │                                                                 │
//! │  ┌──────────────────────────┐    ┌───────────────────────────┐  │
//! │  │         Arena            │    │       Object Heap         │  │
//! │  │  (bump pointer, scoped   │    │  (refcounted, free-list,  │  │
//! │  │   checkpoint/restore)    │    │   outlives arena scopes)  │  │
//! │  └────────────┬─────────────┘    └─────────────┬─────────────┘  │
//! │               │                                │                │
//! │  ┌────────────┴────────────────────────────────┴─────────────┐  │
//! │  │                      Stats Tracker                        │  │
//! │  │   (total / current / peak bytes, alloc / free counts)     │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Allocation Strategies
//!
//! - **Arena**: O(1) bump allocation. Individual blocks are never freed;
//!   [`Arena::restore`] rolls back everything allocated after a
//!   [`Checkpoint`], and [`ArenaScope`] does so automatically on drop.
//! - **Object heap**: individually owned objects with a reference count.
//!   The last [`ObjectHeap::release`] returns the payload to the heap's
//!   free list. Reference cycles are never reclaimed.
//!
//! Both allocators hand out handles ([`ArenaBlock`], [`ObjRef`]) rather than
//! raw addresses, so use-after-restore, use-after-free and double release
//! surface as [`MemError::StaleHandle`] instead of memory corruption.
//!
//! Arena handles are stamped with an allocation sequence number, and the
//! arena remembers the last [`ROLLBACK_HISTORY`] rolled-back sequence ranges.
//! Detection is exact within that window. Older ranges are forgotten and
//! blocks from them are only rejected while they lie past the current
//! offset. Object handles carry a 32-bit slot generation that wraps after
//! 2^32 reuses of the same slot.
//!
//! ## Zeroing
//!
//! Every allocation is zero-filled before it is returned. Stale bytes from a
//! rolled-back scope never leak into a new allocation.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arena;
pub mod global;
#[cfg(feature = "refcount")]
pub mod object;
pub mod scope;
pub mod stats;

// Re-exports
pub use arena::{Arena, ArenaBlock, Checkpoint};
pub use global::{
    get_stats, global_scope, init_global_arena, print_stats, with_global_arena, GLOBAL_STATS,
};
#[cfg(feature = "refcount")]
pub use object::{ObjRef, ObjectHeader, ObjectHeap};
pub use scope::ArenaScope;
pub use stats::{AllocStats, StatsTracker};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Recommended capacity of the global arena's backing buffer (16 KiB)
pub const GLOBAL_ARENA_SIZE: usize = 16 * 1024;

/// Alignment of every arena block start (pointer size)
pub const ARENA_ALIGN: usize = core::mem::size_of::<usize>();

/// Alignment of every object payload
pub const OBJECT_ALIGN: usize = 8;

/// Rolled-back sequence ranges each arena remembers for stale-handle checks
pub const ROLLBACK_HISTORY: usize = 32;

static_assertions::const_assert!(ARENA_ALIGN.is_power_of_two());
static_assertions::const_assert!(OBJECT_ALIGN.is_power_of_two());
static_assertions::const_assert!(ROLLBACK_HISTORY > 0);

// =============================================================================
// ERRORS
// =============================================================================

/// Memory subsystem errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    /// Arena or object heap cannot satisfy the request
    OutOfMemory,
    /// Checkpoint was invalidated by a reset, rebind or earlier restore
    InvalidCheckpoint,
    /// Handle no longer refers to live memory
    StaleHandle,
    /// Reference count would overflow
    RefcountOverflow,
    /// Global arena used before initialization
    NotInitialized,
}

impl core::fmt::Display for MemError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "Out of memory"),
            Self::InvalidCheckpoint => write!(f, "Invalid checkpoint"),
            Self::StaleHandle => write!(f, "Stale handle"),
            Self::RefcountOverflow => write!(f, "Reference count overflow"),
            Self::NotInitialized => write!(f, "Global arena not initialized"),
        }
    }
}

/// Result type for memory operations
pub type MemResult<T> = Result<T, MemError>;

// =============================================================================
// ALIGNMENT
// =============================================================================

/// Round `value` up to the next multiple of `align`.
///
/// `align` must be a power of two. Returns `None` on overflow.
#[inline]
pub const fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    match value.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}

/// Number of leading bytes to skip so `buffer` starts on an `align` boundary.
///
/// Returns `buffer.len()` when no aligned address lies inside the buffer.
#[inline]
pub(crate) fn align_offset_of(buffer: &[u8], align: usize) -> usize {
    let addr = buffer.as_ptr() as usize;
    match align_up(addr, align) {
        Some(aligned) => (aligned - addr).min(buffer.len()),
        None => buffer.len(),
    }
}
