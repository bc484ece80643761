//! # Allocation Statistics
//!
//! Passive counters shared by the arena and the object heap.
//!
//! A [`StatsTracker`] is borrowed by every allocator that reports into it,
//! so one tracker can aggregate several allocators. Counters are relaxed
//! atomics: the tracker must be `Sync` to live in a `static`, but no ordering
//! is promised between individual counters.

use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Immutable copy of the allocation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Cumulative bytes ever handed out
    pub total_allocated: usize,
    /// Bytes currently live
    pub current_used: usize,
    /// Historical maximum of `current_used`
    pub peak_used: usize,
    /// Cumulative successful allocations
    pub alloc_count: u32,
    /// Cumulative frees (including allocations rolled back by restore)
    pub free_count: u32,
}

impl AllocStats {
    /// Number of allocations currently live
    pub fn live_allocs(&self) -> u32 {
        self.alloc_count.saturating_sub(self.free_count)
    }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Memory Statistics ===")?;
        writeln!(f, "Total allocated: {} bytes", self.total_allocated)?;
        writeln!(f, "Current used:    {} bytes", self.current_used)?;
        writeln!(f, "Peak used:       {} bytes", self.peak_used)?;
        writeln!(f, "Allocations:     {}", self.alloc_count)?;
        write!(f, "Frees:           {}", self.free_count)
    }
}

// =============================================================================
// TRACKER
// =============================================================================

/// Shared allocation counters
#[derive(Debug)]
pub struct StatsTracker {
    total_allocated: AtomicUsize,
    current_used: AtomicUsize,
    peak_used: AtomicUsize,
    alloc_count: AtomicU32,
    free_count: AtomicU32,
}

impl StatsTracker {
    /// Create a zeroed tracker
    pub const fn new() -> Self {
        Self {
            total_allocated: AtomicUsize::new(0),
            current_used: AtomicUsize::new(0),
            peak_used: AtomicUsize::new(0),
            alloc_count: AtomicU32::new(0),
            free_count: AtomicU32::new(0),
        }
    }

    /// Record one successful allocation of `bytes` caller-visible bytes
    pub(crate) fn record_alloc(&self, bytes: usize) {
        self.total_allocated.fetch_add(bytes, Ordering::Relaxed);
        let used = self.current_used.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak_used.fetch_max(used, Ordering::Relaxed);
        self.alloc_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one free of `bytes`
    #[cfg(feature = "refcount")]
    pub(crate) fn record_free(&self, bytes: usize) {
        self.record_bulk_free(bytes, 1);
    }

    /// Record `count` allocations totalling `bytes` released at once
    pub(crate) fn record_bulk_free(&self, bytes: usize, count: u32) {
        if count == 0 {
            return;
        }
        // Saturate: a tracker may be shared by allocators rebound mid-flight.
        let _ = self
            .current_used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                Some(used.saturating_sub(bytes))
            });
        self.free_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters
    pub fn snapshot(&self) -> AllocStats {
        let current_used = self.current_used.load(Ordering::Relaxed);
        AllocStats {
            total_allocated: self.total_allocated.load(Ordering::Relaxed),
            current_used,
            peak_used: self.peak_used.load(Ordering::Relaxed).max(current_used),
            alloc_count: self.alloc_count.load(Ordering::Relaxed),
            free_count: self.free_count.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.total_allocated.store(0, Ordering::Relaxed);
        self.current_used.store(0, Ordering::Relaxed);
        self.peak_used.store(0, Ordering::Relaxed);
        self.alloc_count.store(0, Ordering::Relaxed);
        self.free_count.store(0, Ordering::Relaxed);
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(StatsTracker: Send, Sync);
static_assertions::assert_impl_all!(AllocStats: Send, Sync, Copy);
