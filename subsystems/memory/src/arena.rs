//! # Arena Allocator
//!
//! Bump-pointer allocation over a caller-owned buffer.
//!
//! ## Layout
//!
//! ```text
//!  base (ARENA_ALIGN aligned)                               capacity
//!  │                                                            │
//!  ▼                                                            ▼
//!  ┌────────┬──┬──────────┬────┬────────────┬───────────────────┐
//!  │ block0 │p │  block1  │ p  │   block2   │       free        │
//!  └────────┴──┴──────────┴────┴────────────┴───────────────────┘
//!                                           ▲
//!                                         offset
//! ```
//!
//! `p` is alignment padding. It consumes offset but is never reported as
//! allocated bytes.
//!
//! Nothing is freed individually. [`Arena::checkpoint`] captures the offset
//! and [`Arena::restore`] rolls it back, invalidating every block allocated
//! after the capture. The arena never grows.

use heapless::Vec;

use crate::stats::StatsTracker;
use crate::{align_offset_of, align_up, MemError, MemResult, ARENA_ALIGN, ROLLBACK_HISTORY};

// =============================================================================
// HANDLES
// =============================================================================

/// A block carved out of an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaBlock {
    offset: usize,
    len: usize,
    /// Allocation sequence number
    seq: u64,
}

impl ArenaBlock {
    /// Offset of the block from the arena base
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Requested size in bytes
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Is the block empty?
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset one past the last byte
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Opaque arena position captured by [`Arena::checkpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    offset: usize,
    live_bytes: usize,
    live_allocs: u64,
    /// Sequence number the next allocation would have received
    seq: u64,
}

impl Checkpoint {
    /// Arena offset at capture time
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

/// Sequence numbers `[start, end)` released by a restore or reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeqRange {
    start: u64,
    end: u64,
}

// =============================================================================
// ARENA
// =============================================================================

/// Bump allocator over a borrowed buffer
///
/// Every allocation and every rollback advances a sequence clock. Blocks
/// and checkpoints carry the clock value they were issued at, and the arena
/// remembers which ranges of the clock were rolled back, so a handle that
/// was released stays stale even after the offset grows past it again.
#[derive(Debug)]
pub struct Arena<'a> {
    /// Usable region, starting on an `ARENA_ALIGN` boundary
    memory: &'a mut [u8],
    /// Next free byte
    offset: usize,
    /// Caller-requested bytes currently live
    live_bytes: usize,
    /// Allocations currently live
    live_allocs: u64,
    /// Largest offset reached since the buffer was bound
    high_water: usize,
    /// Sequence clock, never rewound
    clock: u64,
    /// First sequence number issued for the current buffer
    floor: u64,
    /// Released sequence ranges, sorted, disjoint, oldest first
    rolled_back: Vec<SeqRange, ROLLBACK_HISTORY>,
    /// Shared counters
    stats: &'a StatsTracker,
}

impl<'a> Arena<'a> {
    /// Bind a new arena to `buffer`
    pub fn new(buffer: &'a mut [u8], stats: &'a StatsTracker) -> Self {
        let mut arena = Self {
            memory: &mut [],
            offset: 0,
            live_bytes: 0,
            live_allocs: 0,
            high_water: 0,
            clock: 0,
            floor: 0,
            rolled_back: Vec::new(),
            stats,
        };
        arena.init(buffer);
        arena
    }

    /// Rebind the arena to `buffer` and start over at offset zero.
    ///
    /// Blocks from the previous buffer are released in the stats, and every
    /// block and checkpoint issued for it becomes stale. Leading bytes before
    /// the first aligned address are skipped.
    pub fn init(&mut self, buffer: &'a mut [u8]) {
        self.stats.record_bulk_free(self.live_bytes, count_u32(self.live_allocs));

        let skip = align_offset_of(buffer, ARENA_ALIGN);
        let (_, memory) = buffer.split_at_mut(skip);
        self.memory = memory;
        self.offset = 0;
        self.live_bytes = 0;
        self.live_allocs = 0;
        self.high_water = 0;
        self.clock += 1;
        self.floor = self.clock;
        self.rolled_back.clear();

        if self.memory.is_empty() {
            log::warn!("Arena: bound to an empty buffer");
        } else {
            log::debug!("Arena: bound {} bytes (skipped {})", self.memory.len(), skip);
        }
    }

    /// Allocate `size` zeroed bytes.
    ///
    /// Fails with [`MemError::OutOfMemory`] when the aligned block would run
    /// past the end of the buffer. The offset is unchanged on failure.
    pub fn alloc(&mut self, size: usize) -> MemResult<ArenaBlock> {
        let start = align_up(self.offset, ARENA_ALIGN).ok_or(MemError::OutOfMemory)?;
        let Some(end) = start.checked_add(size).filter(|&end| end <= self.memory.len()) else {
            log::warn!(
                "Arena: out of memory (requested {}, offset {}, capacity {})",
                size,
                self.offset,
                self.memory.len()
            );
            return Err(MemError::OutOfMemory);
        };

        self.memory[start..end].fill(0);
        self.offset = end;
        self.high_water = self.high_water.max(end);
        self.live_bytes += size;
        self.live_allocs += 1;
        self.stats.record_alloc(size);

        let seq = self.clock;
        self.clock += 1;

        log::trace!("Arena: alloc {} bytes at {:#x}", size, start);

        Ok(ArenaBlock {
            offset: start,
            len: size,
            seq,
        })
    }

    /// Allocate `size` zeroed bytes and borrow them directly
    pub fn alloc_bytes(&mut self, size: usize) -> MemResult<&mut [u8]> {
        let block = self.alloc(size)?;
        Ok(&mut self.memory[block.offset..block.end()])
    }

    /// Borrow the bytes of a live block
    pub fn bytes(&self, block: ArenaBlock) -> MemResult<&[u8]> {
        self.check_live(block)?;
        Ok(&self.memory[block.offset..block.end()])
    }

    /// Mutably borrow the bytes of a live block
    pub fn bytes_mut(&mut self, block: ArenaBlock) -> MemResult<&mut [u8]> {
        self.check_live(block)?;
        Ok(&mut self.memory[block.offset..block.end()])
    }

    /// Is `block` still allocated?
    ///
    /// Exact while at most `ROLLBACK_HISTORY` separate ranges have been
    /// rolled back; beyond that the oldest ranges are forgotten and blocks
    /// inside them are only caught by the offset bound.
    pub fn is_live(&self, block: ArenaBlock) -> bool {
        block.seq >= self.floor
            && block.seq < self.clock
            && block.end() <= self.offset
            && !self
                .rolled_back
                .iter()
                .any(|range| range.start <= block.seq && block.seq < range.end)
    }

    fn check_live(&self, block: ArenaBlock) -> MemResult<()> {
        if !self.is_live(block) {
            #[cfg(feature = "debug")]
            log::warn!("Arena: stale block {:?} (offset {})", block, self.offset);
            return Err(MemError::StaleHandle);
        }
        Ok(())
    }

    /// Release every block
    pub fn reset(&mut self) {
        self.stats.record_bulk_free(self.live_bytes, count_u32(self.live_allocs));
        log::debug!("Arena: reset ({} allocations dropped)", self.live_allocs);

        if self.clock > self.floor {
            self.record_rollback(self.floor);
        }
        self.offset = 0;
        self.live_bytes = 0;
        self.live_allocs = 0;
    }

    /// Capture the current position
    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            offset: self.offset,
            live_bytes: self.live_bytes,
            live_allocs: self.live_allocs,
            seq: self.clock,
        }
    }

    /// Can `checkpoint` still be restored?
    ///
    /// A checkpoint goes stale once the arena is rebound, or once a reset or
    /// restore released allocations made before it was captured. Same
    /// history bound as [`Arena::is_live`].
    pub fn is_valid(&self, checkpoint: Checkpoint) -> bool {
        checkpoint.seq >= self.floor
            && checkpoint.seq <= self.clock
            && checkpoint.offset <= self.offset
            && checkpoint.live_bytes <= self.live_bytes
            && checkpoint.live_allocs <= self.live_allocs
            && !self
                .rolled_back
                .iter()
                .any(|range| range.start < checkpoint.seq && checkpoint.seq <= range.end)
    }

    /// Roll back to `checkpoint`, releasing every block allocated since.
    ///
    /// Fails with [`MemError::InvalidCheckpoint`] when the checkpoint is no
    /// longer valid (see [`Arena::is_valid`]). The arena is unchanged on
    /// failure.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> MemResult<()> {
        if !self.is_valid(checkpoint) {
            #[cfg(feature = "debug")]
            log::warn!(
                "Arena: rejected checkpoint {:?} (offset {})",
                checkpoint,
                self.offset
            );
            return Err(MemError::InvalidCheckpoint);
        }
        if checkpoint.seq == self.clock {
            return Ok(());
        }

        let bytes = self.live_bytes - checkpoint.live_bytes;
        let count = self.live_allocs - checkpoint.live_allocs;
        self.stats.record_bulk_free(bytes, count_u32(count));
        log::debug!(
            "Arena: restore {} -> {} ({} allocations dropped)",
            self.offset,
            checkpoint.offset,
            count
        );

        self.record_rollback(checkpoint.seq);
        self.offset = checkpoint.offset;
        self.live_bytes = checkpoint.live_bytes;
        self.live_allocs = checkpoint.live_allocs;
        Ok(())
    }

    /// Mark `[start, clock)` as released and advance the clock
    fn record_rollback(&mut self, start: u64) {
        let mut range = SeqRange {
            start,
            end: self.clock,
        };
        while let Some(last) = self.rolled_back.last().copied() {
            if last.end < range.start {
                break;
            }
            range.start = range.start.min(last.start);
            self.rolled_back.pop();
        }
        if self.rolled_back.is_full() {
            log::debug!("Arena: rollback history full, forgetting {:?}", self.rolled_back[0]);
            self.rolled_back.remove(0);
        }
        let pushed = self.rolled_back.push(range).is_ok();
        debug_assert!(pushed);

        self.clock += 1;
    }

    /// Usable capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Next free byte
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left before the arena is exhausted
    #[inline]
    pub fn remaining(&self) -> usize {
        self.memory.len() - self.offset
    }

    /// Caller-requested bytes currently live (padding excluded)
    #[inline]
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Largest offset reached since the buffer was bound
    #[inline]
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }
}

/// Clamp a live-allocation count to the stats counter width
#[inline]
fn count_u32(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

static_assertions::assert_impl_all!(Arena<'static>: Send);
static_assertions::assert_impl_all!(ArenaBlock: Send, Sync, Copy);

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(16))]
    struct Buffer<const N: usize>([u8; N]);

    impl<const N: usize> Buffer<N> {
        fn new() -> Self {
            Self([0xAA; N])
        }
    }

    #[test]
    fn test_scope_scenario() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<1024>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);
        assert_eq!(arena.capacity(), 1024);

        arena.alloc(600).unwrap();
        assert_eq!(arena.offset(), 600);

        let token = arena.checkpoint();
        assert_eq!(token.offset(), 600);

        arena.alloc(300).unwrap();
        assert_eq!(arena.offset(), 900);

        assert_eq!(arena.alloc(200), Err(MemError::OutOfMemory));
        assert_eq!(arena.offset(), 900);

        arena.restore(token).unwrap();
        assert_eq!(arena.offset(), 600);

        arena.alloc(400).unwrap();
        assert_eq!(arena.offset(), 1000);
    }

    #[test]
    fn test_alignment_padding() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<64>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let a = arena.alloc(3).unwrap();
        let b = arena.alloc(5).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), ARENA_ALIGN);
        assert_eq!(arena.offset(), ARENA_ALIGN + 5);

        // Padding is not reported as allocated
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_allocated, 8);
        assert_eq!(snapshot.current_used, 8);
        assert_eq!(arena.live_bytes(), 8);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<256>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let sizes = [1usize, 17, 3, 64, 9, 40, 7, 100, 33];
        for &size in sizes.iter().cycle().take(64) {
            let before = arena.offset();
            let start = align_up(before, ARENA_ALIGN).unwrap();
            let fits = start + size <= arena.capacity();

            match arena.alloc(size) {
                Ok(block) => {
                    assert!(fits);
                    assert_eq!(block.offset(), start);
                    assert!(arena.offset() <= arena.capacity());
                }
                Err(err) => {
                    assert!(!fits);
                    assert_eq!(err, MemError::OutOfMemory);
                    assert_eq!(arena.offset(), before);
                }
            }
        }
    }

    #[test]
    fn test_checkpoint_restore_noop() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<128>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        arena.alloc(24).unwrap();
        let token = arena.checkpoint();
        arena.restore(token).unwrap();
        assert_eq!(arena.offset(), 24);
        assert_eq!(stats.snapshot().free_count, 0);
    }

    #[test]
    fn test_restore_frees_capacity() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<128>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let token = arena.checkpoint();
        arena.alloc(96).unwrap();
        assert_eq!(arena.alloc(64), Err(MemError::OutOfMemory));

        arena.restore(token).unwrap();
        assert_eq!(arena.offset(), 0);
        arena.alloc(96).unwrap();
        arena.alloc(32).unwrap();
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn test_restore_updates_stats() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<256>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        arena.alloc(10).unwrap();
        let token = arena.checkpoint();
        arena.alloc(20).unwrap();
        arena.alloc(30).unwrap();
        arena.restore(token).unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_allocated, 60);
        assert_eq!(snapshot.current_used, 10);
        assert_eq!(snapshot.peak_used, 60);
        assert_eq!(snapshot.alloc_count, 3);
        assert_eq!(snapshot.free_count, 2);
    }

    #[test]
    fn test_invalid_checkpoint() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<128>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        arena.alloc(64).unwrap();
        let token = arena.checkpoint();
        arena.reset();

        assert_eq!(arena.restore(token), Err(MemError::InvalidCheckpoint));
        assert_eq!(arena.offset(), 0);
    }

    #[test]
    fn test_reset_matches_restore_to_start() {
        let stats_a = StatsTracker::new();
        let stats_b = StatsTracker::new();
        let mut buf_a = Buffer::<128>::new();
        let mut buf_b = Buffer::<128>::new();
        let mut a = Arena::new(&mut buf_a.0, &stats_a);
        let mut b = Arena::new(&mut buf_b.0, &stats_b);

        let start = b.checkpoint();
        for arena in [&mut a, &mut b] {
            arena.alloc(12).unwrap();
            arena.alloc(40).unwrap();
        }
        a.reset();
        b.restore(start).unwrap();

        assert_eq!(a.offset(), b.offset());
        assert_eq!(a.live_bytes(), b.live_bytes());
        assert_eq!(stats_a.snapshot(), stats_b.snapshot());
    }

    #[test]
    fn test_zero_filled_after_restore() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<64>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let token = arena.checkpoint();
        arena.alloc_bytes(32).unwrap().fill(0x5A);
        arena.restore(token).unwrap();

        let bytes = arena.alloc_bytes(32).unwrap();
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_stale_block() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<64>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let kept = arena.alloc(8).unwrap();
        let token = arena.checkpoint();
        let dropped = arena.alloc(8).unwrap();
        arena.bytes_mut(dropped).unwrap()[0] = 7;
        assert_eq!(arena.bytes(dropped).unwrap()[0], 7);

        arena.restore(token).unwrap();
        assert_eq!(arena.bytes(dropped), Err(MemError::StaleHandle));
        assert!(arena.bytes(kept).is_ok());
    }

    #[test]
    fn test_checkpoint_before_reset_stays_invalid() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<256>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        arena.alloc(64).unwrap();
        let token = arena.checkpoint();
        arena.reset();

        // Grow past the old offset again
        arena.alloc(8).unwrap();
        arena.alloc(100).unwrap();
        assert!(arena.offset() > token.offset());

        assert_eq!(arena.restore(token), Err(MemError::InvalidCheckpoint));
        assert_eq!(arena.offset(), 108);
        assert_eq!(arena.live_bytes(), 108);
        assert_eq!(stats.snapshot().current_used, 108);
    }

    #[test]
    fn test_rolled_back_block_stays_stale() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<128>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let token = arena.checkpoint();
        let old = arena.alloc(16).unwrap();
        arena.bytes_mut(old).unwrap().fill(1);
        arena.restore(token).unwrap();

        let new = arena.alloc(32).unwrap();
        arena.bytes_mut(new).unwrap().fill(9);
        assert!(old.end() <= arena.offset());

        assert_eq!(arena.bytes(old), Err(MemError::StaleHandle));
        assert_eq!(arena.bytes_mut(old), Err(MemError::StaleHandle));
        assert!(!arena.is_live(old));
        assert_eq!(arena.bytes(new).unwrap()[0], 9);
    }

    #[test]
    fn test_block_from_before_reset_stays_stale() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<128>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let old = arena.alloc(8).unwrap();
        arena.reset();
        arena.alloc(64).unwrap();
        assert_eq!(arena.bytes(old), Err(MemError::StaleHandle));
    }

    #[test]
    fn test_later_checkpoint_invalid_after_earlier_restore() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<256>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let a = arena.checkpoint();
        arena.alloc(16).unwrap();
        let b = arena.checkpoint();
        arena.alloc(16).unwrap();

        arena.restore(a).unwrap();
        arena.alloc(64).unwrap();
        assert_eq!(arena.restore(b), Err(MemError::InvalidCheckpoint));
        assert_eq!(arena.offset(), 64);

        // The restore target itself stays usable
        assert!(arena.is_valid(a));
        arena.restore(a).unwrap();
        assert_eq!(arena.offset(), 0);

        let c = arena.checkpoint();
        let block = arena.alloc(8).unwrap();
        arena.restore(c).unwrap();
        assert_eq!(arena.offset(), 0);
        assert_eq!(arena.bytes(block), Err(MemError::StaleHandle));
    }

    #[test]
    fn test_rebind_invalidates_handles() {
        let stats = StatsTracker::new();
        let mut first = Buffer::<64>::new();
        let mut second = Buffer::<64>::new();
        let mut arena = Arena::new(&mut first.0, &stats);

        let token = arena.checkpoint();
        let block = arena.alloc(8).unwrap();
        arena.init(&mut second.0);
        arena.alloc(32).unwrap();

        assert_eq!(arena.bytes(block), Err(MemError::StaleHandle));
        assert_eq!(arena.restore(token), Err(MemError::InvalidCheckpoint));
    }

    #[test]
    fn test_rollback_history_window() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<1024>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let mut kept = [None; ROLLBACK_HISTORY + 1];
        let mut dropped = [None; ROLLBACK_HISTORY + 1];
        for i in 0..=ROLLBACK_HISTORY {
            kept[i] = Some(arena.alloc(8).unwrap());
            let token = arena.checkpoint();
            dropped[i] = Some(arena.alloc(8).unwrap());
            arena.restore(token).unwrap();
        }

        for block in kept.iter().flatten() {
            assert!(arena.is_live(*block));
        }
        for block in dropped[1..].iter().flatten() {
            assert_eq!(arena.bytes(*block), Err(MemError::StaleHandle));
        }

        // Oldest range forgotten: only the offset bound applies
        let oldest = dropped[0].unwrap();
        assert!(oldest.end() <= arena.offset());
        assert!(arena.is_live(oldest));
    }

    #[test]
    fn test_zero_sized_alloc() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<16>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        arena.alloc(16).unwrap();
        let empty = arena.alloc(0).unwrap();
        assert!(empty.is_empty());
        assert_eq!(arena.bytes(empty).unwrap().len(), 0);
    }

    #[test]
    fn test_many_zero_sized_allocs() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<16>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        for _ in 0..10_000 {
            arena.alloc(0).unwrap();
        }
        assert_eq!(arena.offset(), 0);
        arena.reset();
        assert_eq!(stats.snapshot().free_count, 10_000);
    }

    #[test]
    fn test_alloc_count_clamped_for_stats() {
        assert_eq!(count_u32(7), 7);
        assert_eq!(count_u32(u64::from(u32::MAX)), u32::MAX);
        assert_eq!(count_u32(u64::from(u32::MAX) + 5), u32::MAX);
    }

    #[test]
    fn test_misaligned_buffer() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<64>::new();
        let mut arena = Arena::new(&mut buf.0[1..], &stats);

        assert_eq!(arena.capacity(), 64 - ARENA_ALIGN);
        let block = arena.alloc(4).unwrap();
        assert_eq!(block.offset(), 0);
    }

    #[test]
    fn test_rebind_releases_stats() {
        let stats = StatsTracker::new();
        let mut first = Buffer::<64>::new();
        let mut second = Buffer::<32>::new();
        let mut arena = Arena::new(&mut first.0, &stats);

        arena.alloc(40).unwrap();
        arena.init(&mut second.0);
        assert_eq!(arena.capacity(), 32);
        assert_eq!(arena.offset(), 0);
        assert_eq!(arena.high_water_mark(), 0);
        assert_eq!(stats.snapshot().current_used, 0);
        assert_eq!(stats.snapshot().free_count, 1);
    }

    #[test]
    fn test_high_water_mark() {
        let stats = StatsTracker::new();
        let mut buf = Buffer::<128>::new();
        let mut arena = Arena::new(&mut buf.0, &stats);

        let token = arena.checkpoint();
        arena.alloc(100).unwrap();
        arena.restore(token).unwrap();
        arena.alloc(10).unwrap();
        assert_eq!(arena.high_water_mark(), 100);
    }
}
