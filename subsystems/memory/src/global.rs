//! # Global Arena
//!
//! The single process-wide arena and the stats tracker it reports to.
//!
//! There is exactly one global arena. It is unbound until
//! [`init_global_arena`] hands it a `'static` buffer (the embedding
//! environment owns that buffer, usually a `static` of
//! [`GLOBAL_ARENA_SIZE`](crate::GLOBAL_ARENA_SIZE) bytes) and is never torn
//! down. Independent arenas built with [`Arena::new`] do not touch it.
//!
//! The runtime is single-threaded; the spin lock only makes the static
//! `Sync` and is never contended in correct use.

use spin::Mutex;

use crate::arena::Arena;
use crate::stats::{AllocStats, StatsTracker};
use crate::{MemError, MemResult};

/// Counters of the global arena. Other allocators may report here too.
pub static GLOBAL_STATS: StatsTracker = StatsTracker::new();

static GLOBAL_ARENA: Mutex<Option<Arena<'static>>> = Mutex::new(None);

/// Bind the global arena to `buffer`, rebinding if already initialized
pub fn init_global_arena(buffer: &'static mut [u8]) {
    let mut global = GLOBAL_ARENA.lock();
    match global.as_mut() {
        Some(arena) => arena.init(buffer),
        None => *global = Some(Arena::new(buffer, &GLOBAL_STATS)),
    }
    log::info!("Global arena: {} bytes", global.as_ref().map_or(0, |arena| arena.capacity()));
}

/// Run `f` with exclusive access to the global arena.
///
/// `f` must not call back into the global arena; the lock is not reentrant.
pub fn with_global_arena<R>(f: impl FnOnce(&mut Arena<'static>) -> R) -> MemResult<R> {
    let mut global = GLOBAL_ARENA.lock();
    let arena = global.as_mut().ok_or(MemError::NotInitialized)?;
    Ok(f(arena))
}

/// Run `f` inside a checkpoint/restore scope of the global arena
pub fn global_scope<R>(f: impl FnOnce(&mut Arena<'static>) -> R) -> MemResult<R> {
    with_global_arena(|arena| arena.scope(f))
}

/// Snapshot of the global counters
pub fn get_stats() -> AllocStats {
    GLOBAL_STATS.snapshot()
}

/// Log the global counters at info level
pub fn print_stats() {
    log::info!("{}", get_stats());
}
