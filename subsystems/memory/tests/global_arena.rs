//! Process-wide arena. Kept in its own test binary so nothing else touches
//! the global state; everything runs in a single test for ordering.

use gcrt_memory::{
    get_stats, global_scope, init_global_arena, print_stats, with_global_arena, MemError,
    GLOBAL_ARENA_SIZE,
};

#[repr(C, align(16))]
struct Backing([u8; GLOBAL_ARENA_SIZE]);

fn leak_backing() -> &'static mut [u8] {
    &mut Box::leak(Box::new(Backing([0; GLOBAL_ARENA_SIZE]))).0
}

#[test]
fn global_arena_lifecycle() {
    assert_eq!(with_global_arena(|arena| arena.offset()), Err(MemError::NotInitialized));
    assert_eq!(global_scope(|_| ()), Err(MemError::NotInitialized));

    init_global_arena(leak_backing());
    assert_eq!(with_global_arena(|arena| arena.capacity()), Ok(GLOBAL_ARENA_SIZE));

    let kept = with_global_arena(|arena| arena.alloc(128)).unwrap().unwrap();
    assert_eq!(get_stats().current_used, 128);

    // Everything allocated inside the scope is gone afterwards
    let inner = global_scope(|arena| {
        let block = arena.alloc(4096).unwrap();
        assert_eq!(get_stats().current_used, 128 + 4096);
        block
    })
    .unwrap();
    assert_eq!(get_stats().current_used, 128);
    assert_eq!(get_stats().peak_used, 128 + 4096);

    with_global_arena(|arena| {
        assert!(arena.bytes(kept).is_ok());
        assert_eq!(arena.bytes(inner), Err(MemError::StaleHandle));
        assert_eq!(arena.alloc(GLOBAL_ARENA_SIZE), Err(MemError::OutOfMemory));
    })
    .unwrap();

    // Rebinding drops the old buffer's allocations
    init_global_arena(leak_backing());
    assert_eq!(with_global_arena(|arena| arena.offset()), Ok(0));

    let stats = get_stats();
    assert_eq!(stats.current_used, 0);
    assert_eq!(stats.alloc_count, 2);
    assert_eq!(stats.free_count, 2);
    assert_eq!(stats.total_allocated, 128 + 4096);

    print_stats();
}
