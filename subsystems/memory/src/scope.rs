//! # Arena Scopes
//!
//! Scope-based bulk deallocation on top of checkpoint/restore.
//!
//! ```rust,ignore
//! let mut arena = Arena::new(&mut buffer, &stats);
//! {
//!     let mut scope = arena.enter_scope();
//!     let tmp = scope.alloc(128)?;
//!     // ...
//! } // everything allocated in the scope is released here
//! ```

use core::ops::{Deref, DerefMut};

use crate::arena::{Arena, Checkpoint};

/// RAII guard restoring an arena checkpoint on drop
#[derive(Debug)]
pub struct ArenaScope<'s, 'a> {
    arena: &'s mut Arena<'a>,
    checkpoint: Checkpoint,
    armed: bool,
}

impl<'s, 'a> ArenaScope<'s, 'a> {
    /// Checkpoint the scope will restore
    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// Close the scope without restoring.
    ///
    /// Allocations made inside the scope survive into the enclosing one.
    pub fn commit(mut self) {
        self.armed = false;
    }
}

impl<'s, 'a> Deref for ArenaScope<'s, 'a> {
    type Target = Arena<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.arena
    }
}

impl<'s, 'a> DerefMut for ArenaScope<'s, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.arena
    }
}

impl<'s, 'a> Drop for ArenaScope<'s, 'a> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Only fails if the arena was reset inside the scope, which already
        // released everything the scope owned.
        if let Err(err) = self.arena.restore(self.checkpoint) {
            log::debug!("ArenaScope: restore skipped ({})", err);
        }
    }
}

impl<'a> Arena<'a> {
    /// Open a scope that restores the current position when dropped
    pub fn enter_scope(&mut self) -> ArenaScope<'_, 'a> {
        let checkpoint = self.checkpoint();
        ArenaScope {
            arena: self,
            checkpoint,
            armed: true,
        }
    }

    /// Run `f` inside a scope; everything it allocates is released on return
    pub fn scope<R>(&mut self, f: impl FnOnce(&mut Arena<'a>) -> R) -> R {
        let mut scope = self.enter_scope();
        f(&mut *scope)
    }
}

/// Open a scope on a local arena for the duration of a block.
///
/// Inside the block the arena name is rebound to the scoped arena.
///
/// ```rust,ignore
/// gc_scope!(arena => {
///     let tmp = arena.alloc(64)?;
/// });
/// ```
#[macro_export]
macro_rules! gc_scope {
    ($arena:ident => $body:block) => {{
        let mut scope = $crate::Arena::enter_scope(&mut $arena);
        #[allow(unused_variables)]
        let $arena: &mut $crate::Arena<'_> = &mut scope;
        $body
    }};
}
