//! Stack safety for the recursive tree walks.
//!
//! The parser, resolver and interpreter all recurse on the shape of the
//! program. Their entry points run through [`ensure_sufficient_stack`], which
//! moves onto a fresh heap segment when the native stack runs low.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
