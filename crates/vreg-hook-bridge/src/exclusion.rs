//! Reentrancy exclusion for the bridge's own forwarding calls.
//!
//! While a bridge call is in flight, anything it (or the engine) does
//! against the real OS registry must not be re-intercepted, or the process
//! recurses into its own hooks. The exclusion is a per-thread suppression
//! marker, not a cross-thread lock: concurrent guest threads never contend
//! on it.
//!
//! The marker is armed through an RAII guard so that release happens on
//! every exit path, including unwinding. A marker that stays armed would
//! permanently disable interception for the thread.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    /// Nesting depth of exclusion scopes on the current thread.
    static EXCLUSION_DEPTH: Cell<u32> = Cell::new(0);
}

/// Capability handed to the bridge for suppressing re-interception.
///
/// Passed in explicitly at construction rather than reached through a
/// process singleton, so tests can substitute a double that records
/// enter/exit balance.
pub trait HookExclusion: Send + Sync {
    /// Arms the suppression marker for the current thread.
    fn enter(&self);

    /// Disarms the suppression marker for the current thread.
    fn exit(&self);

    /// Returns true while the current thread holds at least one scope.
    ///
    /// The hook-installation layer queries this to decide whether a call
    /// arriving at a hook should be forwarded to the real API untouched.
    fn is_active(&self) -> bool;
}

/// Scoped exclusion token; disarms on drop.
///
/// Not `Send`: the marker belongs to the thread that armed it.
pub struct ExclusionGuard<'a> {
    gate: &'a dyn HookExclusion,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ExclusionGuard<'a> {
    /// Arms `gate` and returns the token that will disarm it.
    pub fn enter(gate: &'a dyn HookExclusion) -> Self {
        gate.enter();
        ExclusionGuard {
            gate,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ExclusionGuard<'_> {
    fn drop(&mut self) {
        self.gate.exit();
    }
}

/// Default exclusion backed by a thread-local nesting counter.
///
/// All instances observe the same per-thread marker; exclusion is a
/// property of the thread executing a bridge call, not of any particular
/// bridge instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadMarkerExclusion;

impl ThreadMarkerExclusion {
    /// Creates the exclusion capability.
    pub fn new() -> Self {
        ThreadMarkerExclusion
    }
}

impl HookExclusion for ThreadMarkerExclusion {
    fn enter(&self) {
        EXCLUSION_DEPTH.with(|depth| depth.set(depth.get() + 1));
    }

    fn exit(&self) {
        EXCLUSION_DEPTH.with(|depth| {
            debug_assert!(depth.get() > 0, "unbalanced exclusion release");
            depth.set(depth.get().saturating_sub(1));
        });
    }

    fn is_active(&self) -> bool {
        EXCLUSION_DEPTH.with(|depth| depth.get() > 0)
    }
}
