//! Reader/writer locks keyed on `(spec_version, message_root)`.
//!
//! Identify runs hold a shared guard; learn runs that REPLACE or MERGE hold
//! an exclusive one, so no identify run observes a half-applied resolution.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use sextant_core::models::Scope;

#[derive(Debug, Default, Clone, Copy)]
struct LockState {
    readers: usize,
    writer: bool,
}

#[derive(Default)]
struct Inner {
    states: Mutex<FxHashMap<String, LockState>>,
    changed: Condvar,
}

impl Inner {
    fn states(&self) -> MutexGuard<'_, FxHashMap<String, LockState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(
        &self,
        guard: MutexGuard<'a, FxHashMap<String, LockState>>,
    ) -> MutexGuard<'a, FxHashMap<String, LockState>> {
        self.changed.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, key: &str, exclusive: bool) {
        let mut states = self.states();
        if let Some(state) = states.get_mut(key) {
            if exclusive {
                state.writer = false;
            } else {
                state.readers = state.readers.saturating_sub(1);
            }
            if state.readers == 0 && !state.writer {
                states.remove(key);
            }
        }
        drop(states);
        self.changed.notify_all();
    }
}

/// Cloneable handle; clones share the same lock table.
#[derive(Clone, Default)]
pub struct ScopeLocks {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ScopeLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeLocks")
            .field("held", &self.inner.states().len())
            .finish()
    }
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock key; the airline is not part of it.
    pub fn key(scope: &Scope) -> String {
        format!("{}/{}", scope.spec_version, scope.message_root)
    }

    /// Block until no writer holds `scope`, then register as a reader.
    pub fn shared(&self, scope: &Scope) -> SharedScopeGuard {
        let key = Self::key(scope);
        let mut states = self.inner.states();
        while states.get(&key).is_some_and(|s| s.writer) {
            states = self.inner.wait(states);
        }
        states.entry(key.clone()).or_default().readers += 1;
        SharedScopeGuard {
            inner: Arc::clone(&self.inner),
            key,
        }
    }

    /// Block until `scope` has neither readers nor a writer.
    pub fn exclusive(&self, scope: &Scope) -> ExclusiveScopeGuard {
        let key = Self::key(scope);
        let mut states = self.inner.states();
        while states
            .get(&key)
            .is_some_and(|s| s.writer || s.readers > 0)
        {
            states = self.inner.wait(states);
        }
        states.entry(key.clone()).or_default().writer = true;
        ExclusiveScopeGuard {
            inner: Arc::clone(&self.inner),
            key,
        }
    }

    /// Try to take the exclusive lock without blocking.
    pub fn try_exclusive(&self, scope: &Scope) -> Option<ExclusiveScopeGuard> {
        let key = Self::key(scope);
        let mut states = self.inner.states();
        if states
            .get(&key)
            .is_some_and(|s| s.writer || s.readers > 0)
        {
            return None;
        }
        states.entry(key.clone()).or_default().writer = true;
        Some(ExclusiveScopeGuard {
            inner: Arc::clone(&self.inner),
            key,
        })
    }
}

#[must_use = "the scope is unlocked when the guard drops"]
pub struct SharedScopeGuard {
    inner: Arc<Inner>,
    key: String,
}

impl Drop for SharedScopeGuard {
    fn drop(&mut self) {
        self.inner.release(&self.key, false);
    }
}

#[must_use = "the scope is unlocked when the guard drops"]
pub struct ExclusiveScopeGuard {
    inner: Arc<Inner>,
    key: String,
}

impl Drop for ExclusiveScopeGuard {
    fn drop(&mut self) {
        self.inner.release(&self.key, true);
    }
}
