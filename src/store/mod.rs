//! Client-side caches over the board API.
//!
//! Each store keeps its entities plus a `loading` flag and a human-readable
//! `error` message. Read actions record failures and swallow them; mutating
//! actions record, log and return them.

mod project;
mod task;
mod user;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use project::{ProjectStore, SyncOutcome};
pub use task::TaskStore;
pub use user::UserStore;

/// Shared shape of store state.
#[derive(Debug)]
struct Cache<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T> Cache<T> {
    fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }
}

// Store state is plain data, so a poisoned lock still holds a usable value.
fn read<T>(lock: &RwLock<Cache<T>>) -> RwLockReadGuard<'_, Cache<T>> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<Cache<T>>) -> RwLockWriteGuard<'_, Cache<T>> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
