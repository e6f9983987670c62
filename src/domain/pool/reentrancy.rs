//! Scoped "operation in progress" guard

use std::sync::atomic::{AtomicBool, Ordering};

use crate::shared::errors::PoolError;

/// Rejects nested entry into a pool's state-mutating operations.
///
/// `enter` hands out an [`Entered`] token; the flag is cleared when the token
/// drops, so every exit path (including `?` returns) releases it.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

/// Proof that the guard is held
#[must_use = "the guard is released as soon as the token is dropped"]
#[derive(Debug)]
pub struct Entered<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<Entered<'_>, PoolError> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| Entered { guard: self })
            .map_err(|_| PoolError::Reentrant)
    }

    #[cfg(test)]
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
