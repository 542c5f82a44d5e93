// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Re-entrancy suppression for destination writes.
//!
//! When the engine writes a destination copy, the host may dispatch the
//! same save notification that triggers the engine in the first place.
//! The gate is held for the duration of that single write so the save
//! entry point can tell a user-initiated save from its own echo.
//!
//! The gate is deliberately non-nestable: only one suppressed write may
//! be in flight at a time, matching the strictly sequential per-site
//! fan-out. A second `enter()` while the gate is held means suppression
//! bookkeeping leaked somewhere and is reported as
//! [`SyndicationError::Reentrancy`] rather than silently stacked.

use crate::error::{Result, SyndicationError};
use std::sync::atomic::{AtomicBool, Ordering};

/// Non-nestable suppression flag with RAII release.
#[derive(Debug, Default)]
pub struct ReentrancyGate {
    active: AtomicBool,
}

impl ReentrancyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a suppressed write is currently in flight.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Acquire the gate for one destination write.
    ///
    /// The returned guard releases the gate when dropped, on every exit
    /// path. Fails with [`SyndicationError::Reentrancy`] if the gate is
    /// already held.
    pub fn enter(&self) -> Result<SuppressGuard<'_>> {
        match self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Ok(SuppressGuard { gate: self }),
            Err(_) => Err(SyndicationError::Reentrancy),
        }
    }
}

/// Holds the gate; releases it on drop.
#[derive(Debug)]
pub struct SuppressGuard<'a> {
    gate: &'a ReentrancyGate,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.gate.active.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_starts_released() {
        let gate = ReentrancyGate::new();
        assert!(!gate.is_active());
    }

    #[test]
    fn enter_sets_and_drop_clears() {
        let gate = ReentrancyGate::new();
        {
            let _guard = gate.enter().unwrap();
            assert!(gate.is_active());
        }
        assert!(!gate.is_active());
    }

    #[test]
    fn nested_enter_is_a_reentrancy_violation() {
        let gate = ReentrancyGate::new();
        let _guard = gate.enter().unwrap();
        let err = gate.enter().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn gate_is_reusable_after_release() {
        let gate = ReentrancyGate::new();
        drop(gate.enter().unwrap());
        drop(gate.enter().unwrap());
        assert!(!gate.is_active());
    }

    #[test]
    fn guard_releases_on_early_exit() {
        let gate = ReentrancyGate::new();
        let attempt = (|| -> Result<()> {
            let _guard = gate.enter()?;
            Err(SyndicationError::State("mid-write failure".into()))
        })();
        assert!(attempt.is_err());
        assert!(!gate.is_active());
    }
}
