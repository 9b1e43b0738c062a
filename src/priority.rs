//! Scoped thread priority elevation for refill threads
//!
//! The OS call lives behind `PriorityBackend` so the crate itself stays
//! platform independent. Elevation is scoped to a guard: dropping the guard
//! restores the previous priority, so a panicking refill thread still
//! unwinds back to normal scheduling.

use std::sync::Arc;

use tracing::debug;

/// Scheduling class requested for a refill thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityClass {
    /// Normal scheduling, elevation is a no-op.
    Normal,
    /// Low-latency audio scheduling (the transport's "pro audio" class).
    ProAudio,
}

/// Platform hook performing the actual elevation.
pub trait PriorityBackend: Send + Sync {
    /// Raise the calling thread to `class`, returning an opaque token the
    /// backend needs to undo it.
    fn elevate(&self, class: PriorityClass) -> Option<u64>;

    /// Restore the calling thread using the token from `elevate`.
    fn restore(&self, token: u64);
}

/// Backend that does nothing. Default on platforms without a binding.
pub struct NoopBackend;

impl PriorityBackend for NoopBackend {
    fn elevate(&self, _class: PriorityClass) -> Option<u64> {
        None
    }

    fn restore(&self, _token: u64) {}
}

/// Elevate the calling thread for the lifetime of the returned guard.
pub fn elevate(backend: Arc<dyn PriorityBackend>, class: PriorityClass) -> PriorityGuard {
    let token = if class == PriorityClass::Normal {
        None
    } else {
        let token = backend.elevate(class);
        debug!(?class, elevated = token.is_some(), "thread priority");
        token
    };
    PriorityGuard { backend, token }
}

/// RAII handle holding an elevated thread priority.
pub struct PriorityGuard {
    backend: Arc<dyn PriorityBackend>,
    token: Option<u64>,
}

impl PriorityGuard {
    /// Whether the backend actually elevated the thread.
    pub fn is_elevated(&self) -> bool {
        self.token.is_some()
    }
}

impl Drop for PriorityGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.backend.restore(token);
        }
    }
}
