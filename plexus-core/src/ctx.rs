use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use plexus_error::{PlexusError, PlexusResult};

/// A cheaply-cloned cancellation signal, playing the role of a `context.Context`
/// in the source system. The core has no async runtime in its dependency
/// stack, so cancellation is a shared flag rather than a future: every
/// suspension point named in §5 (workers, tuner calls, control-command reads,
/// between-generation checks) polls [`RunContext::check`] at its boundary.
#[derive(Clone, Default)]
pub struct RunContext {
    cancelled: Arc<AtomicBool>,
}

impl RunContext {
    pub fn new() -> Self {
        RunContext {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A context that is already cancelled, for tests and for callers that
    /// want to short-circuit a run before it starts.
    pub fn cancelled() -> Self {
        let ctx = Self::new();
        ctx.cancel();
        ctx
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// The flag itself, for callers (like [`crate::control::ControlStream`])
    /// that need to select on cancellation without cloning the whole context.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn check(&self) -> PlexusResult<()> {
        if self.is_cancelled() {
            Err(PlexusError::Cancellation)
        } else {
            Ok(())
        }
    }
}
