//! Cooperative cancellation, polled at bucket/sub-stage boundaries.
//!
//! Long numeric operations (building the largest pyramid level, FFT on a
//! multi-second waveform) poll a [`CancellationToken`] rather than
//! supporting preemption. LTTB polls once per bucket; the distortion family
//! polls before windowing, before the transform, and before post-processing.
//! A fired token makes the operation return [`crate::error::Error::Cancelled`]
//! and discard whatever partial result it was building.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns `Err(Error::Cancelled)` if the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A token that never fires, for call sites that don't need cancellation.
pub fn never() -> CancellationToken {
    CancellationToken::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let tok = CancellationToken::new();
        assert!(tok.check().is_ok());
    }

    #[test]
    fn cancel_is_observed_by_clones() {
        let tok = CancellationToken::new();
        let clone = tok.clone();
        clone.cancel();
        assert!(tok.is_cancelled());
        assert_eq!(tok.check(), Err(Error::Cancelled));
    }
}
