//! Cooperative abort signal
//!
//! Checked between discrete steps (path points, keystrokes, actions). A
//! pending sleep is never cut short.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{Error, Result};

/// Shared abort flag
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an abort at the next step boundary
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear a previous abort request
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Error::Aborted)` once an abort was requested
    pub fn check(&self) -> Result<()> {
        if self.is_aborted() {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }
}
