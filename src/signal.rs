//! Run-level abort signaling
//!
//! An `AbortFlag` is shared by everything processing a run. Triggering it
//! stops new Transformer/Evaluator calls promptly; in-flight calls drain
//! and already-persisted state stays intact and resumable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cheap cloneable abort flag checked before each capability call
#[derive(Debug, Clone, Default)]
pub struct AbortFlag {
    flag: Arc<AtomicBool>,
}

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop issuing new capability calls
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_flag_starts_clear() {
        let flag = AbortFlag::new();
        assert!(!flag.is_aborted());
    }

    #[test]
    fn test_abort_flag_trigger_visible_to_clones() {
        let flag = AbortFlag::new();
        let clone = flag.clone();
        flag.trigger();
        assert!(clone.is_aborted());
    }
}
