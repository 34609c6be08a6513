//! Shared busy indicator for presentational layers

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Cloneable flag indicating an assistant reply is being generated.
///
/// Reference counted rather than a plain boolean: the flag reads busy
/// while at least one send is in flight, so overlapping sends cannot
/// clear each other's indicator.
#[derive(Clone, Default)]
pub struct BusySignal {
    active: Arc<AtomicUsize>,
}

impl BusySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any send is currently in flight
    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }

    /// Mark one operation in flight; cleared when the guard drops.
    pub fn start(&self) -> BusyGuard {
        self.active.fetch_add(1, Ordering::AcqRel);
        BusyGuard {
            active: Arc::clone(&self.active),
        }
    }
}

/// RAII guard holding the signal busy for one operation
pub struct BusyGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_clears_on_drop() {
        let signal = BusySignal::new();
        assert!(!signal.is_busy());
        let guard = signal.start();
        assert!(signal.is_busy());
        drop(guard);
        assert!(!signal.is_busy());
    }

    #[test]
    fn test_overlapping_guards_keep_signal_busy() {
        let signal = BusySignal::new();
        let first = signal.start();
        let second = signal.start();
        drop(first);
        assert!(signal.is_busy(), "second send still in flight");
        drop(second);
        assert!(!signal.is_busy());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = BusySignal::new();
        let observer = signal.clone();
        let _guard = signal.start();
        assert!(observer.is_busy());
    }
}
