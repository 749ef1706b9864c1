//! Monotonic fail-fast flag shared by every copy and preparation worker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-writer-many-readers shutdown flag.
///
/// Once set it stays set for the lifetime of the run. It carries no error
/// payload: the worker that failed re-raises its own error, peers observe the
/// flag and abort with `NeighbouringProcess`.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_visible_to_every_clone() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();

        assert!(!observer.is_set());
        signal.set();
        assert!(observer.is_set());
    }

    #[test]
    fn set_is_monotonic() {
        let signal = ShutdownSignal::new();
        signal.set();
        signal.set();
        assert!(signal.is_set());
    }

    #[test]
    fn set_crosses_threads() {
        let signal = ShutdownSignal::new();
        let remote = signal.clone();

        std::thread::spawn(move || remote.set()).join().unwrap();
        assert!(signal.is_set());
    }
}
