use std::sync::atomic::{AtomicUsize, Ordering};

/// Nesting counter that keeps the user interface locked while builds run.
///
/// Each [`UiLockGuard`] holds one level and releases it when dropped, on
/// every exit path.
#[derive(Debug, Default)]
pub struct UiLock {
    depth: AtomicUsize,
}

impl UiLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes one lock level.
    #[must_use]
    pub fn acquire(&self) -> UiLockGuard<'_> {
        self.depth.fetch_add(1, Ordering::AcqRel);
        UiLockGuard { lock: self }
    }

    /// `true` while at least one guard is alive.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.depth() > 0
    }

    /// Number of live guards.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }
}

/// One level of a [`UiLock`].
#[derive(Debug)]
pub struct UiLockGuard<'a> {
    lock: &'a UiLock,
}

impl Drop for UiLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.depth.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_nest_and_release() {
        let lock = UiLock::new();
        assert!(!lock.is_locked());
        {
            let _outer = lock.acquire();
            let inner = lock.acquire();
            assert_eq!(lock.depth(), 2);
            drop(inner);
            assert_eq!(lock.depth(), 1);
        }
        assert!(!lock.is_locked());
    }

    #[test]
    fn released_on_early_return() {
        fn failing(lock: &UiLock) -> Result<(), ()> {
            let _guard = lock.acquire();
            Err(())
        }
        let lock = UiLock::new();
        assert!(failing(&lock).is_err());
        assert_eq!(lock.depth(), 0);
    }
}
