//! Mutual exclusion for allocator handles.
//!
//! Every public allocator operation runs inside one critical section whose
//! length is bounded by a freelist traversal, so a spinlock is enough: the
//! lock never protects I/O or blocking work. The lock word flavour is
//! chosen per target: with a lock-free atomic byte the acquire path spins
//! on a plain load between exchanges (test and test-and-set), which keeps
//! contending cores from hammering the cache line with exchanges while the
//! lock is held. Targets without an atomic byte fall back to a bare
//! test-and-set loop over the native atomic word.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

use crate::utils::Backoff;

cfg_if::cfg_if! {
    if #[cfg(target_has_atomic = "8")] {
        use core::sync::atomic::{AtomicBool, Ordering};

        struct LockWord(AtomicBool);

        impl LockWord {
            const fn new() -> Self {
                Self(AtomicBool::new(false))
            }

            #[inline]
            fn try_acquire(&self) -> bool {
                !self.0.swap(true, Ordering::Acquire)
            }

            /// Test and test-and-set: exchange once, then wait on loads
            /// until the holder releases before exchanging again.
            #[inline]
            fn acquire(&self) {
                let mut backoff = Backoff::new();
                while self.0.swap(true, Ordering::Acquire) {
                    while self.0.load(Ordering::Relaxed) {
                        backoff.spin();
                    }
                }
            }

            #[inline]
            fn release(&self) {
                self.0.store(false, Ordering::Release);
            }
        }
    } else {
        use core::sync::atomic::{AtomicUsize, Ordering};

        struct LockWord(AtomicUsize);

        impl LockWord {
            const fn new() -> Self {
                Self(AtomicUsize::new(0))
            }

            #[inline]
            fn try_acquire(&self) -> bool {
                self.0.swap(1, Ordering::Acquire) == 0
            }

            #[inline]
            fn acquire(&self) {
                let mut backoff = Backoff::new();
                while self.0.swap(1, Ordering::Acquire) != 0 {
                    backoff.spin();
                }
            }

            #[inline]
            fn release(&self) {
                self.0.store(0, Ordering::Release);
            }
        }
    }
}

/// A tiny spinlock for short critical sections.
///
/// # Guarantees
/// - Mutual exclusion for access to the protected value.
/// - `Sync` when `T: Send`; the lock enforces interior mutability.
/// - Acquire ordering on lock, release ordering on unlock.
///
/// # Caveats
/// - Not fair and not reentrant; keep critical sections small.
///
/// # Examples
///
/// ```
/// use nextfit::sync::SpinLock;
///
/// let lock = SpinLock::new(0u32);
/// *lock.lock() += 1;
/// assert_eq!(*lock.lock(), 1);
/// ```
pub struct SpinLock<T> {
    word: LockWord,
    inner: UnsafeCell<T>,
}

// Safety: the lock word serializes all access to `inner`, so sharing the
// lock across threads is sound whenever the value itself may move between
// threads.
unsafe impl<T: Send> Sync for SpinLock<T> {}
unsafe impl<T: Send> Send for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Create a new unlocked spinlock wrapping `inner`.
    pub const fn new(inner: T) -> Self {
        Self {
            word: LockWord::new(),
            inner: UnsafeCell::new(inner),
        }
    }

    /// Acquires the lock, spinning until it becomes available.
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        self.word.acquire();
        SpinLockGuard { lock: self }
    }

    /// Attempts to acquire the lock without spinning.
    #[inline]
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        if self.word.try_acquire() {
            Some(SpinLockGuard { lock: self })
        } else {
            None
        }
    }
}

/// RAII guard; the lock is released when the guard is dropped.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: the guard witnesses exclusive ownership of the lock.
        unsafe { &*self.lock.inner.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard witnesses exclusive ownership of the lock.
        unsafe { &mut *self.lock.inner.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.word.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_protects_value() {
        let lock = SpinLock::new(0u32);
        *lock.lock() += 1;
        assert_eq!(*lock.lock(), 1);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let lock = SpinLock::new(());
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[cfg(feature = "std")]
    #[test]
    fn contended_counter() {
        use std::sync::Arc;
        use std::thread;

        let lock = Arc::new(SpinLock::new(0usize));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    *lock.lock() += 1;
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*lock.lock(), 80_000);
    }
}
