//! Keyed advisory locks for check-then-write sequences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Hands out one mutex per key so unrelated keys never contend.
#[derive(Debug, Default, Clone)]
pub struct AdvisoryLocks {
    slots: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl AdvisoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`. The key's entry is dropped
    /// again once nobody else holds or waits on it.
    pub fn with_lock<T>(&self, key: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let key = key.into();
        let slot = self.slot(&key);
        let result = {
            let _held: MutexGuard<'_, ()> = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(&key, slot);
        result
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot(&self, key: &str) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.to_string()).or_default().clone()
    }

    // Handles are only cloned under the map lock, so a count of two (map and
    // `slot`) means no other caller can reach this entry.
    fn release(&self, key: &str, slot: Arc<Mutex<()>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn serializes_work_for_the_same_key() {
        let locks = AdvisoryLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    locks.with_lock("dormitory:a", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker thread");
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn returns_closure_result() {
        let locks = AdvisoryLocks::new();
        let value = locks.with_lock("session:x", || 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn released_keys_are_forgotten() {
        let locks = AdvisoryLocks::new();
        for day in 1..=30 {
            locks.with_lock(format!("sessions:a:2025-11-{day:02}"), || ());
        }
        assert_eq!(locks.tracked(), 0);

        let inner = locks.with_lock("dormitory:a", || {
            locks.with_lock("dormitory:b", || locks.tracked())
        });
        assert_eq!(inner, 2);
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn contended_keys_are_forgotten_after_the_last_holder() {
        let locks = AdvisoryLocks::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                thread::spawn(move || locks.with_lock("dormitory:shared", thread::yield_now))
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread");
        }
        assert_eq!(locks.tracked(), 0);
    }
}
