//! Per-manuscript mutual exclusion
//!
//! At most one mutating operation runs per manuscript id. Waiting is
//! bounded: an operation that cannot get the lock within the configured
//! timeout fails with `ManuscriptBusy` instead of blocking.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{EditorialError, Result};
use crate::ids::ManuscriptId;

/// Keyed lock over manuscript ids
#[derive(Debug)]
pub struct ManuscriptLocks {
    held: Mutex<HashSet<ManuscriptId>>,
    released: Condvar,
    timeout: Duration,
}

/// Releases its manuscripts when dropped
#[derive(Debug)]
pub struct ManuscriptGuard<'a> {
    locks: &'a ManuscriptLocks,
    ids: Vec<ManuscriptId>,
}

impl ManuscriptLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Lock one manuscript
    pub fn acquire(&self, id: ManuscriptId) -> Result<ManuscriptGuard<'_>> {
        self.acquire_all(&[id])
    }

    /// Lock several manuscripts, one at a time in ascending id order
    pub fn acquire_all(&self, ids: &[ManuscriptId]) -> Result<ManuscriptGuard<'_>> {
        let mut ordered = ids.to_vec();
        ordered.sort();
        ordered.dedup();

        let deadline = Instant::now() + self.timeout;
        let mut guard = ManuscriptGuard {
            locks: self,
            ids: Vec::with_capacity(ordered.len()),
        };

        let mut held = self.held.lock().unwrap_or_else(|p| p.into_inner());
        for id in ordered {
            while held.contains(&id) {
                let now = Instant::now();
                if now >= deadline {
                    // Release the set before the guard gives back what it already holds
                    drop(held);
                    debug!(manuscript_id = %id, "Manuscript lock timed out");
                    return Err(EditorialError::ManuscriptBusy(id));
                }
                held = self
                    .released
                    .wait_timeout(held, deadline - now)
                    .map(|(held, _)| held)
                    .unwrap_or_else(|p| p.into_inner().0);
            }
            held.insert(id);
            guard.ids.push(id);
        }
        drop(held);

        debug!(manuscripts = guard.ids.len(), "Manuscript lock acquired");
        Ok(guard)
    }

    /// Whether a manuscript is currently locked
    pub fn is_locked(&self, id: ManuscriptId) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(&id))
            .unwrap_or(false)
    }
}

impl ManuscriptGuard<'_> {
    pub fn ids(&self) -> &[ManuscriptId] {
        &self.ids
    }
}

impl Drop for ManuscriptGuard<'_> {
    fn drop(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        let mut held = self.locks.held.lock().unwrap_or_else(|p| p.into_inner());
        for id in &self.ids {
            held.remove(id);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = ManuscriptLocks::new(Duration::from_millis(50));
        let id = ManuscriptId::new();
        {
            let _guard = locks.acquire(id).unwrap();
            assert!(locks.is_locked(id));
        }
        assert!(!locks.is_locked(id));
    }

    #[test]
    fn test_busy_after_timeout() {
        let locks = ManuscriptLocks::new(Duration::from_millis(20));
        let id = ManuscriptId::new();
        let _guard = locks.acquire(id).unwrap();
        assert!(matches!(
            locks.acquire(id),
            Err(EditorialError::ManuscriptBusy(busy)) if busy == id
        ));
    }

    #[test]
    fn test_failed_bulk_acquire_releases_partial_hold() {
        let locks = ManuscriptLocks::new(Duration::from_millis(20));
        let mut ids = vec![ManuscriptId::new(), ManuscriptId::new()];
        ids.sort();
        let _second = locks.acquire(ids[1]).unwrap();

        assert!(locks.acquire_all(&ids).is_err());
        assert!(!locks.is_locked(ids[0]));
    }

    #[test]
    fn test_waiter_proceeds_after_release() {
        let locks = Arc::new(ManuscriptLocks::new(Duration::from_secs(5)));
        let id = ManuscriptId::new();
        let guard = locks.acquire(id).unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || locks.acquire(id).map(|g| g.ids().to_vec()))
        };
        thread::sleep(Duration::from_millis(20));
        drop(guard);

        assert_eq!(waiter.join().unwrap().unwrap(), vec![id]);
    }

    #[test]
    fn test_duplicate_ids_lock_once() {
        let locks = ManuscriptLocks::new(Duration::from_millis(20));
        let id = ManuscriptId::new();
        let guard = locks.acquire_all(&[id, id]).unwrap();
        assert_eq!(guard.ids(), &[id]);
    }
}
