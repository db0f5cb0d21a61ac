//! Per-document writer serialization.

use dms_model::DocumentId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock table keyed by document id.
///
/// Writers to the same document run one at a time; writers to different
/// documents do not contend beyond the brief table lookup.
#[derive(Default)]
pub struct DocumentLocks {
    table: Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for a document, creating it on first use
    pub fn lock_for(&self, id: DocumentId) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.entry(id).or_default().clone()
    }

    /// Run `f` while holding the document's lock.
    ///
    /// The lock only guards ordering, so a poisoned lock is recovered
    /// rather than propagated. The table entry is dropped once no other
    /// writer holds or waits on it.
    pub fn with_lock<T>(&self, id: DocumentId, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(id);
        let result = {
            let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(id, &lock);
        result
    }

    /// Remove the entry for `id` if `lock` is its only outside holder.
    ///
    /// Clones are only handed out under the table lock, so a count of two
    /// (table plus `lock`) means nobody else is waiting.
    fn release(&self, id: DocumentId, lock: &Arc<Mutex<()>>) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = table
            .get(&id)
            .is_some_and(|entry| Arc::ptr_eq(entry, lock) && Arc::strong_count(entry) == 2);
        if idle {
            table.remove(&id);
        }
    }

    /// Drop the lock entry of a deleted document
    pub fn forget(&self, id: DocumentId) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.remove(&id);
    }

    /// Number of documents with a lock entry
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_same_document_shares_lock() {
        let locks = DocumentLocks::new();
        let a = locks.lock_for(DocumentId(1));
        let b = locks.lock_for(DocumentId(1));
        let c = locks.lock_for(DocumentId(2));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_with_lock_serializes() {
        let locks = Arc::new(DocumentLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    for _ in 0..50 {
                        locks.with_lock(DocumentId(7), || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_lock_releases_idle_entry() {
        let locks = DocumentLocks::new();
        let value = locks.with_lock(DocumentId(3), || 42);

        assert_eq!(value, 42);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_with_lock_keeps_entry_while_held_elsewhere() {
        let locks = DocumentLocks::new();
        let held = locks.lock_for(DocumentId(3));
        locks.with_lock(DocumentId(3), || ());

        assert_eq!(locks.len(), 1);
        drop(held);
    }

    #[test]
    fn test_forget() {
        let locks = DocumentLocks::new();
        locks.lock_for(DocumentId(1));
        locks.forget(DocumentId(1));
        assert!(locks.is_empty());
    }
}
