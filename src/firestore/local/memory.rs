use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;

use crate::firestore::error::FirestoreResult;
use crate::firestore::local::persistence::{Persistence, Transaction};

type Entries = BTreeMap<Vec<u8>, Bytes>;

/// In-process key/value store implementing [`Persistence`].
///
/// Transactions run one at a time behind a mutex. Writes are buffered in the
/// transaction and applied to the committed map only when the action succeeds, so a
/// failed or panicking action leaves no trace.
#[derive(Default)]
pub struct MemoryPersistence {
    entries: Mutex<Entries>,
}

impl Debug for MemoryPersistence {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPersistence")
            .field("entries", &self.lock().len())
            .finish()
    }
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Committed state is only touched after an action succeeds, so a poisoned
        // lock still guards consistent data.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Persistence for MemoryPersistence {
    fn run_transaction<T, F>(&self, label: &str, action: F) -> FirestoreResult<T>
    where
        F: FnOnce(&mut dyn Transaction) -> FirestoreResult<T>,
    {
        let mut committed = self.lock();
        let mut transaction = MemoryTransaction {
            committed: &*committed,
            pending: BTreeMap::new(),
        };

        match action(&mut transaction) {
            Ok(value) => {
                let pending = transaction.pending;
                log::trace!("committing {label} ({} writes)", pending.len());
                for (key, entry) in pending {
                    match entry {
                        Some(bytes) => {
                            committed.insert(key, bytes);
                        }
                        None => {
                            committed.remove(&key);
                        }
                    }
                }
                Ok(value)
            }
            Err(err) => {
                log::debug!("rolling back {label}: {err}");
                Err(err)
            }
        }
    }

    fn byte_size(&self) -> FirestoreResult<u64> {
        Ok(self
            .lock()
            .iter()
            .map(|(key, value)| (key.len() + value.len()) as u64)
            .sum())
    }
}

struct MemoryTransaction<'a> {
    committed: &'a Entries,
    /// `None` marks a pending delete.
    pending: BTreeMap<Vec<u8>, Option<Bytes>>,
}

impl Transaction for MemoryTransaction<'_> {
    fn get(&self, key: &[u8]) -> FirestoreResult<Option<Bytes>> {
        match self.pending.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => Ok(self.committed.get(key).cloned()),
        }
    }

    fn put(&mut self, key: &[u8], value: Bytes) -> FirestoreResult<()> {
        self.pending.insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> FirestoreResult<()> {
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> FirestoreResult<Vec<(Vec<u8>, Bytes)>> {
        let range = (Bound::Included(prefix.to_vec()), Bound::Unbounded);
        let mut merged: BTreeMap<Vec<u8>, Bytes> = self
            .committed
            .range::<Vec<u8>, _>(range.clone())
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (key, value) in self
            .pending
            .range::<Vec<u8>, _>(range)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}
