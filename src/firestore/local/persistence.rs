use bytes::Bytes;

use crate::firestore::error::FirestoreResult;

/// A read-modify-write view of the key/value store, valid for one transaction.
///
/// Writes become visible to later reads in the same transaction immediately and to
/// other transactions only once the transaction commits.
pub trait Transaction {
    fn get(&self, key: &[u8]) -> FirestoreResult<Option<Bytes>>;

    fn put(&mut self, key: &[u8], value: Bytes) -> FirestoreResult<()>;

    fn delete(&mut self, key: &[u8]) -> FirestoreResult<()>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> FirestoreResult<Vec<(Vec<u8>, Bytes)>>;
}

/// The storage engine the local cache runs on.
///
/// Implementations run `action` atomically: when it returns `Ok` every write it made
/// is committed, when it returns `Err` (or panics) none of them are. Transactions
/// from concurrent callers must not interleave.
pub trait Persistence: Send + Sync {
    fn run_transaction<T, F>(&self, label: &str, action: F) -> FirestoreResult<T>
    where
        F: FnOnce(&mut dyn Transaction) -> FirestoreResult<T>;

    /// Approximate number of bytes held by the store. Used to decide when the
    /// garbage collector should run.
    fn byte_size(&self) -> FirestoreResult<u64>;
}
