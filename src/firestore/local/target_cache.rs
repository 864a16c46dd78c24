use std::collections::BTreeSet;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use bytes::Bytes;

use crate::firestore::error::{not_found, resource_exhausted, FirestoreResult};
use crate::firestore::local::local_serializer::LocalSerializer;
use crate::firestore::local::persistence::{Persistence, Transaction};
use crate::firestore::local::schema;
use crate::firestore::local::target_data::{TargetData, TargetGlobal};
use crate::firestore::model::{SnapshotVersion, TargetDefinition};
use crate::util::assert::hard_assert;

/// Persists [`TargetData`] by target id and by target definition, together with the
/// [`TargetGlobal`] singleton.
///
/// Every operation runs in a single persistence transaction. The global high-water
/// marks are kept at or above every persisted target id and sequence number, which is
/// what lets the garbage collector trust sequence-number comparisons.
pub struct TargetCache<P: Persistence> {
    persistence: Arc<P>,
    serializer: LocalSerializer,
}

impl<P: Persistence> Debug for TargetCache<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetCache")
            .field("database_id", self.serializer.database_id())
            .finish()
    }
}

impl<P: Persistence> TargetCache<P> {
    pub fn new(persistence: Arc<P>, serializer: LocalSerializer) -> Self {
        Self {
            persistence,
            serializer,
        }
    }

    pub fn persistence(&self) -> &Arc<P> {
        &self.persistence
    }

    /// Inserts or replaces the record for `target_data.target_id()`.
    ///
    /// Panics if the update would lower the target's sequence number.
    pub fn put_target_data(&self, target_data: &TargetData) -> FirestoreResult<()> {
        self.persistence.run_transaction("put_target_data", |txn| {
            let target_id = target_data.target_id();
            if let Some(existing) = self.read_target(txn, target_id)? {
                hard_assert!(
                    target_data.sequence_number() >= existing.sequence_number(),
                    "sequence number of target {} went backwards ({} -> {})",
                    target_id,
                    existing.sequence_number(),
                    target_data.sequence_number()
                );
                if existing.target() != target_data.target() {
                    txn.delete(&schema::target_index_key(
                        &existing.target().canonical_id(),
                        target_id,
                    ))?;
                }
            }

            self.write_target(txn, target_data)?;

            let mut global = self.read_global_in(txn)?;
            if global.cover(target_data) {
                self.write_global_in(txn, &global)?;
            }
            Ok(())
        })
    }

    pub fn get_target_data(&self, target_id: i32) -> FirestoreResult<Option<TargetData>> {
        self.persistence
            .run_transaction("get_target_data", |txn| self.read_target(txn, target_id))
    }

    /// Looks a target up by what it listens to.
    pub fn get_target_data_for_definition(
        &self,
        target: &TargetDefinition,
    ) -> FirestoreResult<Option<TargetData>> {
        self.persistence
            .run_transaction("get_target_data_for_definition", |txn| {
                let prefix = schema::target_index_prefix(&target.canonical_id());
                for (key, _) in txn.scan_prefix(&prefix)? {
                    if key.len() != prefix.len() + 4 {
                        // Belongs to a longer canonical id that shares this prefix.
                        continue;
                    }
                    let target_id = schema::decode_target_id(&key)?;
                    if let Some(target_data) = self.read_target(txn, target_id)? {
                        if target_data.target() == target {
                            return Ok(Some(target_data));
                        }
                    }
                }
                Ok(None)
            })
    }

    /// Removes the record for `target_id`. The global counters are left untouched.
    pub fn remove_target_data(&self, target_id: i32) -> FirestoreResult<()> {
        self.persistence.run_transaction("remove_target_data", |txn| {
            if let Some(existing) = self.read_target(txn, target_id)? {
                self.delete_target(txn, &existing)?;
            }
            Ok(())
        })
    }

    /// Returns the persisted global record, or the zero value for a fresh cache.
    pub fn read_global(&self) -> FirestoreResult<TargetGlobal> {
        self.persistence
            .run_transaction("read_global", |txn| self.read_global_in(txn))
    }

    /// Overwrites the global record.
    ///
    /// Panics if either high-water mark would go down.
    pub fn write_global(&self, global: &TargetGlobal) -> FirestoreResult<()> {
        self.persistence.run_transaction("write_global", |txn| {
            let current = self.read_global_in(txn)?;
            hard_assert!(
                global.highest_target_id >= current.highest_target_id,
                "highest target id cannot decrease ({} -> {})",
                current.highest_target_id,
                global.highest_target_id
            );
            hard_assert!(
                global.highest_listen_sequence_number >= current.highest_listen_sequence_number,
                "highest listen sequence number cannot decrease ({} -> {})",
                current.highest_listen_sequence_number,
                global.highest_listen_sequence_number
            );
            self.write_global_in(txn, global)
        })
    }

    /// Reserves the next target id and persists it before returning.
    pub fn allocate_target_id(&self) -> FirestoreResult<i32> {
        self.persistence.run_transaction("allocate_target_id", |txn| {
            let mut global = self.read_global_in(txn)?;
            let target_id = global
                .highest_target_id
                .checked_add(1)
                .ok_or_else(|| resource_exhausted("target ids exhausted"))?;
            global.highest_target_id = target_id;
            self.write_global_in(txn, &global)?;
            log::debug!("allocated target id {target_id}");
            Ok(target_id)
        })
    }

    /// Issues the next listen sequence number and persists it before returning.
    pub fn allocate_sequence_number(&self) -> FirestoreResult<i64> {
        self.persistence
            .run_transaction("allocate_sequence_number", |txn| {
                let mut global = self.read_global_in(txn)?;
                let sequence_number = next_sequence_number(&mut global)?;
                self.write_global_in(txn, &global)?;
                Ok(sequence_number)
            })
    }

    /// Stamps a freshly issued sequence number on `target_id` and returns it.
    pub fn touch_target(&self, target_id: i32) -> FirestoreResult<i64> {
        self.persistence.run_transaction("touch_target", |txn| {
            let target_data = self
                .read_target(txn, target_id)?
                .ok_or_else(|| not_found(format!("target {target_id} is not persisted")))?;
            let mut global = self.read_global_in(txn)?;
            let sequence_number = next_sequence_number(&mut global)?;
            self.write_target(txn, &target_data.with_sequence_number(sequence_number))?;
            self.write_global_in(txn, &global)?;
            Ok(sequence_number)
        })
    }

    pub fn set_last_remote_snapshot_version(
        &self,
        snapshot_version: SnapshotVersion,
    ) -> FirestoreResult<()> {
        self.persistence
            .run_transaction("set_last_remote_snapshot_version", |txn| {
                let mut global = self.read_global_in(txn)?;
                global.last_remote_snapshot_version = snapshot_version;
                self.write_global_in(txn, &global)
            })
    }

    pub fn last_remote_snapshot_version(&self) -> FirestoreResult<SnapshotVersion> {
        Ok(self.read_global()?.last_remote_snapshot_version)
    }

    pub fn highest_sequence_number(&self) -> FirestoreResult<i64> {
        Ok(self.read_global()?.highest_listen_sequence_number)
    }

    pub fn target_count(&self) -> FirestoreResult<usize> {
        self.persistence.run_transaction("target_count", |txn| {
            Ok(txn.scan_prefix(schema::TARGETS_PREFIX)?.len())
        })
    }

    /// Every persisted target, ordered by target id.
    pub fn all_targets(&self) -> FirestoreResult<Vec<TargetData>> {
        self.persistence
            .run_transaction("all_targets", |txn| self.scan_targets(txn))
    }

    /// Removes every target whose sequence number is at or below `upper_bound` and
    /// that is not in `live_targets`. Returns the number of targets removed.
    pub fn remove_targets(
        &self,
        upper_bound: i64,
        live_targets: &BTreeSet<i32>,
    ) -> FirestoreResult<usize> {
        self.persistence.run_transaction("remove_targets", |txn| {
            let mut removed = 0;
            for target_data in self.scan_targets(txn)? {
                if target_data.sequence_number() <= upper_bound
                    && !live_targets.contains(&target_data.target_id())
                {
                    self.delete_target(txn, &target_data)?;
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn read_target(
        &self,
        txn: &dyn Transaction,
        target_id: i32,
    ) -> FirestoreResult<Option<TargetData>> {
        match txn.get(&schema::target_key(target_id))? {
            Some(encoded) => self.decode_target(target_id, &encoded).map(Some),
            None => Ok(None),
        }
    }

    fn decode_target(&self, target_id: i32, encoded: &[u8]) -> FirestoreResult<TargetData> {
        self.serializer.decode_target_data(encoded).inspect_err(|err| {
            log::warn!("persisted target {target_id} is corrupt: {err}");
        })
    }

    fn scan_targets(&self, txn: &dyn Transaction) -> FirestoreResult<Vec<TargetData>> {
        txn.scan_prefix(schema::TARGETS_PREFIX)?
            .into_iter()
            .map(|(key, encoded)| {
                let target_id = schema::decode_target_id(&key)?;
                self.decode_target(target_id, &encoded)
            })
            .collect()
    }

    fn write_target(
        &self,
        txn: &mut dyn Transaction,
        target_data: &TargetData,
    ) -> FirestoreResult<()> {
        let target_id = target_data.target_id();
        txn.put(
            &schema::target_key(target_id),
            self.serializer.encode_target_data(target_data),
        )?;
        txn.put(
            &schema::target_index_key(&target_data.target().canonical_id(), target_id),
            Bytes::new(),
        )
    }

    fn delete_target(
        &self,
        txn: &mut dyn Transaction,
        target_data: &TargetData,
    ) -> FirestoreResult<()> {
        let target_id = target_data.target_id();
        txn.delete(&schema::target_key(target_id))?;
        txn.delete(&schema::target_index_key(
            &target_data.target().canonical_id(),
            target_id,
        ))?;
        log::debug!("removed target {target_id}");
        Ok(())
    }

    fn read_global_in(&self, txn: &dyn Transaction) -> FirestoreResult<TargetGlobal> {
        match txn.get(schema::TARGET_GLOBAL_KEY)? {
            Some(encoded) => self
                .serializer
                .decode_target_global(&encoded)
                .inspect_err(|err| log::warn!("persisted target global is corrupt: {err}")),
            None => Ok(TargetGlobal::default()),
        }
    }

    fn write_global_in(
        &self,
        txn: &mut dyn Transaction,
        global: &TargetGlobal,
    ) -> FirestoreResult<()> {
        txn.put(
            schema::TARGET_GLOBAL_KEY,
            self.serializer.encode_target_global(global),
        )
    }
}

fn next_sequence_number(global: &mut TargetGlobal) -> FirestoreResult<i64> {
    let sequence_number = global
        .highest_listen_sequence_number
        .checked_add(1)
        .ok_or_else(|| resource_exhausted("listen sequence numbers exhausted"))?;
    global.highest_listen_sequence_number = sequence_number;
    Ok(sequence_number)
}
