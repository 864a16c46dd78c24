use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::firestore::error::FirestoreResult;
use crate::firestore::local::persistence::Persistence;
use crate::firestore::local::target_cache::TargetCache;

/// Returned by [`LruGarbageCollector::sequence_number_for_query_count`] when there is
/// nothing to collect.
pub const INVALID_SEQUENCE_NUMBER: i64 = -1;

const COLLECTION_DISABLED: i64 = -1;
const DEFAULT_CACHE_SIZE_BYTES: i64 = 100 * 1024 * 1024;
const DEFAULT_PERCENTILE_TO_COLLECT: u32 = 10;
const DEFAULT_MAX_SEQUENCE_NUMBERS_TO_COLLECT: usize = 1000;

/// Tuning knobs for target garbage collection.
///
/// Deserializes from camelCase settings; missing fields take their default value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LruParams {
    /// Collection only runs once the store holds at least this many bytes. A negative
    /// value disables collection.
    pub cache_size_collection_threshold: i64,
    pub percentile_to_collect: u32,
    pub maximum_sequence_numbers_to_collect: usize,
}

impl Default for LruParams {
    fn default() -> Self {
        Self {
            cache_size_collection_threshold: DEFAULT_CACHE_SIZE_BYTES,
            percentile_to_collect: DEFAULT_PERCENTILE_TO_COLLECT,
            maximum_sequence_numbers_to_collect: DEFAULT_MAX_SEQUENCE_NUMBERS_TO_COLLECT,
        }
    }
}

impl LruParams {
    pub fn disabled() -> Self {
        Self {
            cache_size_collection_threshold: COLLECTION_DISABLED,
            ..Self::default()
        }
    }

    pub fn with_cache_size(cache_size_bytes: i64) -> Self {
        Self {
            cache_size_collection_threshold: cache_size_bytes,
            ..Self::default()
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.cache_size_collection_threshold == COLLECTION_DISABLED
    }
}

/// Outcome of a single [`LruGarbageCollector::collect`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LruResults {
    pub did_run: bool,
    pub sequence_numbers_collected: usize,
    pub targets_removed: usize,
}

impl LruResults {
    fn skipped() -> Self {
        Self::default()
    }
}

/// Evicts the least recently used targets from a [`TargetCache`].
#[derive(Debug)]
pub struct LruGarbageCollector<'a, P: Persistence> {
    target_cache: &'a TargetCache<P>,
    params: LruParams,
}

impl<'a, P: Persistence> LruGarbageCollector<'a, P> {
    pub fn new(target_cache: &'a TargetCache<P>, params: LruParams) -> Self {
        Self {
            target_cache,
            params,
        }
    }

    pub fn params(&self) -> &LruParams {
        &self.params
    }

    /// Number of sequence numbers that make up `percentile` percent of the targets.
    pub fn calculate_query_count(&self, percentile: u32) -> FirestoreResult<usize> {
        let target_count = self.target_cache.target_count()?;
        Ok(target_count * percentile as usize / 100)
    }

    /// The `count`-th smallest sequence number across all targets.
    pub fn sequence_number_for_query_count(&self, count: usize) -> FirestoreResult<i64> {
        if count == 0 {
            return Ok(INVALID_SEQUENCE_NUMBER);
        }
        let mut sequence_numbers: Vec<i64> = self
            .target_cache
            .all_targets()?
            .iter()
            .map(|target_data| target_data.sequence_number())
            .collect();
        sequence_numbers.sort_unstable();
        Ok(sequence_numbers
            .get(count.min(sequence_numbers.len()).saturating_sub(1))
            .copied()
            .unwrap_or(INVALID_SEQUENCE_NUMBER))
    }

    pub fn remove_targets(
        &self,
        upper_bound: i64,
        live_targets: &BTreeSet<i32>,
    ) -> FirestoreResult<usize> {
        self.target_cache.remove_targets(upper_bound, live_targets)
    }

    /// Runs a collection pass if the store has outgrown its threshold.
    pub fn collect(&self, live_targets: &BTreeSet<i32>) -> FirestoreResult<LruResults> {
        if self.params.is_disabled() {
            log::debug!("garbage collection skipped: disabled");
            return Ok(LruResults::skipped());
        }

        let byte_size = self.target_cache.persistence().byte_size()?;
        // A negative threshold other than the disabled marker always collects.
        if (byte_size as i128) < self.params.cache_size_collection_threshold as i128 {
            log::debug!(
                "garbage collection skipped: cache size {byte_size} is below threshold {}",
                self.params.cache_size_collection_threshold
            );
            return Ok(LruResults::skipped());
        }

        self.run_collection(live_targets)
    }

    fn run_collection(&self, live_targets: &BTreeSet<i32>) -> FirestoreResult<LruResults> {
        let count = self
            .calculate_query_count(self.params.percentile_to_collect)?
            .min(self.params.maximum_sequence_numbers_to_collect);
        let upper_bound = self.sequence_number_for_query_count(count)?;
        let targets_removed = if upper_bound == INVALID_SEQUENCE_NUMBER {
            0
        } else {
            self.remove_targets(upper_bound, live_targets)?
        };

        log::debug!(
            "garbage collection: {count} sequence numbers up to {upper_bound}, removed {targets_removed} targets"
        );
        Ok(LruResults {
            did_run: true,
            sequence_numbers_collected: count,
            targets_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::firestore::local::local_serializer::LocalSerializer;
    use crate::firestore::local::memory::MemoryPersistence;
    use crate::firestore::local::target_data::{TargetData, TargetPurpose};
    use crate::firestore::model::{DatabaseId, ResourcePath, TargetDefinition};

    fn cache_with_targets(count: i32) -> TargetCache<MemoryPersistence> {
        let cache = TargetCache::new(
            Arc::new(MemoryPersistence::new()),
            LocalSerializer::new(DatabaseId::default("gc-project")),
        );
        for target_id in 1..=count {
            let target = TargetDefinition::query(
                ResourcePath::from_segments([format!("coll{target_id}")]),
                Vec::<u8>::new(),
            );
            cache
                .put_target_data(&TargetData::new(
                    target,
                    target_id,
                    i64::from(target_id) * 10,
                    TargetPurpose::Listen,
                ))
                .unwrap();
        }
        cache
    }

    #[test]
    fn default_params() {
        let params = LruParams::default();
        assert_eq!(params.cache_size_collection_threshold, 100 * 1024 * 1024);
        assert_eq!(params.percentile_to_collect, 10);
        assert_eq!(params.maximum_sequence_numbers_to_collect, 1000);
        assert!(!params.is_disabled());
        assert!(LruParams::disabled().is_disabled());
    }

    #[test]
    fn params_load_from_json() {
        let params: LruParams =
            serde_json::from_str(r#"{"cacheSizeCollectionThreshold": 2048, "percentileToCollect": 50}"#)
                .unwrap();
        assert_eq!(params.cache_size_collection_threshold, 2048);
        assert_eq!(params.percentile_to_collect, 50);
        assert_eq!(params.maximum_sequence_numbers_to_collect, 1000);

        let json = serde_json::to_value(LruParams::disabled()).unwrap();
        assert_eq!(json["cacheSizeCollectionThreshold"], -1);
    }

    #[test]
    fn query_count_is_percentile_of_targets() {
        let cache = cache_with_targets(50);
        let gc = LruGarbageCollector::new(&cache, LruParams::default());
        assert_eq!(gc.calculate_query_count(10).unwrap(), 5);
        assert_eq!(gc.calculate_query_count(0).unwrap(), 0);
        assert_eq!(gc.calculate_query_count(100).unwrap(), 50);
    }

    #[test]
    fn nth_sequence_number() {
        let cache = cache_with_targets(5);
        let gc = LruGarbageCollector::new(&cache, LruParams::default());
        assert_eq!(gc.sequence_number_for_query_count(0).unwrap(), INVALID_SEQUENCE_NUMBER);
        assert_eq!(gc.sequence_number_for_query_count(1).unwrap(), 10);
        assert_eq!(gc.sequence_number_for_query_count(3).unwrap(), 30);
        assert_eq!(gc.sequence_number_for_query_count(9).unwrap(), 50);
    }

    #[test]
    fn disabled_collection_does_not_run() {
        let cache = cache_with_targets(10);
        let gc = LruGarbageCollector::new(&cache, LruParams::disabled());
        let results = gc.collect(&BTreeSet::new()).unwrap();
        assert!(!results.did_run);
        assert_eq!(cache.target_count().unwrap(), 10);
    }

    #[test]
    fn small_cache_is_left_alone() {
        let cache = cache_with_targets(10);
        let gc = LruGarbageCollector::new(&cache, LruParams::default());
        assert_eq!(gc.collect(&BTreeSet::new()).unwrap(), LruResults::default());
    }

    #[test]
    fn collect_removes_oldest_non_live_targets() {
        let cache = cache_with_targets(20);
        let params = LruParams {
            cache_size_collection_threshold: 0,
            percentile_to_collect: 20,
            ..LruParams::default()
        };
        let gc = LruGarbageCollector::new(&cache, params);

        let live = BTreeSet::from([2]);
        let results = gc.collect(&live).unwrap();
        assert!(results.did_run);
        assert_eq!(results.sequence_numbers_collected, 4);
        assert_eq!(results.targets_removed, 3);

        assert!(cache.get_target_data(1).unwrap().is_none());
        assert!(cache.get_target_data(2).unwrap().is_some());
        assert!(cache.get_target_data(4).unwrap().is_none());
        assert!(cache.get_target_data(5).unwrap().is_some());
        assert_eq!(cache.highest_sequence_number().unwrap(), 200);
    }

    #[test]
    fn collection_is_capped() {
        let cache = cache_with_targets(20);
        let params = LruParams {
            cache_size_collection_threshold: 0,
            percentile_to_collect: 100,
            maximum_sequence_numbers_to_collect: 2,
        };
        let results = LruGarbageCollector::new(&cache, params)
            .collect(&BTreeSet::new())
            .unwrap();
        assert_eq!(results.sequence_numbers_collected, 2);
        assert_eq!(results.targets_removed, 2);
        assert_eq!(cache.target_count().unwrap(), 18);
    }
}
