//! Local target tracking and document addressing for a Firestore client cache.
//!
//! [`firestore::model`] holds the path types (`ResourcePath`, `FieldPath`,
//! `DocumentKey`) and target definitions. [`firestore::local`] persists
//! `TargetData` and the `TargetGlobal` bookkeeping record through a transactional
//! key/value [`Persistence`](firestore::local::Persistence), and evicts stale targets
//! with the LRU garbage collector.
//!
//! ```
//! use std::sync::Arc;
//!
//! use firestore_local::firestore::local::{
//!     LocalSerializer, MemoryPersistence, TargetCache, TargetData, TargetPurpose,
//! };
//! use firestore_local::firestore::model::{DatabaseId, ResourcePath, TargetDefinition};
//!
//! let cache = TargetCache::new(
//!     Arc::new(MemoryPersistence::new()),
//!     LocalSerializer::new(DatabaseId::default("my-project")),
//! );
//! let target_id = cache.allocate_target_id()?;
//! let sequence_number = cache.allocate_sequence_number()?;
//! let target = TargetDefinition::query(ResourcePath::from_string("rooms")?, Vec::<u8>::new());
//! cache.put_target_data(&TargetData::new(
//!     target.clone(),
//!     target_id,
//!     sequence_number,
//!     TargetPurpose::Listen,
//! ))?;
//!
//! let found = cache.get_target_data_for_definition(&target)?;
//! assert_eq!(found.map(|data| data.target_id()), Some(target_id));
//! # Ok::<(), firestore_local::firestore::FirestoreError>(())
//! ```

pub mod firestore;
pub mod util;
