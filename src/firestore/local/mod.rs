mod local_serializer;
mod lru_garbage_collector;
mod memory;
mod persistence;
pub(crate) mod proto;
pub(crate) mod schema;
mod target_cache;
mod target_data;

#[doc(inline)]
pub use local_serializer::LocalSerializer;
#[doc(inline)]
pub use lru_garbage_collector::{
    LruGarbageCollector, LruParams, LruResults, INVALID_SEQUENCE_NUMBER,
};
#[doc(inline)]
pub use memory::MemoryPersistence;
#[doc(inline)]
pub use persistence::{Persistence, Transaction};
#[doc(inline)]
pub use target_cache::TargetCache;
#[doc(inline)]
pub use target_data::{TargetData, TargetGlobal, TargetPurpose};
