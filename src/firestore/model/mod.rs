pub(crate) mod base_path;
mod database_id;
mod document_key;
mod field_path;
mod resource_path;
mod snapshot_version;
mod target;
mod timestamp;

pub use database_id::{DatabaseId, DEFAULT_DATABASE_ID};
pub use document_key::DocumentKey;
pub use field_path::FieldPath;
pub use resource_path::ResourcePath;
pub use snapshot_version::SnapshotVersion;
pub use target::{DocumentsTarget, QueryTarget, TargetDefinition};
pub use timestamp::Timestamp;
