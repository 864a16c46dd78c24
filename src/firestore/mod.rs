pub mod error;
pub mod local;
pub mod model;

pub use error::{FirestoreError, FirestoreErrorCode, FirestoreResult};
