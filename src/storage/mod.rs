//! Storage backend abstraction

mod s3;
mod traits;

pub use s3::S3Backend;
pub use traits::{BucketTag, PresignMethod, PresignRequest, StorageBackend, StorageError};
