//! LFS S3 Gateway - Git LFS batch endpoint backed by S3 presigned URLs
//!
//! Authenticates HTTP Basic credentials against tags on the target bucket and
//! answers batch requests with time-limited upload/download URLs.

pub mod api;
pub mod config;
pub mod server;
pub mod storage;
pub mod types;
