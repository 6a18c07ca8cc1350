//! Postpix Storage Library
//!
//! This crate provides the object store gateway used by the worker: the `Storage`
//! trait and implementations for S3 (and S3-compatible providers) and the local
//! filesystem.
//!
//! # Addressing
//!
//! Objects are addressed by `(bucket, key)`. Keys must not contain `..` or a leading `/`.
//! A successful `store` is visible to every subsequent `fetch`; no eventual-consistency
//! handling is modeled.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use postpix_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{FetchedObject, Storage, StorageError, StorageResult};
