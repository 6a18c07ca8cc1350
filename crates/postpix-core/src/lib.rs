//! Postpix Core Library
//!
//! This crate provides the domain model, error taxonomy and configuration shared by
//! the storage, processing, persistence and worker crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{DatabaseConfig, StorageConfig, WorkerConfig};
pub use error::{LogLevel, PipelineError, PipelineResult};
pub use models::{
    derivative_key, AckToken, DerivativeSpec, OutputFormat, PersistedPost, PostRecord, WorkItem,
    DERIVATIVE_PREFIX,
};
pub use storage_types::StorageBackend;
