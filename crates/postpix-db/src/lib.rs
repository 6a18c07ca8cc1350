//! Postpix Database Layer
//!
//! This crate provides the persistence stage of the pipeline: schema provisioning and
//! the append-only `posts` repository.

// Module declarations
pub mod db;
pub mod error;

// Re-exports
pub use db::posts::{PgPostStore, PostStore};
pub use db::schema::CREATE_POSTS_TABLE;
pub use error::DbError;
