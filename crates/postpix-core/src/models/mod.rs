//! Domain models shared across the pipeline

pub mod derivative;
pub mod post;
pub mod work_item;

pub use derivative::{derivative_key, DerivativeSpec, OutputFormat, DERIVATIVE_PREFIX};
pub use post::{PersistedPost, PostRecord};
pub use work_item::{AckToken, WorkItem};
