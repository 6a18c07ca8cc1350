//! Postpix worker
//!
//! Consumes object-created notifications from a queue and, for each uploaded image,
//! writes a 512×512 PNG derivative and records a post for it.

pub mod pipeline;
pub mod source;
pub mod telemetry;

pub use pipeline::{Orchestrator, PipelineConfig, RunReport, Stage};
pub use source::{parse_notification, SourceError, SourceMessage, SqsWorkSource, WorkSource};
pub use telemetry::init_telemetry;
