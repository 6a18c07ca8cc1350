//! Per-item pipeline and its run loop.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{Orchestrator, PipelineConfig, RunReport};
pub use state::Stage;
