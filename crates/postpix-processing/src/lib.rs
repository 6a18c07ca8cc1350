//! Postpix processing
//!
//! The pure stages of the pipeline: turning source image bytes into the derivative
//! (`image`) and synthesizing the display record for it (`metadata`).

#[cfg(feature = "image")]
pub mod image;
pub mod metadata;

#[cfg(feature = "image")]
pub use image::{ImageTransformer, TransformError};
pub use metadata::{
    ContentSource, MetadataSynthesizer, RandomContentSource, TAG_COUNT, TAG_VOCABULARY,
};
