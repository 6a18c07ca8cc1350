//! Image processing module
//!
//! Decoding, resizing and re-encoding source images into derivatives.

pub mod transformer;

pub use transformer::{ImageTransformer, TransformError};
