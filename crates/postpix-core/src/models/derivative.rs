//! Derivative image specification and key layout.
//!
//! Key format: every derivative lives under `output/{filename}`, where `filename` is the
//! final path segment of the source key. The mapping is a pure function of the source
//! key, so a redelivered work item overwrites its earlier derivative instead of
//! creating a second one.

use serde::{Deserialize, Serialize};

/// Namespace every derivative key is placed under.
pub const DERIVATIVE_PREFIX: &str = "output/";

/// Encodings a derivative can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
}

impl OutputFormat {
    pub fn to_mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
        }
    }
}

/// Fixed shape of the derivative produced for every source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeSpec {
    pub width: u32,
    pub height: u32,
    pub output_format: OutputFormat,
}

impl DerivativeSpec {
    pub const DEFAULT: DerivativeSpec = DerivativeSpec {
        width: 512,
        height: 512,
        output_format: OutputFormat::Png,
    };

    pub fn content_type(&self) -> &'static str {
        self.output_format.to_mime_type()
    }
}

impl Default for DerivativeSpec {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Derive the storage key of a derivative from its source key.
///
/// All leading path segments are dropped; only the filename is kept.
pub fn derivative_key(source_key: &str) -> String {
    let filename = source_key.rsplit('/').next().unwrap_or(source_key);
    format!("{}{}", DERIVATIVE_PREFIX, filename)
}
