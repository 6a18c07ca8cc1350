//! Image transformer - produces the fixed-size derivative of a source image

use bytes::Bytes;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, ImageReader};
use postpix_core::{DerivativeSpec, OutputFormat, PipelineError};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Unrecognized or corrupt image: {0}")]
    Decode(String),

    #[error("Failed to encode derivative: {0}")]
    Encode(String),
}

impl From<TransformError> for PipelineError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Decode(msg) => PipelineError::Decode(msg),
            TransformError::Encode(msg) => PipelineError::Encode(msg),
        }
    }
}

/// Resizes source images to a [`DerivativeSpec`].
///
/// The output is always exactly `width × height`; the source aspect ratio is not
/// preserved. The same input bytes always produce the same output bytes.
#[derive(Debug, Clone, Copy)]
pub struct ImageTransformer {
    spec: DerivativeSpec,
}

impl ImageTransformer {
    pub fn new(spec: DerivativeSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &DerivativeSpec {
        &self.spec
    }

    /// Decode, resize and re-encode `data`.
    pub fn transform(&self, data: &[u8]) -> Result<Bytes, TransformError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| TransformError::Decode(e.to_string()))?;

        let (source_width, source_height) = img.dimensions();

        let resized = img.resize_exact(self.spec.width, self.spec.height, FilterType::Lanczos3);

        // PNG has no floating point color types.
        let resized = match resized.color() {
            ColorType::Rgb32F | ColorType::Rgba32F => {
                DynamicImage::ImageRgba8(resized.to_rgba8())
            }
            _ => resized,
        };

        let mut buffer = Vec::with_capacity(initial_capacity(&self.spec));
        resized
            .write_to(
                &mut Cursor::new(&mut buffer),
                image_format(self.spec.output_format),
            )
            .map_err(|e| TransformError::Encode(e.to_string()))?;

        tracing::debug!(
            source_width,
            source_height,
            width = self.spec.width,
            height = self.spec.height,
            size_bytes = buffer.len(),
            "Image resized"
        );

        Ok(Bytes::from(buffer))
    }
}

impl Default for ImageTransformer {
    fn default() -> Self {
        Self::new(DerivativeSpec::default())
    }
}

/// Upper bound on the buffer reserved before encoding; PNG output is compressed.
const MAX_INITIAL_CAPACITY: usize = 16 * 1024 * 1024;

fn initial_capacity(spec: &DerivativeSpec) -> usize {
    (spec.width as usize)
        .saturating_mul(spec.height as usize)
        .saturating_mul(3)
        .min(MAX_INITIAL_CAPACITY)
}

fn image_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Png => ImageFormat::Png,
    }
}
