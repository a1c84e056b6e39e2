// Format-specific encoder adapters. Each serializes an RGB raster into an
// opaque byte buffer; quality defaults match the pipeline configuration.
pub mod jpeg;
pub mod png;
pub mod webp;

use image::RgbImage;

use super::error::PipelineError;
use super::types::OutputFormat;

pub const DEFAULT_JPEG_QUALITY: u8 = 85;
pub const DEFAULT_WEBP_QUALITY: f32 = 85.0;

#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub format: OutputFormat,
    pub jpeg_quality: u8,
    pub webp_quality: f32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            webp_quality: DEFAULT_WEBP_QUALITY,
        }
    }
}

pub fn encode(image: &RgbImage, options: EncodeOptions) -> Result<Vec<u8>, PipelineError> {
    match options.format {
        OutputFormat::Jpeg => jpeg::encode(image, options.jpeg_quality),
        OutputFormat::WebP => webp::encode(image, options.webp_quality),
        OutputFormat::Png => png::encode(image),
    }
}
