use image::{ImageEncoder, RgbImage, codecs::png::PngEncoder};

use crate::pipeline::error::PipelineError;

/// Encode as PNG. Lossless, so mainly useful for exact-pixel verification
/// and archival outputs.
pub fn encode(image: &RgbImage) -> Result<Vec<u8>, PipelineError> {
    let mut output = Vec::new();
    let encoder = PngEncoder::new(&mut output);
    encoder
        .write_image(
            image,
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(PipelineError::encode(image.width()))?;
    Ok(output)
}
