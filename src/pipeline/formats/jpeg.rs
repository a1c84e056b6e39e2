use image::{ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};

use crate::pipeline::error::PipelineError;

/// Encode as JPEG at the given quality. The raster is already RGB; JPEG has
/// no alpha channel to discard.
pub fn encode(image: &RgbImage, quality: u8) -> Result<Vec<u8>, PipelineError> {
    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, quality);
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
