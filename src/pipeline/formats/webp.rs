use image::RgbImage;

use crate::pipeline::error::PipelineError;

/// libwebp rejects pictures wider or taller than this.
const WEBP_MAX_DIMENSION: u32 = 16383;

/// Encode as lossy WebP at the given quality.
pub fn encode(image: &RgbImage, quality: f32) -> Result<Vec<u8>, PipelineError> {
    if image.width() > WEBP_MAX_DIMENSION || image.height() > WEBP_MAX_DIMENSION {
        return Err(PipelineError::encode(image.width())(std::io::Error::other(
            format!(
                "{}x{} exceeds the WebP dimension limit of {}",
                image.width(),
                image.height(),
                WEBP_MAX_DIMENSION
            ),
        )));
    }

    let encoder = webp::Encoder::from_rgb(image.as_raw(), image.width(), image.height());
    let encoded = encoder.encode(quality);
    Ok(encoded.to_vec())
}
