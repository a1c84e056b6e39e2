use image::DynamicImage;

use super::error::PipelineError;

/// Decode an opaque byte buffer into a raster. All-or-nothing: an empty,
/// truncated or unrecognized buffer yields a decode error, never a partial
/// image. `artifact` names the buffer ("input image" or "watermark") in the
/// surfaced error.
pub fn decode_image(bytes: &[u8], artifact: &'static str) -> Result<DynamicImage, PipelineError> {
    image::load_from_memory(bytes).map_err(PipelineError::decode(artifact))
}
