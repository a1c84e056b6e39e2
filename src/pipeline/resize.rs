use image::{RgbImage, imageops, imageops::FilterType};

use super::error::PipelineError;

/// Speed is favored over fidelity here: each run resamples three times.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Derive the output height for a width-constrained resize. Aspect ratio is
/// preserved exactly by `height = floor(src_height / (src_width / target_width))`.
pub fn scaled_height(
    source_width: u32,
    source_height: u32,
    target_width: u32,
) -> Result<u32, PipelineError> {
    let invalid = |target_height| PipelineError::InvalidDimension {
        source_width,
        source_height,
        target_width,
        target_height,
    };

    if target_width == 0 {
        return Err(invalid(0));
    }
    let ratio = source_width as f64 / target_width as f64;
    let target_height = (source_height as f64 / ratio).floor() as u32;
    if target_height < 1 {
        return Err(invalid(target_height));
    }
    Ok(target_height)
}

/// Resize to the requested width, height derived from the aspect ratio.
/// Always allocates a fresh raster, even when the width is unchanged, so a
/// caller may freely mutate the result without touching the source.
pub fn resize_to_width(source: &RgbImage, target_width: u32) -> Result<RgbImage, PipelineError> {
    let target_height = scaled_height(source.width(), source.height(), target_width)?;
    Ok(imageops::resize(
        source,
        target_width,
        target_height,
        RESIZE_FILTER,
    ))
}

/// Produce one raster per width by resizing from the previous, smaller
/// result rather than from the original each time. The widths must be
/// strictly descending (validated at pipeline construction); each step's
/// output is the next step's input, so this chain must stay sequential.
pub fn resize_cascade(source: &RgbImage, widths: &[u32]) -> Result<Vec<RgbImage>, PipelineError> {
    let mut renditions: Vec<RgbImage> = Vec::with_capacity(widths.len());
    for &width in widths {
        let step_source = renditions.last().unwrap_or(source);
        let resized = resize_to_width(step_source, width)?;
        renditions.push(resized);
    }
    Ok(renditions)
}
