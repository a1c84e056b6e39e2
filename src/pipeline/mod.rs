// Pipeline module - turns one input image into watermarked renditions at
// fixed target widths and fans them out to per-target output sinks.
mod decode;
mod error;
pub mod formats;
mod resize;
mod types;
mod watermark;

pub use decode::decode_image;
pub use error::PipelineError;
pub use resize::{resize_cascade, resize_to_width, scaled_height};
pub use types::{OutputFormat, Rendition};
pub use watermark::{WATERMARK_ALPHA, WatermarkCache, composite_watermark};

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::info;

use crate::PipelineConfig;
use crate::store::ArtifactIo;
use formats::EncodeOptions;

pub struct Pipeline {
    widths: Vec<u32>,
    encode_options: EncodeOptions,
    watermark_cache: WatermarkCache,
}

impl Pipeline {
    /// Build a pipeline from configuration. Target widths must be strictly
    /// descending: each rendition is resized from the previous one, so an
    /// out-of-order width would upscale an already-downscaled raster.
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        if config.targets.is_empty() {
            return Err(PipelineError::Config(
                "at least one rendition target is required".to_string(),
            ));
        }
        let widths: Vec<u32> = config.targets.iter().map(|t| t.width).collect();
        for pair in widths.windows(2) {
            if pair[1] >= pair[0] {
                return Err(PipelineError::Config(format!(
                    "target widths must be strictly descending, got {} before {}",
                    pair[0], pair[1]
                )));
            }
        }

        Ok(Self {
            widths,
            encode_options: EncodeOptions {
                format: config.output_format,
                jpeg_quality: config.jpeg_quality.unwrap_or(formats::DEFAULT_JPEG_QUALITY),
                webp_quality: config.webp_quality.unwrap_or(formats::DEFAULT_WEBP_QUALITY),
            },
            watermark_cache: WatermarkCache::new(),
        })
    }

    pub fn target_widths(&self) -> &[u32] {
        &self.widths
    }

    pub fn output_format(&self) -> OutputFormat {
        self.encode_options.format
    }

    /// Transform one input image into the configured renditions, widest
    /// first. The first failing stage aborts the run; there are no partial
    /// results. The watermark decode is served from the process-wide cache
    /// after the first successful run.
    pub async fn run(
        &self,
        input: Vec<u8>,
        watermark_bytes: &[u8],
    ) -> Result<Vec<Rendition>, PipelineError> {
        let started = Instant::now();

        let watermark = self.watermark_cache.get(watermark_bytes).await?;
        info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            "Watermark loaded"
        );

        let decoded = task::spawn_blocking(move || {
            decode_image(&input, "input image").map(|img| img.to_rgb8())
        })
        .await??;
        info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            width = decoded.width(),
            height = decoded.height(),
            "Input image decoded"
        );

        // The cascade is a dependency chain and runs sequentially in one
        // blocking task.
        let widths = self.widths.clone();
        let rasters =
            task::spawn_blocking(move || resize_cascade(&decoded, &widths)).await??;
        info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            "Renditions resized"
        );

        // After the cascade the targets are independent; composite and
        // encode them in parallel.
        let mut handles = Vec::with_capacity(rasters.len());
        for (raster, width) in rasters.into_iter().zip(self.widths.iter().copied()) {
            let watermark = Arc::clone(&watermark);
            let options = self.encode_options;
            handles.push(task::spawn_blocking(
                move || -> Result<Rendition, PipelineError> {
                    let composited = composite_watermark(raster, &watermark)?;
                    let bytes = formats::encode(&composited, options)?;
                    Ok(Rendition {
                        width,
                        format: options.format,
                        bytes,
                    })
                },
            ));
        }
        let mut renditions = Vec::with_capacity(handles.len());
        for handle in handles {
            renditions.push(handle.await??);
        }
        info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            count = renditions.len(),
            "Renditions watermarked and encoded"
        );

        Ok(renditions)
    }

    /// Full run against external stores: fetch the input and watermark
    /// artifacts, transform, then deliver every rendition to its paired
    /// sink. Delivery starts only once all renditions encoded, so a failed
    /// run delivers nothing; a run succeeds only when every sink write does.
    pub async fn process(&self, filename: &str, io: &ArtifactIo) -> Result<(), PipelineError> {
        if io.sinks.len() != self.widths.len() {
            return Err(PipelineError::Config(format!(
                "{} output sinks configured for {} targets",
                io.sinks.len(),
                self.widths.len()
            )));
        }

        let started = Instant::now();
        info!(filename, "Pipeline run triggered");

        let input = io
            .input
            .fetch(filename)
            .await
            .map_err(|source| PipelineError::Fetch {
                artifact: "input image",
                source,
            })?;
        info!(filename, bytes = input.len(), "Input artifact read");

        let watermark_bytes =
            io.watermark
                .fetch(&io.watermark_key)
                .await
                .map_err(|source| PipelineError::Fetch {
                    artifact: "watermark",
                    source,
                })?;

        let renditions = self.run(input, &watermark_bytes).await?;

        let output_key = output_key(filename, self.encode_options.format);
        for (rendition, sink) in renditions.iter().zip(&io.sinks) {
            sink.put(&output_key, &rendition.bytes)
                .await
                .map_err(|source| PipelineError::Delivery {
                    width: rendition.width,
                    sink: sink.name().to_string(),
                    source,
                })?;
        }

        info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            filename,
            count = renditions.len(),
            "Run finished, all renditions delivered"
        );
        Ok(())
    }
}

/// Output key for a rendition: the input filename with its extension
/// swapped for the output format's.
pub fn output_key(filename: &str, format: OutputFormat) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    format!("{}.{}", stem, format.extension())
}
