use crate::Config;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create output directory: {0}")]
    OutputDirectoryCreationFailed(std::io::Error),

    #[error("Input directory does not exist: {0}")]
    InputDirectoryMissing(String),

    #[error("Watermark file missing: {0}")]
    WatermarkMissing(String),

    #[error("Watermark file is not a decodable image: {0}")]
    WatermarkUnreadable(String),
}

/// Verify the configured storage layout before the first run: the input
/// directory must exist, the watermark must exist and decode, and every
/// output directory is created if absent. The watermark cache itself is not
/// warmed here; it fills on the first run.
pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let input_dir = &config.storage.input_directory;
    if input_dir.exists() {
        info!("Input directory exists: {:?}", input_dir);
    } else {
        error!("Input directory does not exist: {:?}", input_dir);
        errors.push(StartupCheckError::InputDirectoryMissing(
            input_dir.display().to_string(),
        ));
    }

    let watermark_path = &config.storage.watermark_path;
    if !watermark_path.exists() {
        error!("Watermark file does not exist: {:?}", watermark_path);
        errors.push(StartupCheckError::WatermarkMissing(
            watermark_path.display().to_string(),
        ));
    } else {
        match tokio::fs::read(watermark_path).await {
            Ok(bytes) => match image::load_from_memory(&bytes) {
                Ok(img) => info!(
                    "Watermark OK: {:?} ({}x{})",
                    watermark_path,
                    img.width(),
                    img.height()
                ),
                Err(e) => {
                    error!("Watermark file does not decode: {:?}: {}", watermark_path, e);
                    errors.push(StartupCheckError::WatermarkUnreadable(e.to_string()));
                }
            },
            Err(e) => {
                error!("Watermark file is unreadable: {:?}: {}", watermark_path, e);
                errors.push(StartupCheckError::WatermarkUnreadable(e.to_string()));
            }
        }
    }

    for target in &config.pipeline.targets {
        let dir = &target.output_directory;
        if dir.exists() {
            info!(
                "Output directory for {}px target exists: {:?}",
                target.width, dir
            );
        } else {
            warn!(
                "Output directory for {}px target does not exist, creating: {:?}",
                target.width, dir
            );
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                error!("Failed to create output directory {:?}: {}", dir, e);
                errors.push(StartupCheckError::OutputDirectoryCreationFailed(e));
            }
        }
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("{} startup check(s) failed", errors.len());
        Err(errors)
    }
}
