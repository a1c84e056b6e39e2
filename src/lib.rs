use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod pipeline;
pub mod startup_checks;
pub mod store;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "sukashi".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory watched for newly uploaded input images.
    pub input_directory: PathBuf,
    /// The watermark artifact applied to every rendition.
    pub watermark_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("inputimg"),
            watermark_path: PathBuf::from("utilimg/watermark.png"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Rendition targets, widest first. Widths must be strictly descending
    /// because each rendition is resized from the previous one.
    pub targets: Vec<TargetConfig>,
    #[serde(default)]
    pub output_format: pipeline::OutputFormat,
    pub jpeg_quality: Option<u8>,
    pub webp_quality: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                TargetConfig::new(1920, "outimg-px1920"),
                TargetConfig::new(1024, "outimg-px1024"),
                TargetConfig::new(400, "outimg-px400"),
            ],
            output_format: pipeline::OutputFormat::default(),
            jpeg_quality: None,
            webp_quality: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    pub width: u32,
    pub output_directory: PathBuf,
}

impl TargetConfig {
    pub fn new(width: u32, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            width,
            output_directory: output_directory.into(),
        }
    }
}
