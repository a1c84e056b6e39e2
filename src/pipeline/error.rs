use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to decode {artifact}: {source}")]
    Decode {
        artifact: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "invalid target dimensions {target_width}x{target_height} derived from {source_width}x{source_height}"
    )]
    InvalidDimension {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
    },

    #[error("failed to encode {width}px rendition: {source}")]
    Encode {
        width: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to fetch {artifact}: {source}")]
    Fetch {
        artifact: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("failed to deliver {width}px rendition to {sink}: {source}")]
    Delivery {
        width: u32,
        sink: String,
        #[source]
        source: StoreError,
    },

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid pipeline configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub(super) fn decode(artifact: &'static str) -> impl FnOnce(image::ImageError) -> Self {
        move |source| Self::Decode { artifact, source }
    }

    pub(super) fn encode<E>(width: u32) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |source| Self::Encode {
            width,
            source: Box::new(source),
        }
    }
}
