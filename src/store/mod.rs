// Artifact store module - blob-style read/write boundaries of the pipeline
mod error;
pub mod filesystem;
pub mod memory;

pub use error::StoreError;

use async_trait::async_trait;
use std::sync::Arc;

/// A read interface yielding opaque byte buffers by key.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError>;
    fn name(&self) -> &str;
}

/// A write interface accepting opaque byte buffers by key.
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn name(&self) -> &str;
}

pub type DynArtifactSource = Arc<dyn ArtifactSource>;
pub type DynOutputSink = Arc<dyn OutputSink>;

/// The external collaborators of one pipeline deployment: where inputs and
/// the watermark come from, and the per-target sinks renditions go to.
/// Sinks are ordered to match the pipeline's targets, widest first.
pub struct ArtifactIo {
    pub input: DynArtifactSource,
    pub watermark: DynArtifactSource,
    pub watermark_key: String,
    pub sinks: Vec<DynOutputSink>,
}
