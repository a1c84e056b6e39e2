use crate::store::{ArtifactSource, OutputSink, StoreError};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Reads artifacts as files under a fixed directory.
pub struct FilesystemSource {
    directory: PathBuf,
    name: String,
}

impl FilesystemSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let name = format!("fs:{}", directory.display());
        Self { directory, name }
    }
}

#[async_trait]
impl ArtifactSource for FilesystemSource {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.directory.join(key);
        if !path.exists() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        let bytes = tokio::fs::read(&path).await?;
        debug!("Read {} bytes from {:?}", bytes.len(), path);
        Ok(bytes)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Writes artifacts as files under a fixed directory, creating it on demand.
pub struct FilesystemSink {
    directory: PathBuf,
    name: String,
}

impl FilesystemSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let name = format!("fs:{}", directory.display());
        Self { directory, name }
    }
}

#[async_trait]
impl OutputSink for FilesystemSink {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(key);
        tokio::fs::write(&path, bytes).await?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
