use crate::store::{ArtifactSource, OutputSink, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory artifact source, primarily for tests.
#[derive(Default)]
pub struct MemorySource {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.objects
            .lock()
            .expect("memory source lock poisoned")
            .insert(key.into(), bytes);
    }
}

#[async_trait]
impl ArtifactSource for MemorySource {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .lock()
            .expect("memory source lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn name(&self) -> &str {
        "memory source"
    }
}

/// In-memory output sink. `reject_writes` lets tests inject delivery
/// failures without touching the filesystem.
#[derive(Default)]
pub struct MemorySink {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    reject_writes: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("memory sink lock poisoned")
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .expect("memory sink lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected(key.to_string()));
        }
        self.objects
            .lock()
            .expect("memory sink lock poisoned")
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory sink"
    }
}
