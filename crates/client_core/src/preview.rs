//! Local preview references for avatars that have been picked but not uploaded.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use uuid::Uuid;

/// A user-picked image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl AvatarFile {
    pub fn new(
        filename: impl Into<String>,
        mime_type: Option<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type,
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// View-only reference to a local preview. Must be released once replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewRef(String);

impl PreviewRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait PreviewStore: Send + Sync {
    fn create(&self, file: &AvatarFile) -> PreviewRef;
    fn release(&self, preview: &PreviewRef);
}

#[derive(Debug, Default)]
pub struct InMemoryPreviewStore {
    live: Mutex<HashMap<PreviewRef, Arc<[u8]>>>,
}

impl InMemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, preview: &PreviewRef) -> Option<Arc<[u8]>> {
        let live = self.live.lock().unwrap_or_else(|p| p.into_inner());
        live.get(preview).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl PreviewStore for InMemoryPreviewStore {
    fn create(&self, file: &AvatarFile) -> PreviewRef {
        let preview = PreviewRef(format!("blob:preview/{}", Uuid::new_v4()));
        let mut live = self.live.lock().unwrap_or_else(|p| p.into_inner());
        live.insert(preview.clone(), Arc::clone(&file.bytes));
        preview
    }

    fn release(&self, preview: &PreviewRef) {
        let mut live = self.live.lock().unwrap_or_else(|p| p.into_inner());
        live.remove(preview);
    }
}
