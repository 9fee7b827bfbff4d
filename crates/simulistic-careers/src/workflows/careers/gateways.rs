use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use super::domain::{ApplicationRecord, NewApplicationRecord, ResumePath};

/// Sort order accepted by [`RecordStore::list_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    ApplicationDateDesc,
}

/// Structured-data service holding application records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: NewApplicationRecord)
        -> Result<ApplicationRecord, RecordStoreError>;
    async fn list_all(&self, order: ListOrder) -> Result<Vec<ApplicationRecord>, RecordStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("record store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store returned an unexpected payload: {0}")]
    Decode(String),
}

/// Write options passed along with a blob upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub cache_control: String,
    pub upsert: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            cache_control: "3600".to_string(),
            upsert: false,
        }
    }
}

/// Binary object returned by a blob download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

/// Binary-object service holding résumé files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        path: &ResumePath,
        blob: Blob,
        options: UploadOptions,
    ) -> Result<(), BlobStoreError>;
    async fn download(&self, path: &ResumePath) -> Result<Blob, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("an object already exists at '{0}'")]
    AlreadyExists(String),
    #[error("no object stored at '{0}'")]
    NotFound(String),
    #[error("blob store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

/// Templated email dispatch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRequest {
    pub service_id: String,
    pub template_id: String,
    pub params: BTreeMap<String, String>,
    pub public_key: String,
}

/// Outbound email hook notified after each stored application.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, request: NotificationRequest) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
