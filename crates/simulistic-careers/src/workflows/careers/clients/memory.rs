use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::workflows::careers::domain::{
    ApplicationId, ApplicationRecord, NewApplicationRecord, ResumePath,
};
use crate::workflows::careers::gateways::{
    Blob, BlobStore, BlobStoreError, ListOrder, NotificationRequest, NotificationSender,
    NotifyError, RecordStore, RecordStoreError, UploadOptions,
};

/// Process-local record store used by the demo and when no hosted backend is configured.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    records: Arc<Mutex<Vec<ApplicationRecord>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryRecordStore {
    pub fn with_records(records: Vec<ApplicationRecord>) -> Self {
        Self {
            sequence: Arc::new(AtomicU64::new(records.len() as u64)),
            records: Arc::new(Mutex::new(records)),
        }
    }

    pub fn records(&self) -> Vec<ApplicationRecord> {
        self.records.lock().expect("record mutex poisoned").clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(
        &self,
        record: NewApplicationRecord,
    ) -> Result<ApplicationRecord, RecordStoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = record.with_id(ApplicationId(format!("app-{id:06}")));
        self.records
            .lock()
            .expect("record mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self, order: ListOrder) -> Result<Vec<ApplicationRecord>, RecordStoreError> {
        let mut records = self.records();
        match order {
            ListOrder::ApplicationDateDesc => {
                records.sort_by(|a, b| b.application_date.cmp(&a.application_date))
            }
        }
        Ok(records)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryBlobStore {
    objects: Arc<Mutex<HashMap<String, Blob>>>,
}

impl InMemoryBlobStore {
    pub fn contains(&self, path: &ResumePath) -> bool {
        self.objects
            .lock()
            .expect("blob mutex poisoned")
            .contains_key(path.as_str())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .lock()
            .expect("blob mutex poisoned")
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        path: &ResumePath,
        blob: Blob,
        options: UploadOptions,
    ) -> Result<(), BlobStoreError> {
        let mut objects = self.objects.lock().expect("blob mutex poisoned");
        if !options.upsert && objects.contains_key(path.as_str()) {
            return Err(BlobStoreError::AlreadyExists(path.to_string()));
        }
        objects.insert(path.to_string(), blob);
        Ok(())
    }

    async fn download(&self, path: &ResumePath) -> Result<Blob, BlobStoreError> {
        self.objects
            .lock()
            .expect("blob mutex poisoned")
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(path.to_string()))
    }
}

/// Notification sender that logs and keeps every request instead of emailing.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<NotificationRequest>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        info!(
            template = %request.template_id,
            from = request.params.get("from_name").map(String::as_str).unwrap_or("unknown"),
            "notification captured"
        );
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(request);
        Ok(())
    }
}
