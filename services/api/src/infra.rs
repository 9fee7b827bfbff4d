use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use simulistic_careers::config::AppConfig;
use simulistic_careers::error::AppError;
use simulistic_careers::workflows::careers::clients::{
    EmailJsNotifier, HostedBackend, InMemoryBlobStore, InMemoryRecordStore, RecordingNotifier,
    RestBlobStore, RestRecordStore,
};
use simulistic_careers::workflows::careers::{
    ApplicationRecord, Blob, BlobStore, BlobStoreError, CareersService, ListOrder,
    NewApplicationRecord, NotificationRequest, NotificationSender, NotifyError, RecordStore,
    RecordStoreError, ResumePath, UploadOptions,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Record store selected from configuration.
#[derive(Debug, Clone)]
pub(crate) enum RecordBackend {
    Hosted(RestRecordStore),
    InMemory(InMemoryRecordStore),
}

#[async_trait]
impl RecordStore for RecordBackend {
    async fn insert(
        &self,
        record: NewApplicationRecord,
    ) -> Result<ApplicationRecord, RecordStoreError> {
        match self {
            RecordBackend::Hosted(store) => store.insert(record).await,
            RecordBackend::InMemory(store) => store.insert(record).await,
        }
    }

    async fn list_all(&self, order: ListOrder) -> Result<Vec<ApplicationRecord>, RecordStoreError> {
        match self {
            RecordBackend::Hosted(store) => store.list_all(order).await,
            RecordBackend::InMemory(store) => store.list_all(order).await,
        }
    }
}

/// Blob store selected from configuration.
#[derive(Debug, Clone)]
pub(crate) enum BlobBackend {
    Hosted(RestBlobStore),
    InMemory(InMemoryBlobStore),
}

#[async_trait]
impl BlobStore for BlobBackend {
    async fn upload(
        &self,
        path: &ResumePath,
        blob: Blob,
        options: UploadOptions,
    ) -> Result<(), BlobStoreError> {
        match self {
            BlobBackend::Hosted(store) => store.upload(path, blob, options).await,
            BlobBackend::InMemory(store) => store.upload(path, blob, options).await,
        }
    }

    async fn download(&self, path: &ResumePath) -> Result<Blob, BlobStoreError> {
        match self {
            BlobBackend::Hosted(store) => store.download(path).await,
            BlobBackend::InMemory(store) => store.download(path).await,
        }
    }
}

/// Notification sender selected from configuration.
#[derive(Debug, Clone)]
pub(crate) enum NotifierBackend {
    EmailJs(EmailJsNotifier),
    Recording(RecordingNotifier),
}

#[async_trait]
impl NotificationSender for NotifierBackend {
    async fn send(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        match self {
            NotifierBackend::EmailJs(notifier) => notifier.send(request).await,
            NotifierBackend::Recording(notifier) => notifier.send(request).await,
        }
    }
}

pub(crate) type AppService = CareersService<RecordBackend, BlobBackend, NotifierBackend>;

/// Builds the careers service around the backends named in `config`, falling back to the
/// in-memory clients for anything left unconfigured.
pub(crate) fn build_service(config: &AppConfig) -> Result<AppService, AppError> {
    let (records, blobs) = match config.backend.hosted() {
        Some((url, key)) => {
            let backend = HostedBackend::new(url, key)?;
            info!(
                %url,
                table = %config.backend.table,
                bucket = %config.backend.bucket,
                "using hosted record and blob stores"
            );
            (
                RecordBackend::Hosted(RestRecordStore::new(
                    backend.clone(),
                    config.backend.table.clone(),
                )),
                BlobBackend::Hosted(RestBlobStore::new(backend, config.backend.bucket.clone())),
            )
        }
        None => {
            warn!("RECORD_STORE_URL/RECORD_STORE_KEY not set, applications are kept in memory");
            (
                RecordBackend::InMemory(InMemoryRecordStore::default()),
                BlobBackend::InMemory(InMemoryBlobStore::default()),
            )
        }
    };

    let notifier = match config.notifications.hosted_endpoint() {
        Some(endpoint) => {
            info!(%endpoint, "using hosted email notifications");
            NotifierBackend::EmailJs(EmailJsNotifier::new(endpoint))
        }
        None => {
            warn!("NOTIFY_ENDPOINT not set, notifications are only logged");
            NotifierBackend::Recording(RecordingNotifier::default())
        }
    };

    Ok(CareersService::new(
        Arc::new(records),
        Arc::new(blobs),
        Arc::new(notifier),
        config.notifications.template(),
        config.export.options()?,
    ))
}
