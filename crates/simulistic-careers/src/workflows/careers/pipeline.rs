use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicationDraft, ApplicationRecord, NewApplicationRecord, ResumePath};
use super::gateways::{
    Blob, BlobStore, BlobStoreError, NotificationRequest, NotificationSender, RecordStore,
    RecordStoreError, UploadOptions,
};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Email template settings used for the post-submission notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub recipient: String,
}

impl NotificationTemplate {
    pub(crate) fn request(&self, params: BTreeMap<String, String>) -> NotificationRequest {
        NotificationRequest {
            service_id: self.service_id.clone(),
            template_id: self.template_id.clone(),
            params,
            public_key: self.public_key.clone(),
        }
    }

    fn application_request(&self, record: &ApplicationRecord) -> NotificationRequest {
        let mut params = BTreeMap::new();
        params.insert("to_email".to_string(), self.recipient.clone());
        params.insert("from_name".to_string(), record.name.clone());
        params.insert("role".to_string(), record.role.label().to_string());
        params.insert(
            "employment_type".to_string(),
            record.employment_type.value().to_string(),
        );
        params.insert(
            "message".to_string(),
            format!(
                "New application received:\nPosition: {}\nType: {}\nName: {}",
                record.role.label(),
                record.employment_type.value(),
                record.name
            ),
        );
        self.request(params)
    }
}

/// Result of the best-effort notification stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Delivered,
    Failed(String),
}

/// Successful submission: the stored record plus how the notification went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub record: ApplicationRecord,
    pub notification: NotificationOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("resume upload failed: {0}")]
    Upload(#[source] BlobStoreError),
    /// The résumé at `resume_path` stays in the blob store without a record.
    #[error("application could not be saved: {source}")]
    Insert {
        resume_path: ResumePath,
        #[source]
        source: RecordStoreError,
    },
}

/// Upload, insert, notify, in that order.
pub struct SubmissionPipeline<R, B, N> {
    records: Arc<R>,
    blobs: Arc<B>,
    notifier: Arc<N>,
    template: NotificationTemplate,
    upload_options: UploadOptions,
    clock: Clock,
}

impl<R, B, N> SubmissionPipeline<R, B, N>
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(
        records: Arc<R>,
        blobs: Arc<B>,
        notifier: Arc<N>,
        template: NotificationTemplate,
    ) -> Self {
        Self {
            records,
            blobs,
            notifier,
            template,
            upload_options: UploadOptions::default(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn records(&self) -> &Arc<R> {
        &self.records
    }

    pub fn blobs(&self) -> &Arc<B> {
        &self.blobs
    }

    pub fn notifier(&self) -> &Arc<N> {
        &self.notifier
    }

    pub fn template(&self) -> &NotificationTemplate {
        &self.template
    }

    /// Runs the three stages for one validated draft.
    ///
    /// Only the upload and insert stages decide the outcome. A failed notification is logged and
    /// reported on the receipt.
    pub async fn run(
        &self,
        draft: ApplicationDraft,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let submitted_at = (self.clock)();
        let resume_path = self.upload_resume(&draft, submitted_at).await?;
        let record = self.insert_record(draft, resume_path, submitted_at).await?;
        let notification = self.notify(&record).await;
        Ok(SubmissionReceipt {
            record,
            notification,
        })
    }

    async fn upload_resume(
        &self,
        draft: &ApplicationDraft,
        submitted_at: DateTime<Utc>,
    ) -> Result<ResumePath, SubmissionError> {
        let path = ResumePath::for_upload(submitted_at, draft.resume.base_name());
        let blob = Blob {
            content_type: Some(draft.resume.resolved_content_type()),
            content: draft.resume.content.clone(),
        };

        self.blobs
            .upload(&path, blob, self.upload_options.clone())
            .await
            .map_err(|err| {
                warn!(resume_path = %path, error = %err, "resume upload failed");
                SubmissionError::Upload(err)
            })?;

        Ok(path)
    }

    async fn insert_record(
        &self,
        draft: ApplicationDraft,
        resume_path: ResumePath,
        submitted_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, SubmissionError> {
        let ApplicationDraft {
            role,
            name,
            gender,
            employment_type,
            source,
            resume: _,
        } = draft;

        let row = NewApplicationRecord {
            role,
            name,
            gender,
            employment_type,
            source,
            resume_path: resume_path.clone(),
            application_date: submitted_at,
        };

        match self.records.insert(row).await {
            Ok(record) => {
                info!(application_id = %record.id, role = record.role.label(), "application stored");
                Ok(record)
            }
            Err(source) => {
                warn!(%resume_path, error = %source, "application insert failed, resume left orphaned");
                Err(SubmissionError::Insert {
                    resume_path,
                    source,
                })
            }
        }
    }

    async fn notify(&self, record: &ApplicationRecord) -> NotificationOutcome {
        let request = self.template.application_request(record);
        match self.notifier.send(request).await {
            Ok(()) => NotificationOutcome::Delivered,
            Err(err) => {
                warn!(application_id = %record.id, error = %err, "application notification failed");
                NotificationOutcome::Failed(err.to_string())
            }
        }
    }
}
