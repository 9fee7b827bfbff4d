use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::careers::clients::{InMemoryBlobStore, InMemoryRecordStore};
use crate::workflows::careers::domain::{
    ApplicationId, ApplicationRecord, Consent, EmploymentType, Gender, JobRole,
    NewApplicationRecord, ReferralSource, ResumePath, ResumeUpload,
};
use crate::workflows::careers::gateways::{
    Blob, BlobStore, BlobStoreError, ListOrder, NotificationRequest, NotificationSender,
    NotifyError, RecordStore, RecordStoreError, UploadOptions,
};
use crate::workflows::careers::{
    CareersService, ExportOptions, IntakeSession, NotificationTemplate, SubmissionPipeline,
};

pub(super) fn submitted_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn template() -> NotificationTemplate {
    NotificationTemplate {
        service_id: "service_test".to_string(),
        template_id: "template_test".to_string(),
        public_key: "public-key".to_string(),
        recipient: "careers@simulistic.test".to_string(),
    }
}

pub(super) fn resume() -> ResumeUpload {
    ResumeUpload::new("cv.pdf", b"%PDF-1.7 resume".to_vec()).with_content_type("application/pdf")
}

/// Session in `FormEntry` for Jane Doe with every field filled and both consents given.
pub(super) fn filled_session() -> IntakeSession {
    let mut session = IntakeSession::new();
    session.select_role(JobRole::CfdEngineer).expect("select role");
    session.set_name("Jane Doe").expect("name");
    session.set_gender(Gender::Female).expect("gender");
    session
        .set_employment_type(EmploymentType::FullTime)
        .expect("employment type");
    session.set_source(ReferralSource::LinkedIn).expect("source");
    session.attach_resume(resume()).expect("resume");
    session.set_consent(Consent::Contact, true).expect("consent");
    session.set_consent(Consent::RoleMatch, true).expect("consent");
    session
}

pub(super) fn record(id: &str, name: &str, date: (i32, u32, u32)) -> ApplicationRecord {
    let (year, month, day) = date;
    NewApplicationRecord {
        role: JobRole::DesignEngineer,
        name: name.to_string(),
        gender: Gender::Other,
        employment_type: EmploymentType::PartTime,
        source: ReferralSource::Friends,
        resume_path: ResumePath(format!("{id}-resume.pdf")),
        application_date: Utc
            .with_ymd_and_hms(year, month, day, 10, 0, 0)
            .single()
            .expect("valid date"),
    }
    .with_id(ApplicationId(id.to_string()))
}

/// Shared, ordered log of external calls across all fakes.
#[derive(Debug, Default, Clone)]
pub(super) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub(super) fn push(&self, call: impl Into<String>) {
        self.0.lock().expect("call log poisoned").push(call.into());
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.0.lock().expect("call log poisoned").clone()
    }
}

#[derive(Debug, Default, Clone)]
pub(super) struct TrackingRecordStore {
    pub(super) inner: InMemoryRecordStore,
    pub(super) log: CallLog,
    pub(super) fail_insert: bool,
    pub(super) fail_list: bool,
}

#[async_trait]
impl RecordStore for TrackingRecordStore {
    async fn insert(
        &self,
        record: NewApplicationRecord,
    ) -> Result<ApplicationRecord, RecordStoreError> {
        self.log.push(format!("insert:{}", record.resume_path));
        if self.fail_insert {
            return Err(RecordStoreError::Rejected {
                status: 500,
                message: "insert refused".to_string(),
            });
        }
        self.inner.insert(record).await
    }

    async fn list_all(&self, order: ListOrder) -> Result<Vec<ApplicationRecord>, RecordStoreError> {
        self.log.push("list");
        if self.fail_list {
            return Err(RecordStoreError::Unavailable("database offline".to_string()));
        }
        self.inner.list_all(order).await
    }
}

#[derive(Debug, Default, Clone)]
pub(super) struct TrackingBlobStore {
    pub(super) inner: InMemoryBlobStore,
    pub(super) log: CallLog,
    pub(super) fail_upload: bool,
    pub(super) uploads: Arc<Mutex<Vec<UploadOptions>>>,
}

#[async_trait]
impl BlobStore for TrackingBlobStore {
    async fn upload(
        &self,
        path: &ResumePath,
        blob: Blob,
        options: UploadOptions,
    ) -> Result<(), BlobStoreError> {
        self.log.push(format!("upload:{path}"));
        self.uploads
            .lock()
            .expect("uploads poisoned")
            .push(options.clone());
        if self.fail_upload {
            return Err(BlobStoreError::Unavailable("bucket offline".to_string()));
        }
        self.inner.upload(path, blob, options).await
    }

    async fn download(&self, path: &ResumePath) -> Result<Blob, BlobStoreError> {
        self.log.push(format!("download:{path}"));
        self.inner.download(path).await
    }
}

#[derive(Debug, Default, Clone)]
pub(super) struct TrackingNotifier {
    pub(super) log: CallLog,
    pub(super) fail: bool,
    pub(super) sent: Arc<Mutex<Vec<NotificationRequest>>>,
}

impl TrackingNotifier {
    pub(super) fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().expect("notifier poisoned").clone()
    }
}

#[async_trait]
impl NotificationSender for TrackingNotifier {
    async fn send(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        self.log.push("notify");
        self.sent
            .lock()
            .expect("notifier poisoned")
            .push(request);
        if self.fail {
            return Err(NotifyError::Transport("smtp relay down".to_string()));
        }
        Ok(())
    }
}

/// Fakes wired to one shared call log.
pub(super) struct Backends {
    pub(super) records: Arc<TrackingRecordStore>,
    pub(super) blobs: Arc<TrackingBlobStore>,
    pub(super) notifier: Arc<TrackingNotifier>,
    pub(super) log: CallLog,
}

#[derive(Debug, Default, Clone, Copy)]
pub(super) struct Failures {
    pub(super) upload: bool,
    pub(super) insert: bool,
    pub(super) list: bool,
    pub(super) notify: bool,
}

pub(super) fn backends(failures: Failures) -> Backends {
    backends_with_records(failures, Vec::new())
}

pub(super) fn backends_with_records(
    failures: Failures,
    records: Vec<ApplicationRecord>,
) -> Backends {
    let log = CallLog::default();
    Backends {
        records: Arc::new(TrackingRecordStore {
            inner: InMemoryRecordStore::with_records(records),
            log: log.clone(),
            fail_insert: failures.insert,
            fail_list: failures.list,
        }),
        blobs: Arc::new(TrackingBlobStore {
            log: log.clone(),
            fail_upload: failures.upload,
            ..TrackingBlobStore::default()
        }),
        notifier: Arc::new(TrackingNotifier {
            log: log.clone(),
            fail: failures.notify,
            ..TrackingNotifier::default()
        }),
        log,
    }
}

pub(super) type TestPipeline =
    SubmissionPipeline<TrackingRecordStore, TrackingBlobStore, TrackingNotifier>;

pub(super) type TestService =
    CareersService<TrackingRecordStore, TrackingBlobStore, TrackingNotifier>;

impl Backends {
    pub(super) fn pipeline(&self) -> TestPipeline {
        SubmissionPipeline::new(
            self.records.clone(),
            self.blobs.clone(),
            self.notifier.clone(),
            template(),
        )
        .with_clock(submitted_at)
    }

    pub(super) fn service(&self) -> TestService {
        CareersService::from_pipeline(self.pipeline(), ExportOptions::default())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
