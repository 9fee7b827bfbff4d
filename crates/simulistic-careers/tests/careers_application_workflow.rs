//! End-to-end scenarios for the careers intake flow and the review console.
//!
//! Everything goes through the public service facade and HTTP router backed by the in-memory
//! clients, so the scenarios match what the API binary serves without a hosted backend.

mod common {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    use simulistic_careers::workflows::careers::clients::{
        InMemoryBlobStore, InMemoryRecordStore, RecordingNotifier,
    };
    use simulistic_careers::workflows::careers::{
        ApplicationRecord, CareersService, ExportOptions, ListOrder, NewApplicationRecord,
        NotificationTemplate, RecordStore, RecordStoreError, SubmissionPipeline,
    };

    pub(super) fn template() -> NotificationTemplate {
        NotificationTemplate {
            service_id: "service_careers".to_string(),
            template_id: "template_application".to_string(),
            public_key: "public-key".to_string(),
            recipient: "hr@simulistic.example".to_string(),
        }
    }

    /// Record store that refuses inserts while `offline` is set.
    #[derive(Default, Clone)]
    pub(super) struct FlakyRecords {
        pub(super) inner: InMemoryRecordStore,
        pub(super) offline: Arc<Mutex<bool>>,
    }

    impl FlakyRecords {
        pub(super) fn set_offline(&self, offline: bool) {
            *self.offline.lock().expect("flag poisoned") = offline;
        }
    }

    #[async_trait]
    impl RecordStore for FlakyRecords {
        async fn insert(
            &self,
            record: NewApplicationRecord,
        ) -> Result<ApplicationRecord, RecordStoreError> {
            if *self.offline.lock().expect("flag poisoned") {
                return Err(RecordStoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.insert(record).await
        }

        async fn list_all(
            &self,
            order: ListOrder,
        ) -> Result<Vec<ApplicationRecord>, RecordStoreError> {
            self.inner.list_all(order).await
        }
    }

    pub(super) type Service = CareersService<FlakyRecords, InMemoryBlobStore, RecordingNotifier>;

    pub(super) struct Harness {
        pub(super) records: Arc<FlakyRecords>,
        pub(super) blobs: Arc<InMemoryBlobStore>,
        pub(super) notifier: Arc<RecordingNotifier>,
        pub(super) service: Arc<Service>,
    }

    pub(super) fn harness() -> Harness {
        let records = Arc::new(FlakyRecords::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let start = Utc
            .with_ymd_and_hms(2024, 3, 15, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        let ticks = Arc::new(AtomicI64::new(0));
        // One second per submission keeps resume paths and list order deterministic.
        let pipeline = SubmissionPipeline::new(
            records.clone(),
            blobs.clone(),
            notifier.clone(),
            template(),
        )
        .with_clock(move || start + Duration::seconds(ticks.fetch_add(1, Ordering::Relaxed)));
        let service = Arc::new(CareersService::from_pipeline(
            pipeline,
            ExportOptions::default(),
        ));
        Harness {
            records,
            blobs,
            notifier,
            service,
        }
    }
}

mod intake {
    use super::common::*;
    use simulistic_careers::workflows::careers::{
        Consent, EmploymentType, Gender, IntakeSession, IntakeState, JobRole, ReferralSource,
        ResumeUpload, SubmitError,
    };

    fn jane_doe() -> IntakeSession {
        let mut session = IntakeSession::new();
        session.select_role(JobRole::CfdEngineer).expect("role");
        session.set_name("Jane Doe").expect("name");
        session.set_gender(Gender::Female).expect("gender");
        session
            .set_employment_type(EmploymentType::FullTime)
            .expect("employment type");
        session.set_source(ReferralSource::LinkedIn).expect("source");
        session
            .attach_resume(ResumeUpload::new("cv.pdf", b"%PDF-1.4".to_vec()))
            .expect("resume");
        session.set_consent(Consent::Contact, true).expect("consent");
        session
    }

    #[tokio::test]
    async fn jane_doe_applies_for_the_cfd_role() {
        let harness = harness();
        let mut session = jane_doe();
        assert!(!session.submit_enabled(), "role match consent still missing");
        session
            .set_consent(Consent::RoleMatch, true)
            .expect("consent");
        assert!(session.submit_enabled());

        let receipt = session
            .submit(harness.service.pipeline())
            .await
            .expect("submission succeeds");

        assert!(matches!(session.state(), IntakeState::Success(_)));
        let stored = harness.records.inner.records();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], receipt.record);
        assert_eq!(stored[0].role, JobRole::CfdEngineer);
        assert_eq!(stored[0].gender, Gender::Female);
        assert!(stored[0].resume_path.as_str().ends_with("-cv.pdf"));
        assert!(harness.blobs.contains(&stored[0].resume_path));
        assert_eq!(harness.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn retry_after_an_outage_reuses_the_entered_data() {
        let harness = harness();
        let mut session = jane_doe();
        session
            .set_consent(Consent::RoleMatch, true)
            .expect("consent");

        harness.records.set_offline(true);
        let err = session
            .submit(harness.service.pipeline())
            .await
            .expect_err("insert refused");
        assert!(matches!(err, SubmitError::Submission(_)));
        assert!(matches!(session.state(), IntakeState::Failure { .. }));
        assert_eq!(harness.blobs.paths().len(), 1, "orphaned resume stays stored");
        assert!(harness.notifier.sent().is_empty());

        harness.records.set_offline(false);
        session.acknowledge().expect("dismiss error");
        session
            .submit(harness.service.pipeline())
            .await
            .expect("retry succeeds");
        assert_eq!(harness.records.inner.records().len(), 1);
    }
}

mod review {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use simulistic_careers::workflows::careers::{careers_router, AdminAccess};
    use tower::ServiceExt;

    const BOUNDARY: &str = "integration-boundary";

    fn submission(name: &str, role: &str, file_name: &str) -> Request<Body> {
        let mut body = String::new();
        for (field, value) in [
            ("role", role),
            ("name", name),
            ("gender", "male"),
            ("employmentType", "parttime"),
            ("source", "friends"),
            ("contactConsent", "true"),
            ("roleMatchConsent", "true"),
        ] {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n--{BOUNDARY}--\r\n"
        ));
        Request::builder()
            .method("POST")
            .uri("/api/v1/careers/applications")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn admin(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer letmein")
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn submitted_applications_reach_the_review_console() {
        let harness = harness();
        let app = careers_router(
            harness.service.clone(),
            AdminAccess::new(Some("letmein".to_string())),
        );

        for (name, role, file) in [
            ("Omar Haddad", "FEA Engineer", "omar.pdf"),
            ("Lena Fischer", "Design Engineer", "lena.doc"),
        ] {
            let response = app
                .clone()
                .oneshot(submission(name, role, file))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let listed = app
            .clone()
            .oneshot(admin("/api/v1/admin/applications"))
            .await
            .expect("response");
        assert_eq!(listed.status(), StatusCode::OK);
        let body = json_body(listed).await;
        assert_eq!(body["count"], 2);
        let resume_path = body["applications"][0]["resume_path"]
            .as_str()
            .expect("resume path")
            .to_string();

        let download = app
            .clone()
            .oneshot(admin(&format!(
                "/api/v1/admin/applications/resume?path={resume_path}"
            )))
            .await
            .expect("response");
        assert_eq!(download.status(), StatusCode::OK);
        let disposition = download
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .expect("content disposition")
            .to_string();
        assert!(disposition.contains(&resume_path));

        let export = app
            .oneshot(admin("/api/v1/admin/applications/export"))
            .await
            .expect("response");
        assert_eq!(export.status(), StatusCode::OK);
        assert_eq!(
            export
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok()),
            Some("attachment; filename=\"applications.xlsx\"")
        );
        let bytes = to_bytes(export.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        assert!(bytes.starts_with(b"PK"));
    }
}
