use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::access::{require_admin, AdminAccess};
use super::contact::{ContactError, ContactMessage};
use super::domain::{
    Consent, EmploymentType, Gender, JobRole, ReferralSource, ResumePath, ResumeUpload,
    UnknownOption, RESUME_EXTENSIONS,
};
use super::export::ExportFormat;
use super::gateways::{BlobStore, NotificationSender, RecordStore};
use super::intake::{IntakeError, IntakeSession, SubmitError};
use super::review::ReviewError;
use super::service::CareersService;

/// Upper bound for a multipart application, résumé included.
pub const MAX_APPLICATION_BYTES: usize = 10 * 1024 * 1024;

const SUBMISSION_FAILED: &str = "Error submitting application. Please try again.";

/// Router exposing the public intake endpoints and the guarded review console.
pub fn careers_router<R, B, N>(
    service: Arc<CareersService<R, B, N>>,
    access: AdminAccess,
) -> Router
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
    N: NotificationSender + 'static,
{
    let admin = Router::new()
        .route("/api/v1/admin/applications", get(list_handler::<R, B, N>))
        .route(
            "/api/v1/admin/applications/resume",
            get(download_handler::<R, B, N>),
        )
        .route(
            "/api/v1/admin/applications/export",
            get(export_handler::<R, B, N>),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::new(access),
            require_admin,
        ));

    Router::new()
        .route("/api/v1/careers/roles", get(form_options_handler))
        .route(
            "/api/v1/careers/applications",
            post(submit_handler::<R, B, N>).layer(DefaultBodyLimit::max(MAX_APPLICATION_BYTES)),
        )
        .route("/api/v1/contact", post(contact_handler::<R, B, N>))
        .merge(admin)
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub(crate) async fn form_options_handler() -> Json<serde_json::Value> {
    fn options<T: Copy>(
        all: &[T],
        value: fn(T) -> &'static str,
        label: fn(T) -> &'static str,
    ) -> Vec<serde_json::Value> {
        all.iter()
            .map(|option| json!({ "value": value(*option), "label": label(*option) }))
            .collect()
    }

    Json(json!({
        "roles": options(JobRole::ALL, JobRole::value, JobRole::label),
        "genders": options(Gender::ALL, Gender::value, Gender::label),
        "employment_types": options(
            EmploymentType::ALL,
            EmploymentType::value,
            EmploymentType::label
        ),
        "sources": options(
            ReferralSource::ALL,
            ReferralSource::value,
            ReferralSource::label
        ),
        "resume_extensions": RESUME_EXTENSIONS,
    }))
}

/// Raw multipart fields, gathered before replaying them through an [`IntakeSession`].
#[derive(Debug, Default)]
struct ApplicationForm {
    role: Option<String>,
    name: Option<String>,
    gender: Option<String>,
    employment_type: Option<String>,
    source: Option<String>,
    resume: Option<ResumeUpload>,
    contact_consent: bool,
    role_match_consent: bool,
}

#[derive(Debug, thiserror::Error)]
enum FormError {
    #[error("malformed multipart body: {0}")]
    Multipart(String),
    #[error(transparent)]
    Option(#[from] UnknownOption),
    #[error(transparent)]
    Intake(#[from] IntakeError),
}

fn checkbox(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "yes" | "1"
    )
}

async fn read_form(mut multipart: Multipart) -> Result<ApplicationForm, FormError> {
    let mut form = ApplicationForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| FormError::Multipart(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "resume" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let content = field
                .bytes()
                .await
                .map_err(|err| FormError::Multipart(err.to_string()))?;
            if file_name.is_empty() && content.is_empty() {
                continue;
            }
            let mut upload = ResumeUpload::new(file_name, content.to_vec());
            if let Some(content_type) = content_type {
                upload = upload.with_content_type(content_type);
            }
            form.resume = Some(upload);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| FormError::Multipart(err.to_string()))?;
        match name.as_str() {
            "role" => form.role = Some(value),
            "name" => form.name = Some(value),
            "gender" => form.gender = Some(value),
            "employmentType" | "employment_type" => form.employment_type = Some(value),
            "source" => form.source = Some(value),
            "contactConsent" | "contact_consent" => form.contact_consent = checkbox(&value),
            "roleMatchConsent" | "role_match_consent" => {
                form.role_match_consent = checkbox(&value)
            }
            other => warn!(field = other, "ignoring unknown application field"),
        }
    }
    Ok(form)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn session_from_form(form: ApplicationForm) -> Result<IntakeSession, FormError> {
    let mut session = IntakeSession::new();
    let role = non_blank(form.role).ok_or(IntakeError::NoRoleSelected)?;
    session.select_role(role.parse::<JobRole>()?)?;

    if let Some(name) = form.name {
        session.set_name(name)?;
    }
    if let Some(gender) = non_blank(form.gender) {
        session.set_gender(gender.parse()?)?;
    }
    if let Some(employment_type) = non_blank(form.employment_type) {
        session.set_employment_type(employment_type.parse()?)?;
    }
    if let Some(source) = non_blank(form.source) {
        session.set_source(source.parse()?)?;
    }
    if let Some(resume) = form.resume {
        session.attach_resume(resume)?;
    }
    session.set_consent(Consent::Contact, form.contact_consent)?;
    session.set_consent(Consent::RoleMatch, form.role_match_consent)?;
    Ok(session)
}

pub(crate) async fn submit_handler<R, B, N>(
    State(service): State<Arc<CareersService<R, B, N>>>,
    multipart: Multipart,
) -> Response
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
    N: NotificationSender + 'static,
{
    let mut session = match read_form(multipart).await.and_then(session_from_form) {
        Ok(session) => session,
        Err(FormError::Multipart(message)) => {
            return error_response(StatusCode::BAD_REQUEST, message)
        }
        Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    };

    match session.submit(service.pipeline()).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(json!({
                "state": session.state().label(),
                "record": receipt.record,
                "notification": receipt.notification,
            })),
        )
            .into_response(),
        Err(SubmitError::Intake(err)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        Err(SubmitError::Submission(_)) => {
            error_response(StatusCode::BAD_GATEWAY, SUBMISSION_FAILED)
        }
    }
}

pub(crate) async fn contact_handler<R, B, N>(
    State(service): State<Arc<CareersService<R, B, N>>>,
    Json(message): Json<ContactMessage>,
) -> Response
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
    N: NotificationSender + 'static,
{
    match service.contact().send(message).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(json!({ "status": "sent" }))).into_response(),
        Err(ContactError::Delivery(_)) => error_response(
            StatusCode::BAD_GATEWAY,
            "Failed to send message. Please try again.",
        ),
        Err(err) => error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    }
}

pub(crate) async fn list_handler<R, B, N>(
    State(service): State<Arc<CareersService<R, B, N>>>,
) -> Response
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
    N: NotificationSender + 'static,
{
    let applications = service.refresh_console().await;
    (
        StatusCode::OK,
        Json(json!({
            "count": applications.len(),
            "applications": applications,
        })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadQuery {
    path: String,
}

pub(crate) async fn download_handler<R, B, N>(
    State(service): State<Arc<CareersService<R, B, N>>>,
    Query(query): Query<DownloadQuery>,
) -> Response
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
    N: NotificationSender + 'static,
{
    let path = ResumePath(query.path);
    let console = service.console().read().await;
    match console.download(&path).await {
        Ok(download) => {
            let content_type = HeaderValue::from_str(&download.content_type)
                .unwrap_or(HeaderValue::from_static("application/octet-stream"));
            let disposition = attachment(&download.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                download.content,
            )
                .into_response()
        }
        Err(err @ ReviewError::Download { .. }) => {
            error_response(StatusCode::BAD_GATEWAY, format!("Failed to download resume: {err}"))
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportQuery {
    #[serde(default)]
    format: Option<String>,
}

pub(crate) async fn export_handler<R, B, N>(
    State(service): State<Arc<CareersService<R, B, N>>>,
    Query(query): Query<ExportQuery>,
) -> Response
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
    N: NotificationSender + 'static,
{
    let format = match query.format.as_deref().map(str::parse::<ExportFormat>) {
        None => ExportFormat::default(),
        Some(Ok(format)) => format,
        Some(Err(err)) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };

    let console = service.console().read().await;
    match console.export(format) {
        Ok(artifact) => (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(artifact.content_type),
                ),
                (header::CONTENT_DISPOSITION, attachment(artifact.file_name)),
            ],
            artifact.content,
        )
            .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn attachment(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c.is_control() || !c.is_ascii() { '_' } else { c })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or(HeaderValue::from_static("attachment"))
}
