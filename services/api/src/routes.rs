use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use simulistic_careers::workflows::careers::{
    careers_router, AdminAccess, BlobStore, CareersService, NotificationSender, RecordStore,
};
use std::sync::Arc;

pub(crate) fn with_careers_routes<R, B, N>(
    service: Arc<CareersService<R, B, N>>,
    access: AdminAccess,
) -> axum::Router
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
    N: NotificationSender + 'static,
{
    careers_router(service, access)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use simulistic_careers::workflows::careers::clients::{
        InMemoryBlobStore, InMemoryRecordStore, RecordingNotifier,
    };
    use simulistic_careers::workflows::careers::{ExportOptions, NotificationTemplate};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(readiness: Arc<AtomicBool>) -> axum::Router {
        let service = Arc::new(CareersService::new(
            Arc::new(InMemoryRecordStore::default()),
            Arc::new(InMemoryBlobStore::default()),
            Arc::new(RecordingNotifier::default()),
            NotificationTemplate {
                service_id: "service".to_string(),
                template_id: "template".to_string(),
                public_key: "key".to_string(),
                recipient: "careers@example.com".to_string(),
            },
            ExportOptions::default(),
        ));
        let state = AppState {
            readiness,
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_careers_routes(service, AdminAccess::new(Some("token".to_string())))
            .layer(Extension(state))
    }

    async fn get(app: axum::Router, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
        .status()
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let readiness = Arc::new(AtomicBool::new(false));
        assert_eq!(
            get(app(readiness.clone()), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        readiness.store(true, Ordering::Release);
        assert_eq!(get(app(readiness), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn probes_and_careers_routes_share_one_router() {
        let readiness = Arc::new(AtomicBool::new(true));
        assert_eq!(get(app(readiness.clone()), "/health").await, StatusCode::OK);
        assert_eq!(get(app(readiness.clone()), "/metrics").await, StatusCode::OK);
        assert_eq!(
            get(app(readiness.clone()), "/api/v1/careers/roles").await,
            StatusCode::OK
        );
        assert_eq!(
            get(app(readiness), "/api/v1/admin/applications").await,
            StatusCode::UNAUTHORIZED
        );
    }
}
