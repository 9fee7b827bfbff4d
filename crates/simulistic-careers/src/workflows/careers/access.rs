use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

/// Capability check guarding the review console.
#[derive(Clone, Default)]
pub struct AdminAccess {
    token: Option<String>,
}

impl fmt::Debug for AdminAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAccess")
            .field("configured", &self.token.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("review console is disabled: no admin access token configured")]
    Disabled,
    #[error("missing bearer credentials")]
    MissingCredentials,
    #[error("invalid bearer credentials")]
    InvalidCredentials,
}

impl AccessDenied {
    pub const fn status(self) -> StatusCode {
        match self {
            AccessDenied::Disabled => StatusCode::FORBIDDEN,
            AccessDenied::MissingCredentials | AccessDenied::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
        }
    }
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        let mut response = (self.status(), body).into_response();
        if self.status() == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl AdminAccess {
    /// Blank tokens count as unconfigured.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|value| !value.trim().is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AccessDenied> {
        let expected = self.token.as_deref().ok_or(AccessDenied::Disabled)?;

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AccessDenied::MissingCredentials)?;

        if tokens_match(expected.as_bytes(), presented.as_bytes()) {
            Ok(())
        } else {
            Err(AccessDenied::InvalidCredentials)
        }
    }
}

// Compares every byte so timing does not reveal the matching prefix length.
fn tokens_match(expected: &[u8], presented: &[u8]) -> bool {
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .iter()
        .zip(presented)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Middleware rejecting requests without valid admin credentials.
pub async fn require_admin(
    State(access): State<Arc<AdminAccess>>,
    request: Request,
    next: Next,
) -> Response {
    match access.authorize(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(denied) => {
            warn!(path = %request.uri().path(), reason = %denied, "admin request rejected");
            denied.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
        );
        headers
    }

    #[test]
    fn unconfigured_token_disables_console() {
        let access = AdminAccess::new(Some("   ".to_string()));
        assert!(!access.is_enabled());
        assert_eq!(
            access.authorize(&bearer("anything")),
            Err(AccessDenied::Disabled)
        );
    }

    #[test]
    fn bearer_token_must_match() {
        let access = AdminAccess::new(Some("s3cret".to_string()));
        assert_eq!(access.authorize(&bearer("s3cret")), Ok(()));
        assert_eq!(
            access.authorize(&bearer("s3cres")),
            Err(AccessDenied::InvalidCredentials)
        );
        assert_eq!(
            access.authorize(&HeaderMap::new()),
            Err(AccessDenied::MissingCredentials)
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let access = AdminAccess::new(Some("s3cret".to_string()));
        let rendered = format!("{access:?}");
        assert!(!rendered.contains("s3cret"));
    }
}
