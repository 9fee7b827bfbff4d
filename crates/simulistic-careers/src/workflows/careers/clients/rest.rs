use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use tracing::debug;

use crate::workflows::careers::domain::{ApplicationRecord, NewApplicationRecord, ResumePath};
use crate::workflows::careers::gateways::{
    Blob, BlobStore, BlobStoreError, ListOrder, RecordStore, RecordStoreError, UploadOptions,
};

/// Connection details shared by the hosted record and blob services.
#[derive(Clone)]
pub struct HostedBackend {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for HostedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedBackend")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid backend url '{url}': {reason}")]
pub struct BackendUrlError {
    pub url: String,
    pub reason: String,
}

impl HostedBackend {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, BackendUrlError> {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, BackendUrlError> {
        let base_url = Url::parse(base_url).map_err(|err| BackendUrlError {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BackendUrlError {
                url: base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint<'a, I>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }
}

async fn error_message(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|err| format!("unreadable error body: {err}"));
    (status, message)
}

/// Record store reached through a PostgREST style endpoint.
#[derive(Debug, Clone)]
pub struct RestRecordStore {
    backend: HostedBackend,
    table: String,
}

impl RestRecordStore {
    pub fn new(backend: HostedBackend, table: impl Into<String>) -> Self {
        Self {
            backend,
            table: table.into(),
        }
    }

    fn table_url(&self) -> Url {
        self.backend.endpoint(["rest", "v1", self.table.as_str()])
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn insert(
        &self,
        record: NewApplicationRecord,
    ) -> Result<ApplicationRecord, RecordStoreError> {
        let request = self
            .backend
            .client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&[record]);

        let response = self
            .backend
            .authorized(request)
            .send()
            .await
            .map_err(|err| RecordStoreError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = error_message(response).await;
            return Err(RecordStoreError::Rejected { status, message });
        }

        let mut rows: Vec<ApplicationRecord> = response
            .json()
            .await
            .map_err(|err| RecordStoreError::Decode(err.to_string()))?;
        rows.pop()
            .ok_or_else(|| RecordStoreError::Decode("insert returned no rows".to_string()))
    }

    async fn list_all(&self, order: ListOrder) -> Result<Vec<ApplicationRecord>, RecordStoreError> {
        let order = match order {
            ListOrder::ApplicationDateDesc => "application_date.desc",
        };
        let request = self
            .backend
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", order)]);

        let response = self
            .backend
            .authorized(request)
            .send()
            .await
            .map_err(|err| RecordStoreError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = error_message(response).await;
            return Err(RecordStoreError::Rejected { status, message });
        }

        let rows: Vec<ApplicationRecord> = response
            .json()
            .await
            .map_err(|err| RecordStoreError::Decode(err.to_string()))?;
        debug!(count = rows.len(), table = %self.table, "listed applications");
        Ok(rows)
    }
}

/// Object storage bucket holding uploaded résumés.
#[derive(Debug, Clone)]
pub struct RestBlobStore {
    backend: HostedBackend,
    bucket: String,
}

impl RestBlobStore {
    pub fn new(backend: HostedBackend, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
        }
    }

    fn object_url(&self, path: &ResumePath) -> Url {
        let segments = ["storage", "v1", "object", self.bucket.as_str()]
            .into_iter()
            .chain(path.as_str().split('/'));
        self.backend.endpoint(segments)
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(
        &self,
        path: &ResumePath,
        blob: Blob,
        options: UploadOptions,
    ) -> Result<(), BlobStoreError> {
        let mut headers = HeaderMap::new();
        let cache_control = HeaderValue::from_str(&format!("max-age={}", options.cache_control))
            .map_err(|err| BlobStoreError::Unavailable(err.to_string()))?;
        headers.insert(CACHE_CONTROL, cache_control);
        headers.insert(
            "x-upsert",
            HeaderValue::from_static(if options.upsert { "true" } else { "false" }),
        );
        let content_type = blob
            .content_type
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        let content_type = HeaderValue::from_str(&content_type)
            .map_err(|err| BlobStoreError::Unavailable(err.to_string()))?;
        headers.insert(CONTENT_TYPE, content_type);

        let request = self
            .backend
            .client
            .post(self.object_url(path))
            .headers(headers)
            .body(blob.content);

        let response = self
            .backend
            .authorized(request)
            .send()
            .await
            .map_err(|err| BlobStoreError::Unavailable(err.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(BlobStoreError::AlreadyExists(path.to_string())),
            _ => {
                let (status, message) = error_message(response).await;
                if message.contains("Duplicate") || message.contains("already exists") {
                    return Err(BlobStoreError::AlreadyExists(path.to_string()));
                }
                Err(BlobStoreError::Rejected { status, message })
            }
        }
    }

    async fn download(&self, path: &ResumePath) -> Result<Blob, BlobStoreError> {
        let request = self.backend.client.get(self.object_url(path));
        let response = self
            .backend
            .authorized(request)
            .send()
            .await
            .map_err(|err| BlobStoreError::Unavailable(err.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let content = response
                    .bytes()
                    .await
                    .map_err(|err| BlobStoreError::Unavailable(err.to_string()))?;
                Ok(Blob {
                    content_type,
                    content: content.to_vec(),
                })
            }
            StatusCode::NOT_FOUND => Err(BlobStoreError::NotFound(path.to_string())),
            _ => {
                let (status, message) = error_message(response).await;
                Err(BlobStoreError::Rejected { status, message })
            }
        }
    }
}
