use std::sync::Arc;

use tracing::{debug, error};

use super::domain::{ApplicationRecord, ResumePath};
use super::export::{ApplicationSheet, ExportArtifact, ExportError, ExportFormat, ExportOptions};
use super::gateways::{BlobStore, BlobStoreError, ListOrder, RecordStore};

/// What the console currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleView {
    Loading,
    Ready(Vec<ApplicationRecord>),
}

/// Résumé materialized for a local download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeDownload {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("failed to download resume '{path}': {source}")]
    Download {
        path: String,
        #[source]
        source: BlobStoreError,
    },
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Every application, newest first. A failed fetch is logged and yields an empty list.
pub async fn fetch_applications<R>(records: &R) -> Vec<ApplicationRecord>
where
    R: RecordStore + ?Sized,
{
    match records.list_all(ListOrder::ApplicationDateDesc).await {
        Ok(records) => {
            debug!(count = records.len(), "applications loaded");
            records
        }
        Err(err) => {
            error!(error = %err, "error fetching applications");
            Vec::new()
        }
    }
}

/// Admin view over stored applications: list, download, export.
pub struct ReviewConsole<R, B> {
    records: Arc<R>,
    blobs: Arc<B>,
    export_options: ExportOptions,
    view: ConsoleView,
}

impl<R, B> ReviewConsole<R, B>
where
    R: RecordStore + 'static,
    B: BlobStore + 'static,
{
    pub fn new(records: Arc<R>, blobs: Arc<B>, export_options: ExportOptions) -> Self {
        Self {
            records,
            blobs,
            export_options,
            view: ConsoleView::Loading,
        }
    }

    pub fn view(&self) -> &ConsoleView {
        &self.view
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.view, ConsoleView::Loading)
    }

    /// Loaded rows, newest first. Empty while loading.
    pub fn applications(&self) -> &[ApplicationRecord] {
        match &self.view {
            ConsoleView::Ready(records) => records,
            ConsoleView::Loading => &[],
        }
    }

    /// Reloads every application, newest first. A failed fetch leaves an empty list.
    pub async fn refresh(&mut self) -> &[ApplicationRecord] {
        self.view = ConsoleView::Loading;
        let records = fetch_applications(self.records.as_ref()).await;
        self.load(records)
    }

    /// Replaces the view with rows fetched elsewhere.
    pub fn load(&mut self, records: Vec<ApplicationRecord>) -> &[ApplicationRecord] {
        self.view = ConsoleView::Ready(records);
        self.applications()
    }

    pub async fn download(&self, path: &ResumePath) -> Result<ResumeDownload, ReviewError> {
        let blob = self.blobs.download(path).await.map_err(|source| {
            error!(resume_path = %path, error = %source, "error downloading resume");
            ReviewError::Download {
                path: path.to_string(),
                source,
            }
        })?;

        Ok(ResumeDownload {
            file_name: path.download_name().to_string(),
            content_type: blob
                .content_type
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string()),
            content: blob.content,
        })
    }

    /// Builds the export from the rows already loaded; never refetches.
    pub fn export(&self, format: ExportFormat) -> Result<ExportArtifact, ReviewError> {
        let sheet = ApplicationSheet::from_records(self.applications(), &self.export_options)?;
        Ok(sheet.render(format)?)
    }
}
