use std::sync::Arc;

use tokio::sync::RwLock;

use super::contact::ContactRelay;
use super::export::ExportOptions;
use super::gateways::{BlobStore, NotificationSender, RecordStore};
use super::pipeline::{NotificationTemplate, SubmissionPipeline};
use super::domain::ApplicationRecord;
use super::review::{fetch_applications, ReviewConsole};

/// Composition of the intake pipeline, contact relay, and review console around one set of
/// backend clients.
pub struct CareersService<R, B, N> {
    pipeline: SubmissionPipeline<R, B, N>,
    contact: ContactRelay<N>,
    console: RwLock<ReviewConsole<R, B>>,
}

impl<R, B, N> CareersService<R, B, N>
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
        export_options: ExportOptions,
    ) -> Self {
        let pipeline = SubmissionPipeline::new(records, blobs, notifier, template);
        Self::from_pipeline(pipeline, export_options)
    }

    pub fn from_pipeline(
        pipeline: SubmissionPipeline<R, B, N>,
        export_options: ExportOptions,
    ) -> Self {
        let contact = ContactRelay::new(pipeline.notifier().clone(), pipeline.template().clone());
        let console = ReviewConsole::new(
            pipeline.records().clone(),
            pipeline.blobs().clone(),
            export_options,
        );
        Self {
            pipeline,
            contact,
            console: RwLock::new(console),
        }
    }

    pub fn pipeline(&self) -> &SubmissionPipeline<R, B, N> {
        &self.pipeline
    }

    pub fn contact(&self) -> &ContactRelay<N> {
        &self.contact
    }

    /// The console's loaded list is only replaced by a refresh, under the write lock.
    pub fn console(&self) -> &RwLock<ReviewConsole<R, B>> {
        &self.console
    }

    /// Lists without holding the console lock; the write lock is taken only to swap the view.
    pub async fn refresh_console(&self) -> Vec<ApplicationRecord> {
        let records = fetch_applications(self.pipeline.records().as_ref()).await;
        self.console.write().await.load(records).to_vec()
    }
}
