//! Careers page workflows: the job application intake flow and the admin review console.

pub mod access;
pub mod clients;
pub mod contact;
pub mod domain;
pub mod export;
pub mod gateways;
pub mod intake;
pub mod pipeline;
pub mod review;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::{AccessDenied, AdminAccess};
pub use contact::{ContactError, ContactMessage, ContactRelay};
pub use domain::{
    ApplicationDraft, ApplicationId, ApplicationRecord, Consent, ConsentFlags, EmploymentType,
    Gender, JobRole, NewApplicationRecord, ReferralSource, ResumePath, ResumeUpload,
    RESUME_EXTENSIONS,
};
pub use export::{ApplicationSheet, ExportArtifact, ExportError, ExportFormat, ExportOptions};
pub use gateways::{
    Blob, BlobStore, BlobStoreError, ListOrder, NotificationRequest, NotificationSender,
    NotifyError, RecordStore, RecordStoreError, UploadOptions,
};
pub use intake::{FormFields, IntakeError, IntakeSession, IntakeState, SubmitError};
pub use pipeline::{
    NotificationOutcome, NotificationTemplate, SubmissionError, SubmissionPipeline,
    SubmissionReceipt,
};
pub use review::{ConsoleView, ResumeDownload, ReviewConsole, ReviewError};
pub use router::careers_router;
pub use service::CareersService;
