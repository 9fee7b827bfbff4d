use clap::Args;
use simulistic_careers::error::AppError;
use simulistic_careers::workflows::careers::clients::{
    InMemoryBlobStore, InMemoryRecordStore, RecordingNotifier,
};
use simulistic_careers::workflows::careers::{
    CareersService, Consent, EmploymentType, ExportFormat, ExportOptions, Gender, IntakeError,
    IntakeSession, JobRole, NotificationOutcome, NotificationTemplate, ReferralSource,
    ResumeUpload, SubmitError,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Export format written at the end of the demo (xlsx or csv).
    #[arg(long, default_value = "xlsx", value_parser = parse_format)]
    pub(crate) format: ExportFormat,
    /// Where to write the export. Defaults to the format's file name in the working directory.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Résumé file attached to every sample application instead of a generated PDF.
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    raw.parse::<ExportFormat>().map_err(|err| err.to_string())
}

struct SampleApplicant {
    role: JobRole,
    name: &'static str,
    gender: Gender,
    employment_type: EmploymentType,
    source: ReferralSource,
    file_name: &'static str,
}

const APPLICANTS: &[SampleApplicant] = &[
    SampleApplicant {
        role: JobRole::CfdEngineer,
        name: "Jane Doe",
        gender: Gender::Female,
        employment_type: EmploymentType::FullTime,
        source: ReferralSource::LinkedIn,
        file_name: "cv.pdf",
    },
    SampleApplicant {
        role: JobRole::FeaEngineer,
        name: "Ravi Menon",
        gender: Gender::Male,
        employment_type: EmploymentType::PartTime,
        source: ReferralSource::JobBoards,
        file_name: "ravi-menon.docx",
    },
    SampleApplicant {
        role: JobRole::DesignEngineer,
        name: "Alex Kim",
        gender: Gender::Other,
        employment_type: EmploymentType::FullTime,
        source: ReferralSource::CompanyWebsite,
        file_name: "alex_kim_resume.pdf",
    },
];

fn demo_template() -> NotificationTemplate {
    NotificationTemplate {
        service_id: "demo_service".to_string(),
        template_id: "demo_template".to_string(),
        public_key: "demo-public-key".to_string(),
        recipient: "careers@simulistic.example".to_string(),
    }
}

/// Generated PDF unless a file was given. A shared file is renamed per applicant so uploads made
/// within the same millisecond do not collide.
fn load_resume(
    path: Option<&PathBuf>,
    applicant: &SampleApplicant,
) -> Result<ResumeUpload, AppError> {
    let Some(path) = path else {
        return Ok(ResumeUpload::new(
            applicant.file_name,
            format!("%PDF-1.7\n% sample resume for {}\n", applicant.name).into_bytes(),
        ));
    };

    let content = std::fs::read(path)?;
    let original = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| applicant.file_name.to_string());
    let slug = applicant.name.to_ascii_lowercase().replace(' ', "-");
    let upload = ResumeUpload::new(format!("{slug}-{original}"), content);
    Ok(match mime_guess::from_path(path).first_raw() {
        Some(content_type) => upload.with_content_type(content_type),
        None => upload,
    })
}

fn fill_session(
    applicant: &SampleApplicant,
    resume: ResumeUpload,
) -> Result<IntakeSession, IntakeError> {
    let mut session = IntakeSession::new();
    session.select_role(applicant.role)?;
    session.set_name(applicant.name)?;
    session.set_gender(applicant.gender)?;
    session.set_employment_type(applicant.employment_type)?;
    session.set_source(applicant.source)?;
    session.attach_resume(resume)?;
    session.set_consent(Consent::Contact, true)?;
    Ok(session)
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        format,
        output,
        resume,
    } = args;

    let blobs = Arc::new(InMemoryBlobStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = CareersService::new(
        Arc::new(InMemoryRecordStore::default()),
        blobs.clone(),
        notifier.clone(),
        demo_template(),
        ExportOptions::default(),
    );

    println!("Careers intake demo (in-memory backends)");
    for applicant in APPLICANTS {
        let upload = load_resume(resume.as_ref(), applicant)?;
        let mut session = fill_session(applicant, upload).map_err(SubmitError::from)?;

        println!(
            "- {} applying for {} [{}]",
            applicant.name,
            applicant.role.label(),
            session.state().label()
        );
        if !session.submit_enabled() {
            println!("  Submit disabled until both consent statements are accepted");
        }
        session
            .set_consent(Consent::RoleMatch, true)
            .map_err(SubmitError::from)?;

        let receipt = session.submit(service.pipeline()).await?;
        let notification = match &receipt.notification {
            NotificationOutcome::Delivered => "notification sent".to_string(),
            NotificationOutcome::Failed(detail) => format!("notification failed: {detail}"),
        };
        println!(
            "  Stored {} with resume {} ({notification}) [{}]",
            receipt.record.id,
            receipt.record.resume_path,
            session.state().label()
        );
        session.acknowledge().map_err(SubmitError::from)?;
    }

    println!("\nReview console");
    let mut console = service.console().write().await;
    let applications = console.refresh().await.to_vec();
    println!("{} applications, newest first:", applications.len());
    for record in &applications {
        println!(
            "  - {} | {} | {} | {} | {} | {}",
            record.name,
            record.role.label(),
            record.gender,
            record.employment_type,
            record.source,
            record.application_date.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    if let Some(first) = applications.first() {
        let download = console.download(&first.resume_path).await?;
        println!(
            "Downloaded {} ({} bytes, {})",
            download.file_name,
            download.content.len(),
            download.content_type
        );
    }

    let artifact = console.export(format)?;
    let path = output.unwrap_or_else(|| PathBuf::from(artifact.file_name));
    std::fs::write(&path, &artifact.content)?;
    println!(
        "Exported {} rows to {} ({} bytes)",
        applications.len(),
        path.display(),
        artifact.content.len()
    );

    println!(
        "Notifications captured: {} | resumes stored: {}",
        notifier.sent().len(),
        blobs.paths().len()
    );

    Ok(())
}
