//! Per-session state machine behind the job application form.
//!
//! `RoleSelection → FormEntry → Submitting → {Success, Failure}`. A session owns the transient
//! form state (role, fields, résumé, consent) and allows at most one submission in flight.

use super::domain::{
    ApplicationDraft, Consent, ConsentFlags, EmploymentType, Gender, JobRole, ReferralSource,
    ResumeUpload, RESUME_EXTENSIONS,
};
use super::gateways::{BlobStore, NotificationSender, RecordStore};
use super::pipeline::{SubmissionError, SubmissionPipeline, SubmissionReceipt};

/// Stage of the application form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeState {
    RoleSelection,
    FormEntry { role: JobRole },
    Submitting { role: JobRole },
    Success(Box<SubmissionReceipt>),
    Failure { role: JobRole, message: String },
}

impl IntakeState {
    pub const fn label(&self) -> &'static str {
        match self {
            IntakeState::RoleSelection => "role_selection",
            IntakeState::FormEntry { .. } => "form_entry",
            IntakeState::Submitting { .. } => "submitting",
            IntakeState::Success(_) => "success",
            IntakeState::Failure { .. } => "failure",
        }
    }
}

/// Fields captured while the form is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub gender: Option<Gender>,
    pub employment_type: Option<EmploymentType>,
    pub source: Option<ReferralSource>,
    pub resume: Option<ResumeUpload>,
}

impl FormFields {
    fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.gender.is_none() {
            Some("gender")
        } else if self.employment_type.is_none() {
            Some("employment type")
        } else if self.source.is_none() {
            Some("source")
        } else if self.resume.is_none() {
            Some("resume")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("no role has been selected")]
    NoRoleSelected,
    #[error("a role is already selected for this application")]
    RoleAlreadySelected,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("both consent statements must be accepted")]
    ConsentRequired,
    #[error("'{file_name}' is not an accepted resume format (accepted: {accepted})")]
    UnsupportedResume { file_name: String, accepted: String },
    #[error("an application is already being submitted")]
    AlreadySubmitting,
    #[error("cannot {action} while the form is in the {state} state")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Outcome of [`IntakeSession::submit`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// One applicant's pass through the form.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    state: IntakeState,
    fields: FormFields,
    consent: ConsentFlags,
}

impl Default for IntakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeSession {
    pub fn new() -> Self {
        Self {
            state: IntakeState::RoleSelection,
            fields: FormFields::default(),
            consent: ConsentFlags::default(),
        }
    }

    pub fn state(&self) -> &IntakeState {
        &self.state
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn consent(&self) -> ConsentFlags {
        self.consent
    }

    pub fn selected_role(&self) -> Option<JobRole> {
        match &self.state {
            IntakeState::FormEntry { role }
            | IntakeState::Submitting { role }
            | IntakeState::Failure { role, .. } => Some(*role),
            IntakeState::RoleSelection | IntakeState::Success(_) => None,
        }
    }

    pub fn select_role(&mut self, role: JobRole) -> Result<(), IntakeError> {
        match self.state {
            IntakeState::RoleSelection => {
                self.state = IntakeState::FormEntry { role };
                Ok(())
            }
            IntakeState::Success(_) => Err(self.invalid("select a role")),
            _ => Err(IntakeError::RoleAlreadySelected),
        }
    }

    /// Drops every transient value and returns to role selection.
    pub fn cancel(&mut self) -> Result<(), IntakeError> {
        if matches!(self.state, IntakeState::Submitting { .. }) {
            return Err(IntakeError::AlreadySubmitting);
        }
        self.reset();
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), IntakeError> {
        self.ensure_editable("edit the name")?;
        self.fields.name = name.into();
        Ok(())
    }

    pub fn set_gender(&mut self, gender: Gender) -> Result<(), IntakeError> {
        self.ensure_editable("edit the gender")?;
        self.fields.gender = Some(gender);
        Ok(())
    }

    pub fn set_employment_type(&mut self, employment_type: EmploymentType) -> Result<(), IntakeError> {
        self.ensure_editable("edit the employment type")?;
        self.fields.employment_type = Some(employment_type);
        Ok(())
    }

    pub fn set_source(&mut self, source: ReferralSource) -> Result<(), IntakeError> {
        self.ensure_editable("edit the source")?;
        self.fields.source = Some(source);
        Ok(())
    }

    /// Attaches a résumé. Only the accepted document extensions get through.
    pub fn attach_resume(&mut self, resume: ResumeUpload) -> Result<(), IntakeError> {
        self.ensure_editable("attach a resume")?;
        if !resume.has_accepted_extension() {
            return Err(IntakeError::UnsupportedResume {
                file_name: resume.file_name,
                accepted: RESUME_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        self.fields.resume = Some(resume);
        Ok(())
    }

    pub fn set_consent(&mut self, consent: Consent, accepted: bool) -> Result<(), IntakeError> {
        self.ensure_editable("change consent")?;
        match consent {
            Consent::Contact => self.consent.contact = accepted,
            Consent::RoleMatch => self.consent.role_match = accepted,
        }
        Ok(())
    }

    /// Whether the submit control is enabled.
    pub fn submit_enabled(&self) -> bool {
        self.validate().is_ok()
    }

    /// Moves to `Submitting` and hands out the draft for the pipeline.
    pub fn begin_submission(&mut self) -> Result<ApplicationDraft, IntakeError> {
        let draft = self.validate()?;
        self.state = IntakeState::Submitting { role: draft.role };
        Ok(draft)
    }

    /// Settles an in-flight submission. Success clears the form; failure keeps it for a retry.
    pub fn complete_submission(
        &mut self,
        result: Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<Result<SubmissionReceipt, SubmissionError>, IntakeError> {
        let role = match self.state {
            IntakeState::Submitting { role } => role,
            _ => return Err(self.invalid("complete a submission")),
        };

        match &result {
            Ok(receipt) => {
                self.fields = FormFields::default();
                self.consent = ConsentFlags::default();
                self.state = IntakeState::Success(Box::new(receipt.clone()));
            }
            Err(err) => {
                tracing::error!(role = role.label(), error = %err, "application submission failed");
                self.state = IntakeState::Failure {
                    role,
                    message: "Error submitting application. Please try again.".to_string(),
                };
            }
        }

        Ok(result)
    }

    /// Dismisses the outcome message.
    pub fn acknowledge(&mut self) -> Result<(), IntakeError> {
        match self.state {
            IntakeState::Success(_) => {
                self.reset();
                Ok(())
            }
            IntakeState::Failure { role, .. } => {
                self.state = IntakeState::FormEntry { role };
                Ok(())
            }
            _ => Err(self.invalid("acknowledge an outcome")),
        }
    }

    /// Runs the whole submission through `pipeline`, settling the session either way.
    pub async fn submit<R, B, N>(
        &mut self,
        pipeline: &SubmissionPipeline<R, B, N>,
    ) -> Result<SubmissionReceipt, SubmitError>
    where
        R: RecordStore + 'static,
        B: BlobStore + 'static,
        N: NotificationSender + 'static,
    {
        let draft = self.begin_submission()?;
        let result = pipeline.run(draft).await;
        Ok(self.complete_submission(result)??)
    }

    fn validate(&self) -> Result<ApplicationDraft, IntakeError> {
        let role = match self.state {
            IntakeState::FormEntry { role } | IntakeState::Failure { role, .. } => role,
            IntakeState::RoleSelection => return Err(IntakeError::NoRoleSelected),
            IntakeState::Submitting { .. } => return Err(IntakeError::AlreadySubmitting),
            IntakeState::Success(_) => return Err(self.invalid("submit")),
        };

        if let Some(field) = self.fields.missing_field() {
            return Err(IntakeError::MissingField(field));
        }
        if !self.consent.granted() {
            return Err(IntakeError::ConsentRequired);
        }

        match (
            self.fields.gender,
            self.fields.employment_type,
            self.fields.source,
            &self.fields.resume,
        ) {
            (Some(gender), Some(employment_type), Some(source), Some(resume)) => {
                Ok(ApplicationDraft {
                    role,
                    name: self.fields.name.trim().to_string(),
                    gender,
                    employment_type,
                    source,
                    resume: resume.clone(),
                })
            }
            _ => Err(IntakeError::MissingField("resume")),
        }
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), IntakeError> {
        match self.state {
            IntakeState::FormEntry { .. } | IntakeState::Failure { .. } => Ok(()),
            IntakeState::RoleSelection => Err(IntakeError::NoRoleSelected),
            IntakeState::Submitting { .. } => Err(IntakeError::AlreadySubmitting),
            IntakeState::Success(_) => Err(self.invalid(action)),
        }
    }

    fn invalid(&self, action: &'static str) -> IntakeError {
        IntakeError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }

    fn reset(&mut self) {
        self.state = IntakeState::RoleSelection;
        self.fields = FormFields::default();
        self.consent = ConsentFlags::default();
    }
}
