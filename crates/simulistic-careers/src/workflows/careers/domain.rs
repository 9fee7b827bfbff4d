use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the record store when an application is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ApplicationId(pub String);

impl<'de> Deserialize<'de> for ApplicationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Hosted stores hand back either numeric or uuid keys.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => ApplicationId(value),
            RawId::Number(value) => ApplicationId(value.to_string()),
        })
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error produced when a form value does not match one of the fixed options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {field}")]
pub struct UnknownOption {
    pub field: &'static str,
    pub value: String,
}

macro_rules! form_options {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $label:literal, $value:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Human readable label shown on the form.
            pub const fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Value stored in the record store and submitted by the form.
            pub const fn value(self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let trimmed = raw.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|option| {
                        option.value().eq_ignore_ascii_case(trimmed)
                            || option.label().eq_ignore_ascii_case(trimmed)
                    })
                    .ok_or_else(|| UnknownOption {
                        field: $field,
                        value: raw.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.value())
            }
        }
    };
}

form_options! {
    /// Open positions advertised on the careers page.
    JobRole, "role" {
        CfdEngineer => "CFD Engineer", "CFD Engineer";
        DesignEngineer => "Design Engineer", "Design Engineer";
        FeaEngineer => "FEA Engineer", "FEA Engineer";
    }
}

form_options! {
    Gender, "gender" {
        Male => "Male", "male";
        Female => "Female", "female";
        Other => "Other", "other";
    }
}

form_options! {
    EmploymentType, "employment type" {
        FullTime => "Full Time", "fulltime";
        PartTime => "Part Time", "parttime";
    }
}

form_options! {
    /// Referral channel reported by the applicant.
    ReferralSource, "source" {
        LinkedIn => "LinkedIn", "linkedin";
        Friends => "Friends", "friends";
        JobBoards => "Job Boards", "job boards";
        CompanyWebsite => "Company Website", "company website";
        Other => "Other", "other";
    }
}

/// Document extensions accepted by the résumé input.
pub const RESUME_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Résumé file as received from the applicant.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl ResumeUpload {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            content,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Final path segment of the client supplied name, with any directories dropped.
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file_name.as_str())
            .trim()
    }

    pub fn extension(&self) -> Option<String> {
        let name = self.base_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .map(|ext| RESUME_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Content type sent to the blob store, guessed from the extension when the client sent none.
    pub fn resolved_content_type(&self) -> String {
        if let Some(content_type) = &self.content_type {
            return content_type.clone();
        }
        match self.extension().as_deref() {
            Some("pdf") => mime::APPLICATION_PDF.to_string(),
            Some("doc") => "application/msword".to_string(),
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string()
            }
            _ => mime::APPLICATION_OCTET_STREAM.to_string(),
        }
    }
}

impl fmt::Debug for ResumeUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.content.len())
            .finish()
    }
}

/// Consent checkboxes that gate submission. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentFlags {
    pub contact: bool,
    pub role_match: bool,
}

impl ConsentFlags {
    pub const fn granted(self) -> bool {
        self.contact && self.role_match
    }
}

/// Which consent checkbox a toggle targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consent {
    Contact,
    RoleMatch,
}

/// Key of a résumé object in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumePath(pub String);

impl ResumePath {
    /// `{unix_millis}-{file_name}`, unique per submission.
    pub fn for_upload(submitted_at: DateTime<Utc>, file_name: &str) -> Self {
        ResumePath(format!("{}-{}", submitted_at.timestamp_millis(), file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name offered to the reviewer when downloading.
    pub fn download_name(&self) -> &str {
        match self.0.rsplit('/').next() {
            Some(segment) if !segment.is_empty() => segment,
            _ => "resume",
        }
    }
}

impl fmt::Display for ResumePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated form contents handed to the submission pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub role: JobRole,
    pub name: String,
    pub gender: Gender,
    pub employment_type: EmploymentType,
    pub source: ReferralSource,
    pub resume: ResumeUpload,
}

/// Row written to the record store. Every field is set once, at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplicationRecord {
    pub role: JobRole,
    pub name: String,
    pub gender: Gender,
    pub employment_type: EmploymentType,
    pub source: ReferralSource,
    pub resume_path: ResumePath,
    pub application_date: DateTime<Utc>,
}

impl NewApplicationRecord {
    pub fn with_id(self, id: ApplicationId) -> ApplicationRecord {
        ApplicationRecord {
            id,
            role: self.role,
            name: self.name,
            gender: self.gender,
            employment_type: self.employment_type,
            source: self.source,
            resume_path: self.resume_path,
            application_date: self.application_date,
        }
    }
}

/// Persisted job application. Read-only once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub role: JobRole,
    pub name: String,
    pub gender: Gender,
    pub employment_type: EmploymentType,
    pub source: ReferralSource,
    pub resume_path: ResumePath,
    pub application_date: DateTime<Utc>,
}
