use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::Deserialize;

use super::domain::ApplicationRecord;

pub const SHEET_NAME: &str = "Applications";

pub const COLUMNS: [&str; 6] = [
    "Name",
    "Role",
    "Gender",
    "Employment Type",
    "Source",
    "Application Date",
];

/// Controls how the application date is localized in exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub date_format: String,
    pub utc_offset: FixedOffset,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            date_format: "%-m/%-d/%Y".to_string(),
            utc_offset: Utc.fix(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub const fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "applications.xlsx",
            ExportFormat::Csv => "applications.csv",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// File ready to be saved by the reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unknown export format '{0}'")]
    UnknownFormat(String),
    #[error("invalid export date format '{0}'")]
    DateFormat(String),
    #[error("failed to build spreadsheet: {0}")]
    Spreadsheet(#[from] XlsxError),
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv buffer: {0}")]
    Io(#[from] std::io::Error),
}

/// Tabular projection of the loaded applications, one row per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSheet {
    rows: Vec<[String; 6]>,
}

impl ApplicationSheet {
    pub fn from_records(
        records: &[ApplicationRecord],
        options: &ExportOptions,
    ) -> Result<Self, ExportError> {
        let rows = records
            .iter()
            .map(|record| {
                let local_date = record
                    .application_date
                    .with_timezone(&options.utc_offset)
                    .date_naive();
                let mut date = String::new();
                write!(date, "{}", local_date.format(&options.date_format))
                    .map_err(|_| ExportError::DateFormat(options.date_format.clone()))?;
                Ok([
                    record.name.clone(),
                    record.role.label().to_string(),
                    record.gender.value().to_string(),
                    record.employment_type.value().to_string(),
                    record.source.value().to_string(),
                    date,
                ])
            })
            .collect::<Result<_, ExportError>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[[String; 6]] {
        &self.rows
    }

    pub fn render(&self, format: ExportFormat) -> Result<ExportArtifact, ExportError> {
        let content = match format {
            ExportFormat::Xlsx => self.to_xlsx()?,
            ExportFormat::Csv => self.to_csv()?,
        };
        Ok(ExportArtifact {
            file_name: format.file_name(),
            content_type: format.content_type(),
            content,
        })
    }

    fn to_xlsx(&self) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, header) in COLUMNS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header)?;
        }
        for (index, row) in self.rows.iter().enumerate() {
            let row_num = (index + 1) as u32;
            for (col, value) in row.iter().enumerate() {
                worksheet.write_string(row_num, col as u16, value.as_str())?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    fn to_csv(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(COLUMNS)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|err| ExportError::Io(err.into_error()))
    }
}
