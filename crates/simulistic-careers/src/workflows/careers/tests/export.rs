use chrono::FixedOffset;

use super::common::*;
use crate::workflows::careers::export::{COLUMNS, SHEET_NAME};
use crate::workflows::careers::{ApplicationSheet, ExportError, ExportFormat, ExportOptions};

#[test]
fn one_row_per_record_with_localized_dates() {
    let records = vec![
        record("a", "Ada", (2024, 3, 1)),
        record("b", "Ben", (2024, 2, 1)),
        record("c", "Cleo", (2024, 1, 1)),
    ];

    let sheet = ApplicationSheet::from_records(&records, &ExportOptions::default())
        .expect("sheet builds");

    assert_eq!(sheet.rows().len(), 3);
    assert_eq!(
        sheet.rows()[0],
        [
            "Ada".to_string(),
            "Design Engineer".to_string(),
            "other".to_string(),
            "parttime".to_string(),
            "friends".to_string(),
            "3/1/2024".to_string(),
        ]
    );
    assert_eq!(sheet.rows()[2][5], "1/1/2024");
}

#[test]
fn dates_follow_the_configured_offset_and_format() {
    let records = vec![record("a", "Ada", (2024, 3, 1))];
    let options = ExportOptions {
        date_format: "%d.%m.%Y".to_string(),
        utc_offset: FixedOffset::west_opt(11 * 3600).expect("valid offset"),
    };

    let sheet = ApplicationSheet::from_records(&records, &options).expect("sheet builds");

    assert_eq!(sheet.rows()[0][5], "29.02.2024");
}

#[test]
fn csv_export_has_header_and_rows() {
    let records = vec![record("a", "Ada, PhD", (2024, 3, 1))];
    let artifact = ApplicationSheet::from_records(&records, &ExportOptions::default())
        .expect("sheet builds")
        .render(ExportFormat::Csv)
        .expect("csv renders");

    assert_eq!(artifact.file_name, "applications.csv");
    assert_eq!(artifact.content_type, "text/csv");
    let csv = String::from_utf8(artifact.content).expect("utf8");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(COLUMNS.join(",").as_str()));
    assert_eq!(
        lines.next(),
        Some("\"Ada, PhD\",Design Engineer,other,parttime,friends,3/1/2024")
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn xlsx_export_is_a_zip_workbook() {
    let records = vec![record("a", "Ada", (2024, 3, 1))];
    let artifact = ApplicationSheet::from_records(&records, &ExportOptions::default())
        .expect("sheet builds")
        .render(ExportFormat::Xlsx)
        .expect("xlsx renders");

    assert_eq!(artifact.file_name, "applications.xlsx");
    assert!(artifact.content_type.contains("spreadsheetml"));
    assert!(artifact.content.starts_with(b"PK"));
    assert_eq!(SHEET_NAME, "Applications");
}

#[test]
fn empty_list_exports_only_the_header() {
    let sheet =
        ApplicationSheet::from_records(&[], &ExportOptions::default()).expect("sheet builds");
    assert!(sheet.rows().is_empty());
    let artifact = sheet.render(ExportFormat::Csv).expect("csv renders");
    assert_eq!(
        String::from_utf8(artifact.content).expect("utf8").lines().count(),
        1
    );
}

#[test]
fn format_names_parse_case_insensitively() {
    assert_eq!("XLSX".parse::<ExportFormat>().ok(), Some(ExportFormat::Xlsx));
    assert_eq!("excel".parse::<ExportFormat>().ok(), Some(ExportFormat::Xlsx));
    assert_eq!(" csv ".parse::<ExportFormat>().ok(), Some(ExportFormat::Csv));
    assert!(matches!(
        "pdf".parse::<ExportFormat>(),
        Err(ExportError::UnknownFormat(format)) if format == "pdf"
    ));
}

#[test]
fn malformed_date_format_is_an_error_not_a_panic() {
    let records = vec![record("a", "Ada", (2024, 3, 1))];
    let options = ExportOptions {
        date_format: "%Q".to_string(),
        ..ExportOptions::default()
    };

    let err = ApplicationSheet::from_records(&records, &options).expect_err("bad format");

    assert!(matches!(err, ExportError::DateFormat(format) if format == "%Q"));
}
