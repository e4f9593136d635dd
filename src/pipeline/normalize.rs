use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

use crate::constants::{self, REPORT_DATE_FORMAT, UNKNOWN_CATEGORY};
use crate::pipeline::expiration::{ExpirationClassifier, ExpirationInput, ExpirationStatus, RuleSet};
use crate::pipeline::loader::RawReport;

/// Every key the normalizer understands
const RECOGNISED_FIELDS: [&str; 10] = [
    constants::PROBLEM_DESCRIPTION,
    constants::SUBMITTED_AT,
    constants::PROBLEM_DATE,
    constants::PRODUCT_EXPIRATION_DATE,
    constants::PRODUCT_NAME,
    constants::REPORT_IS_ABOUT,
    constants::PATIENT_SEX,
    constants::PATIENT_CONDITIONS,
    constants::PRODUCT_PURCHASE_LOCATION,
    constants::SPECIFICATIONS,
];

/// Offset-carrying layouts tried for `submittedAt` after RFC 3339 / RFC 2822
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];
/// Layouts without an offset; the result is taken as UTC
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];
/// Date-only layouts; the result is UTC midnight
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// One row of the analytical table. Every field is always populated;
/// `None` timestamps stand for values that were missing or unparseable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReport {
    pub submitted_at: Option<DateTime<Utc>>,
    pub problem_date: Option<DateTime<Utc>>,
    pub product_expiration_date: Option<DateTime<Utc>>,
    pub expiration_status: ExpirationStatus,
    pub problem_description: String,
    pub patient_known_medical_conditions_or_allergies: String,
    pub product_name: String,
    pub product_purchase_location: String,
    pub specifications: String,
    pub report_is_about: String,
    pub patient_sex: String,
}

impl NormalizedReport {
    /// Text value of a free-text or categorical field, by source key
    pub fn text_field(&self, field: &str) -> Option<&str> {
        let value = match field {
            constants::PROBLEM_DESCRIPTION => &self.problem_description,
            constants::PATIENT_CONDITIONS => &self.patient_known_medical_conditions_or_allergies,
            constants::PRODUCT_NAME => &self.product_name,
            constants::PRODUCT_PURCHASE_LOCATION => &self.product_purchase_location,
            constants::SPECIFICATIONS => &self.specifications,
            constants::REPORT_IS_ABOUT => &self.report_is_about,
            constants::PATIENT_SEX => &self.patient_sex,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// Which recognised keys appeared in at least one record of the batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPresence {
    present: BTreeSet<&'static str>,
}

impl ColumnPresence {
    pub fn from_reports(reports: &[RawReport]) -> Self {
        let present = RECOGNISED_FIELDS
            .iter()
            .copied()
            .filter(|field| reports.iter().any(|report| report.contains_key(*field)))
            .collect();
        Self { present }
    }

    pub fn has(&self, field: &str) -> bool {
        self.present.contains(field)
    }

    pub fn missing(&self) -> impl Iterator<Item = &'static str> + '_ {
        RECOGNISED_FIELDS.iter().copied().filter(|field| !self.present.contains(field))
    }
}

/// The normalized batch. Built once per run and never mutated.
#[derive(Debug, Clone, Default)]
pub struct ReportTable {
    rows: Vec<NormalizedReport>,
    columns: ColumnPresence,
}

impl ReportTable {
    pub fn rows(&self) -> &[NormalizedReport] {
        &self.rows
    }

    pub fn columns(&self) -> &ColumnPresence {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a text or categorical column, `None` when the key never
    /// appeared in the source batch
    pub fn text_column(&self, field: &str) -> Option<Vec<&str>> {
        if !self.columns.has(field) {
            return None;
        }
        Some(self.rows.iter().filter_map(|row| row.text_field(field)).collect())
    }
}

/// Turns raw reports into the analytical table
pub struct ReportNormalizer {
    now: DateTime<Utc>,
}

impl ReportNormalizer {
    /// `now` is the instant expirations are compared against
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    #[instrument(skip_all, fields(reports = reports.len()))]
    pub fn normalize(&self, reports: &[RawReport]) -> ReportTable {
        let columns = ColumnPresence::from_reports(reports);
        for field in columns.missing() {
            warn!("Column '{}' not found in data.", field);
        }

        let rule_set = RuleSet::for_columns(
            columns.has(constants::PROBLEM_DATE),
            columns.has(constants::PRODUCT_EXPIRATION_DATE),
        );
        if rule_set == RuleSet::Unavailable {
            warn!("Cannot calculate expiration status due to missing date columns.");
        }
        let classifier = ExpirationClassifier::new(rule_set, self.now);

        let rows: Vec<NormalizedReport> = reports
            .iter()
            .map(|report| Self::normalize_report(report, &classifier))
            .collect();

        info!(rows = rows.len(), rule_set = ?rule_set, "Data processed");
        ReportTable { rows, columns }
    }

    fn normalize_report(report: &RawReport, classifier: &ExpirationClassifier) -> NormalizedReport {
        let problem_date = parse_report_date(report.get(constants::PROBLEM_DATE));
        let product_expiration_date = parse_report_date(report.get(constants::PRODUCT_EXPIRATION_DATE));
        let expiration_status = classifier.classify(&ExpirationInput {
            problem_date,
            expiration_date: product_expiration_date,
        });

        NormalizedReport {
            submitted_at: parse_submitted_at(report.get(constants::SUBMITTED_AT)),
            problem_date,
            product_expiration_date,
            expiration_status,
            problem_description: clean_text(report.get(constants::PROBLEM_DESCRIPTION)),
            patient_known_medical_conditions_or_allergies: clean_text(
                report.get(constants::PATIENT_CONDITIONS),
            ),
            product_name: clean_text(report.get(constants::PRODUCT_NAME)),
            product_purchase_location: clean_text(report.get(constants::PRODUCT_PURCHASE_LOCATION)),
            specifications: clean_text(report.get(constants::SPECIFICATIONS)),
            report_is_about: category_or_unknown(report.get(constants::REPORT_IS_ABOUT)),
            patient_sex: category_or_unknown(report.get(constants::PATIENT_SEX)),
        }
    }
}

/// Strict `MM/DD/YYYY` parse, then UTC attachment. Anything else is `None`.
pub fn parse_report_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?;
    let naive = NaiveDate::parse_from_str(text, REPORT_DATE_FORMAT).ok()?;
    let midnight = naive.and_hms_opt(0, 0, 0)?;
    Utc.from_local_datetime(&midnight).single()
}

/// Permissive timestamp parse for `submittedAt`, converted to UTC
pub fn parse_submitted_at(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render any JSON value as text; `null` has no text
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Free-text policy: missing becomes "", otherwise lower-cased and trimmed
pub fn clean_text(value: Option<&Value>) -> String {
    value
        .and_then(value_text)
        .map(|text| text.to_lowercase().trim().to_string())
        .unwrap_or_default()
}

/// Categorical policy: missing becomes "Unknown", case is kept
pub fn category_or_unknown(value: Option<&Value>) -> String {
    value
        .and_then(value_text)
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawReport {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_report_date_is_strict() {
        let parsed = parse_report_date(Some(&json!("01/10/2024"))).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());

        assert_eq!(parse_report_date(Some(&json!("2024-01-10"))), None);
        assert_eq!(parse_report_date(Some(&json!("13/01/2024"))), None);
        assert_eq!(parse_report_date(Some(&json!("01/10/2024 extra"))), None);
        assert_eq!(parse_report_date(Some(&json!(""))), None);
        assert_eq!(parse_report_date(Some(&Value::Null)), None);
        assert_eq!(parse_report_date(Some(&json!(20240110))), None);
        assert_eq!(parse_report_date(None), None);
    }

    #[test]
    fn test_submitted_at_accepts_common_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_submitted_at(Some(&json!("2024-03-01T10:00:00.000Z"))), Some(expected));
        assert_eq!(parse_submitted_at(Some(&json!("2024-03-01T12:00:00+02:00"))), Some(expected));
        assert_eq!(parse_submitted_at(Some(&json!("2024-03-01 10:00:00"))), Some(expected));
        assert_eq!(
            parse_submitted_at(Some(&json!("2024-03-01"))),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_submitted_at(Some(&json!("2024-03-01T12:00:00+0200"))), Some(expected));
        assert_eq!(parse_submitted_at(Some(&json!("2024-03-01T10:00Z"))), Some(expected));
        assert_eq!(parse_submitted_at(Some(&json!("03/01/2024 10:00:00"))), Some(expected));
        assert_eq!(
            parse_submitted_at(Some(&json!("03/01/2024"))),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_submitted_at(Some(&json!("yesterday"))), None);
        assert_eq!(parse_submitted_at(Some(&Value::Null)), None);
    }

    #[test]
    fn test_text_and_category_policies_differ() {
        assert_eq!(clean_text(Some(&json!("  Itchy RASH \n"))), "itchy rash");
        assert_eq!(clean_text(Some(&Value::Null)), "");
        assert_eq!(clean_text(None), "");
        assert_eq!(clean_text(Some(&json!(42))), "42");
        assert_eq!(clean_text(Some(&json!(true))), "true");

        assert_eq!(category_or_unknown(None), "Unknown");
        assert_eq!(category_or_unknown(Some(&Value::Null)), "Unknown");
        assert_eq!(category_or_unknown(Some(&json!("Cosmetic"))), "Cosmetic");
    }

    #[test]
    fn test_sparse_reports_produce_complete_rows() {
        let reports = vec![
            raw(json!({"problemDescription": "Headache", "submittedAt": "2024-03-01T10:00:00Z"})),
            raw(json!({
                "problemDescription": "  Burning SENSATION ",
                "submittedAt": "not a date",
                "problemDate": "01/10/2024",
                "productExpirationDate": "01/01/2024",
                "productName": " Sunscreen X ",
                "reportIsAbout": "Cosmetic",
                "patientSex": "Female",
                "unrelatedKey": 7
            })),
        ];

        let table = ReportNormalizer::new(now()).normalize(&reports);
        assert_eq!(table.len(), 2);

        let first = &table.rows()[0];
        assert_eq!(first.problem_description, "headache");
        assert_eq!(first.product_name, "");
        assert_eq!(first.specifications, "");
        assert_eq!(first.report_is_about, "Unknown");
        assert_eq!(first.patient_sex, "Unknown");
        assert_eq!(first.expiration_status, ExpirationStatus::UnknownExpiration);

        let second = &table.rows()[1];
        assert_eq!(second.submitted_at, None);
        assert_eq!(second.product_name, "sunscreen x");
        assert_eq!(second.problem_description, "burning sensation");
        assert_eq!(second.expiration_status, ExpirationStatus::ExpiredBeforeProblem);
    }

    #[test]
    fn test_no_date_columns_marks_every_row_unknown() {
        let reports = vec![
            raw(json!({"problemDescription": "a", "submittedAt": "2024-03-01"})),
            raw(json!({"problemDescription": "b", "submittedAt": "2024-03-02"})),
        ];
        let table = ReportNormalizer::new(now()).normalize(&reports);
        assert!(table
            .rows()
            .iter()
            .all(|row| row.expiration_status == ExpirationStatus::Unknown));
    }

    #[test]
    fn test_missing_expiration_column_marks_every_row_unknown_expiration() {
        let reports = vec![
            raw(json!({"problemDescription": "a", "submittedAt": "x", "problemDate": "01/10/2024"})),
            raw(json!({"problemDescription": "b", "submittedAt": "x", "problemDate": "not a date"})),
        ];
        let table = ReportNormalizer::new(now()).normalize(&reports);
        assert!(!table.columns().has(constants::PRODUCT_EXPIRATION_DATE));
        assert!(table
            .rows()
            .iter()
            .all(|row| row.expiration_status == ExpirationStatus::UnknownExpiration));
    }

    #[test]
    fn test_missing_problem_date_column_uses_expiration_only_rules() {
        let reports = vec![
            raw(json!({"problemDescription": "a", "submittedAt": "x", "productExpirationDate": "01/01/2020"})),
            raw(json!({"problemDescription": "b", "submittedAt": "x", "productExpirationDate": "12/31/2099"})),
            raw(json!({"problemDescription": "c", "submittedAt": "x", "productExpirationDate": "soon"})),
        ];
        let table = ReportNormalizer::new(now()).normalize(&reports);
        let statuses: Vec<ExpirationStatus> =
            table.rows().iter().map(|row| row.expiration_status).collect();
        assert_eq!(
            statuses,
            vec![
                ExpirationStatus::Expired,
                ExpirationStatus::Valid,
                ExpirationStatus::UnknownExpiration
            ]
        );
    }

    #[test]
    fn test_text_column_absent_when_key_never_seen() {
        let reports = vec![raw(json!({"problemDescription": "a", "submittedAt": "x"}))];
        let table = ReportNormalizer::new(now()).normalize(&reports);
        assert_eq!(table.text_column(constants::PRODUCT_NAME), None);
        assert_eq!(table.text_column(constants::PROBLEM_DESCRIPTION), Some(vec!["a"]));
    }

    #[test]
    fn test_row_serializes_with_source_names() {
        let reports = vec![raw(json!({"problemDescription": "a", "submittedAt": "x"}))];
        let table = ReportNormalizer::new(now()).normalize(&reports);
        let value = serde_json::to_value(&table.rows()[0]).unwrap();
        assert_eq!(value["expirationStatus"], json!("Unknown"));
        assert_eq!(value["patientKnownMedicalConditionsOrAllergies"], json!(""));
        assert_eq!(value["submittedAt"], Value::Null);
    }
}
