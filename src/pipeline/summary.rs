use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::constants::{self, EXCLUDED_PRODUCT_NAMES};
use crate::pipeline::normalize::ReportTable;

/// `(label, count)` pairs, highest count first
pub type Counts = Vec<(String, usize)>;

/// Count occurrences, most frequent first; ties keep first-seen order
fn value_counts<'a, I>(values: I) -> Counts
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect()
}

fn non_empty(counts: Counts) -> Option<Counts> {
    if counts.is_empty() {
        None
    } else {
        Some(counts)
    }
}

fn column_breakdown(table: &ReportTable, field: &str) -> Option<Counts> {
    if table.is_empty() {
        return None;
    }
    non_empty(value_counts(table.text_column(field)?))
}

/// Reports per `reportIsAbout` value
pub fn category_breakdown(table: &ReportTable) -> Option<Counts> {
    column_breakdown(table, constants::REPORT_IS_ABOUT)
}

/// Reports per `patientSex` value
pub fn gender_breakdown(table: &ReportTable) -> Option<Counts> {
    column_breakdown(table, constants::PATIENT_SEX)
}

/// Most reported product names, placeholders such as "n/a" excluded
pub fn top_products(table: &ReportTable, top_n: usize) -> Option<Counts> {
    if table.is_empty() {
        return None;
    }
    let names = table.text_column(constants::PRODUCT_NAME)?;
    let mut counts = value_counts(
        names
            .into_iter()
            .filter(|name| !EXCLUDED_PRODUCT_NAMES.contains(name)),
    );
    counts.truncate(top_n);
    non_empty(counts)
}

/// Reports per derived expiration status
pub fn expiration_breakdown(table: &ReportTable) -> Option<Counts> {
    if table.is_empty() {
        return None;
    }
    non_empty(value_counts(
        table.rows().iter().map(|row| row.expiration_status.label()),
    ))
}

/// All chart data for one dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_reports: usize,
    pub categories: Option<Counts>,
    pub genders: Option<Counts>,
    pub products: Option<Counts>,
    pub expiration: Option<Counts>,
    pub problem_keywords: Counts,
    pub condition_keywords: Counts,
}

impl DashboardSummary {
    /// SHA-256 of the serialized summary. Unchanged input gives the same value.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}
