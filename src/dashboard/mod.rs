//! Dashboard page generation.
//!
//! Turns a `DashboardSummary` into one self-contained HTML document: each
//! non-empty summary becomes a Plotly figure, grouped into page sections.

pub mod charts;

use askama::Template;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::pipeline::summary::{Counts, DashboardSummary};
use charts::{ChartKind, ChartSpec, PASTEL, SAFE, SET1};

/// A rendered panel as the template sees it
pub struct ChartPanel {
    pub id: String,
    pub figure_json: String,
}

/// A titled group of panels
pub struct Section {
    pub heading: String,
    pub charts: Vec<ChartPanel>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage<'a> {
    title: &'a str,
    total_reports: usize,
    sections: &'a [Section],
    generated_at: String,
    fingerprint: &'a str,
}

/// Builder for the dashboard HTML document
pub struct DashboardBuilder {
    title: String,
    top_n: usize,
    generated_at: DateTime<Utc>,
}

impl DashboardBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            top_n: crate::constants::DEFAULT_TOP_N,
            generated_at: Utc::now(),
        }
    }

    /// Number used in the "Top N" chart titles
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Group the summary's charts into page sections. Empty summaries are
    /// left out; a section may end up with no charts.
    pub fn sections(&self, summary: &DashboardSummary) -> Result<Vec<Section>> {
        let overview = vec![
            (
                ChartSpec::new(
                    "types",
                    "Reports by Product Category",
                    ChartKind::Donut { legend_title: "Category".to_string(), palette: PASTEL },
                ),
                summary.categories.as_ref(),
            ),
            (
                ChartSpec::new(
                    "gender",
                    "Reports by Patient Gender",
                    ChartKind::Donut { legend_title: "Gender".to_string(), palette: SAFE },
                ),
                summary.genders.as_ref(),
            ),
        ];

        let products = vec![
            (
                ChartSpec::new(
                    "products",
                    format!("Top {} Reported Products", self.top_n),
                    ChartKind::RankedBar {
                        value_label: "Number of Reports".to_string(),
                        category_label: "Product Name".to_string(),
                        colorscale: "Viridis".to_string(),
                        left_margin: 150,
                    },
                ),
                summary.products.as_ref(),
            ),
            (
                ChartSpec::new(
                    "expiration",
                    "Product Expiration Status at Time of Problem",
                    ChartKind::CategoryBar {
                        value_label: "Number of Reports".to_string(),
                        category_label: "Status".to_string(),
                        palette: SET1,
                    },
                ),
                summary.expiration.as_ref(),
            ),
        ];

        let keywords = vec![
            (
                keyword_chart("problem_keywords", "Top Keywords in Problem Descriptions", "Reds"),
                Some(&summary.problem_keywords),
            ),
            (
                keyword_chart("condition_keywords", "Top Keywords in Conditions/Allergies", "Greens"),
                Some(&summary.condition_keywords),
            ),
        ];

        Ok(vec![
            section("Overview", overview)?,
            section("Product Details", products)?,
            section("Common Keywords", keywords)?,
        ])
    }

    pub fn build(&self, summary: &DashboardSummary) -> Result<String> {
        let sections = self.sections(summary)?;
        let fingerprint = summary.fingerprint();
        let page = DashboardPage {
            title: &self.title,
            total_reports: summary.total_reports,
            sections: &sections,
            generated_at: self.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            fingerprint: &fingerprint,
        };
        Ok(page.render()?)
    }
}

fn keyword_chart(id: &str, title: &str, colorscale: &str) -> ChartSpec {
    ChartSpec::new(
        id,
        title,
        ChartKind::RankedBar {
            value_label: "Frequency".to_string(),
            category_label: "Keyword".to_string(),
            colorscale: colorscale.to_string(),
            left_margin: 120,
        },
    )
}

fn section(heading: &str, charts: Vec<(ChartSpec, Option<&Counts>)>) -> Result<Section> {
    let mut panels = Vec::new();
    for (spec, counts) in charts {
        let Some(counts) = counts.filter(|c| !c.is_empty()) else {
            continue;
        };
        panels.push(ChartPanel {
            id: spec.id.clone(),
            figure_json: script_safe_json(&spec.figure(counts))?,
        });
    }
    Ok(Section { heading: heading.to_string(), charts: panels })
}

/// JSON that can sit inside a `<script>` element without closing it early
fn script_safe_json(value: &serde_json::Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary() -> DashboardSummary {
        DashboardSummary {
            total_reports: 3,
            categories: Some(vec![("Cosmetic".to_string(), 2), ("Food".to_string(), 1)]),
            genders: None,
            products: Some(vec![("</script>".to_string(), 1)]),
            expiration: Some(vec![("Valid".to_string(), 3)]),
            problem_keywords: vec![("rash".to_string(), 2)],
            condition_keywords: vec![],
        }
    }

    #[test]
    fn test_empty_summaries_are_left_out() {
        let sections = DashboardBuilder::new("Dashboard").sections(&summary()).unwrap();
        let ids: Vec<Vec<&str>> = sections
            .iter()
            .map(|s| s.charts.iter().map(|c| c.id.as_str()).collect())
            .collect();
        assert_eq!(
            ids,
            vec![vec!["types"], vec!["products", "expiration"], vec!["problem_keywords"]]
        );
    }

    #[test]
    fn test_page_embeds_figures_and_footer() {
        let generated_at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let html = DashboardBuilder::new("Report Data Insights Dashboard")
            .with_generated_at(generated_at)
            .build(&summary())
            .unwrap();

        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("Report Data Insights Dashboard"));
        assert!(html.contains("chart-types"));
        assert!(!html.contains("chart-gender"));
        assert!(html.contains("Generated on 2025-01-02 03:04:05 UTC"));
        assert!(html.contains(&summary().fingerprint()));
        // Product name must not terminate the script block
        assert!(html.contains("<\\/script>"));
    }
}
