//! One dashboard run: load → normalize → analyse → render.

pub mod expiration;
pub mod keywords;
pub mod loader;
pub mod normalize;
pub mod summary;

use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::constants;
use crate::dashboard::DashboardBuilder;
use crate::error::{DashboardError, Result};
use keywords::{KeywordExtractor, StopWords};
use loader::{ReportLoader, SkippedFile};
use normalize::{ReportNormalizer, ReportTable};
use summary::DashboardSummary;

pub const DASHBOARD_TITLE: &str = "Report Data Insights Dashboard";

/// Result of a run that produced a dashboard
#[derive(Debug)]
pub struct PipelineResult {
    pub files_seen: usize,
    pub accepted: usize,
    pub skipped: Vec<SkippedFile>,
    pub output_file: PathBuf,
    pub summary: DashboardSummary,
    pub fingerprint: String,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    Generated(PipelineResult),
    /// Nothing to render; no output file was written
    NoOutput(DashboardError),
}

pub struct Pipeline {
    config: Config,
    stop_words: StopWords,
    now: DateTime<Utc>,
}

impl Pipeline {
    pub fn new(config: Config, stop_words: StopWords) -> Self {
        Self { config, stop_words, now: Utc::now() }
    }

    /// Fix the instant used for expiration checks and the page footer
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Run the whole pipeline. A missing directory or an empty batch ends the
    /// run without output; only I/O or rendering failures are errors.
    #[instrument(skip_all, fields(reports_dir = %self.config.reports_dir.display()))]
    pub fn run(&self) -> Result<RunOutcome> {
        let loaded = match ReportLoader::load(&self.config.reports_dir) {
            Ok(loaded) => loaded,
            Err(e @ DashboardError::DirectoryNotFound(_)) => {
                error!("{}", e);
                return Ok(RunOutcome::NoOutput(e));
            }
            Err(e) => return Err(e),
        };

        if loaded.is_empty() {
            let e = DashboardError::EmptyDataset(self.config.reports_dir.clone());
            warn!("{}", e);
            return Ok(RunOutcome::NoOutput(e));
        }

        let table = ReportNormalizer::new(self.now).normalize(&loaded.reports);
        let summary = self.summarize(&table);

        let html = DashboardBuilder::new(DASHBOARD_TITLE)
            .with_top_n(self.config.top_n)
            .with_generated_at(self.now)
            .build(&summary)?;
        fs::write(&self.config.output_file, html)?;
        info!("Dashboard successfully generated: {}", self.config.output_file.display());

        Ok(RunOutcome::Generated(PipelineResult {
            files_seen: loaded.total_seen(),
            accepted: loaded.accepted(),
            skipped: loaded.skipped,
            output_file: self.config.output_file.clone(),
            fingerprint: summary.fingerprint(),
            summary,
        }))
    }

    /// Every aggregate the dashboard draws, computed from the table
    pub fn summarize(&self, table: &ReportTable) -> DashboardSummary {
        let extractor = KeywordExtractor::from_config(&self.config, self.stop_words.clone());
        let keywords_for = |field: &str| {
            table
                .text_column(field)
                .map(|texts| extractor.extract(texts))
                .unwrap_or_default()
        };

        DashboardSummary {
            total_reports: table.len(),
            categories: summary::category_breakdown(table),
            genders: summary::gender_breakdown(table),
            products: summary::top_products(table, self.config.top_n),
            expiration: summary::expiration_breakdown(table),
            problem_keywords: keywords_for(constants::PROBLEM_DESCRIPTION),
            condition_keywords: keywords_for(constants::PATIENT_CONDITIONS),
        }
    }
}
