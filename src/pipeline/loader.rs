use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::constants::REQUIRED_KEYS;
use crate::error::{DashboardError, Result};

/// A submitted report exactly as it was decoded. Keys are untyped; the
/// normalizer decides what each recognised key means.
pub type RawReport = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// File contents are not valid JSON
    Malformed,
    /// Valid JSON but missing `problemDescription` or `submittedAt`
    Incomplete,
    /// File could not be read at all (permissions, encoding)
    Unreadable,
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
    pub detail: String,
}

/// Everything the loader saw in one directory pass
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub reports: Vec<RawReport>,
    pub skipped: Vec<SkippedFile>,
    /// Number of `.json` files considered
    pub files_seen: usize,
}

impl LoadOutcome {
    pub fn accepted(&self) -> usize {
        self.reports.len()
    }

    pub fn total_seen(&self) -> usize {
        self.files_seen
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

pub struct ReportLoader;

impl ReportLoader {
    /// Read every `.json` file directly inside `dir`. A bad file is logged
    /// and skipped; only a missing directory fails the whole load.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<LoadOutcome> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DashboardError::DirectoryNotFound(dir.to_path_buf()));
        }
        info!("Loading reports from: {}", dir.display());

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            let is_report = path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.ends_with(".json"));
            if is_report && path.is_file() {
                paths.push(path);
            } else {
                debug!("Ignoring non-report entry {}", path.display());
            }
        }
        // read_dir order is platform dependent
        paths.sort();

        let mut outcome = LoadOutcome {
            files_seen: paths.len(),
            ..LoadOutcome::default()
        };

        for path in paths {
            match Self::load_file(&path) {
                Ok(report) => outcome.reports.push(report),
                Err(skipped) => {
                    warn!("{}", skipped.detail);
                    outcome.skipped.push(skipped);
                }
            }
        }

        info!(
            accepted = outcome.accepted(),
            seen = outcome.total_seen(),
            "Successfully loaded {} valid reports.",
            outcome.accepted()
        );
        Ok(outcome)
    }

    fn load_file(path: &Path) -> std::result::Result<RawReport, SkippedFile> {
        let content = fs::read_to_string(path).map_err(|e| SkippedFile {
            path: path.to_path_buf(),
            reason: SkipReason::Unreadable,
            detail: format!("Error reading file {}: {}", path.display(), e),
        })?;

        Self::parse_report(path, &content).map_err(|e| SkippedFile {
            path: path.to_path_buf(),
            reason: match e {
                DashboardError::MalformedRecord { .. } => SkipReason::Malformed,
                _ => SkipReason::Incomplete,
            },
            detail: e.to_string(),
        })
    }

    /// Decode one document and check it carries the essential keys.
    /// Key presence is what counts, a `null` value is still present.
    pub fn parse_report(path: &Path, content: &str) -> Result<RawReport> {
        let value: Value =
            serde_json::from_str(content).map_err(|source| DashboardError::MalformedRecord {
                path: path.to_path_buf(),
                source,
            })?;

        let report = match value {
            Value::Object(map) => map,
            _ => {
                return Err(DashboardError::IncompleteRecord {
                    path: path.to_path_buf(),
                    missing: REQUIRED_KEYS.iter().map(|k| k.to_string()).collect(),
                })
            }
        };

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|key| !report.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::IncompleteRecord {
                path: path.to_path_buf(),
                missing,
            });
        }

        Ok(report)
    }
}
