use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{DashboardError, Result};

/// Where the standard stop-word list comes from
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StopWordConfig {
    /// The English list compiled into the binary
    Embedded,
    /// One word per line, `#` starts a comment
    File { path: PathBuf },
    /// Downloaded at startup; failure degrades to domain exclusions only
    Url { url: String },
    /// Domain exclusions only
    None,
}

impl Default for StopWordConfig {
    fn default() -> Self {
        StopWordConfig::Embedded
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reports_dir: PathBuf,
    pub output_file: PathBuf,
    /// Length of every ranked list (keywords and products)
    pub top_n: usize,
    pub min_keyword_len: usize,
    /// Added on top of the built-in domain exclusions
    pub extra_stop_words: Vec<String>,
    pub stop_words: StopWordConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from(constants::DEFAULT_REPORTS_DIR),
            output_file: PathBuf::from(constants::DEFAULT_OUTPUT_FILE),
            top_n: constants::DEFAULT_TOP_N,
            min_keyword_len: constants::DEFAULT_MIN_KEYWORD_LEN,
            extra_stop_words: Vec::new(),
            stop_words: StopWordConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or from `dashboard.toml`
    /// in the working directory when present, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(constants::DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DashboardError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(DashboardError::Config("top_n must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashboard_conventions() {
        let config = Config::default();
        assert_eq!(config.reports_dir, PathBuf::from("./submitted_reports"));
        assert_eq!(config.output_file, PathBuf::from("report_dashboard.html"));
        assert_eq!(config.top_n, 15);
        assert_eq!(config.min_keyword_len, 3);
        assert_eq!(config.stop_words, StopWordConfig::Embedded);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            top_n = 5
            extra_stop_words = ["rash"]

            [stop_words]
            kind = "file"
            path = "words.txt"
            "#,
        )
        .unwrap();

        assert_eq!(config.top_n, 5);
        assert_eq!(config.extra_stop_words, vec!["rash".to_string()]);
        assert_eq!(config.output_file, PathBuf::from("report_dashboard.html"));
        assert_eq!(
            config.stop_words,
            StopWordConfig::File { path: PathBuf::from("words.txt") }
        );
    }

    #[test]
    fn test_zero_top_n_is_rejected() {
        let config = Config { top_n: 0, ..Config::default() };
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = Config::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(DashboardError::Config(_))));
    }
}
