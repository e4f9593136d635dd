//! Seeds or clears the default login credentials in an env file.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::constants::{CREDENTIAL_PLACEHOLDER, DEFAULT_PASSWORD_KEY, DEFAULT_USERNAME_KEY};
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Write placeholder values for both keys
    Set,
    /// Remove both keys
    Reset,
}

impl FromStr for CredentialMode {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SET" => Ok(CredentialMode::Set),
            "RESET" => Ok(CredentialMode::Reset),
            other => Err(DashboardError::Config(format!(
                "Unknown mode '{}', expected SET or RESET",
                other
            ))),
        }
    }
}

/// Key name of an assignment line, if it is one
fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, _) = trimmed.split_once('=')?;
    Some(key.trim())
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(fs::read_to_string(path)?.lines().map(str::to_string).collect())
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

/// Set `key` to `value`, replacing an existing assignment in place or
/// appending a new one. Creates the file when missing.
pub fn set_key(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut lines = read_lines(path)?;
    let assignment = format!("{}='{}'", key, value.replace('\'', "\\'"));

    match lines.iter().position(|line| line_key(line) == Some(key)) {
        Some(i) => lines[i] = assignment,
        None => lines.push(assignment),
    }
    write_lines(path, &lines)
}

/// Remove every assignment of `key`. Returns whether anything was removed.
pub fn unset_key(path: &Path, key: &str) -> Result<bool> {
    if !path.exists() {
        warn!("Can't delete from {} - it doesn't exist.", path.display());
        return Ok(false);
    }
    let lines = read_lines(path)?;
    let before = lines.len();
    let kept: Vec<String> = lines
        .into_iter()
        .filter(|line| line_key(line) != Some(key))
        .collect();
    let removed = kept.len() != before;
    if removed {
        write_lines(path, &kept)?;
    } else {
        warn!("Key {} not removed from {} - key doesn't exist.", key, path.display());
    }
    Ok(removed)
}

pub fn apply(path: &Path, mode: CredentialMode) -> Result<()> {
    match mode {
        CredentialMode::Set => {
            set_key(path, DEFAULT_USERNAME_KEY, CREDENTIAL_PLACEHOLDER)?;
            set_key(path, DEFAULT_PASSWORD_KEY, CREDENTIAL_PLACEHOLDER)?;
            info!("Default credentials written to {}", path.display());
        }
        CredentialMode::Reset => {
            unset_key(path, DEFAULT_USERNAME_KEY)?;
            unset_key(path, DEFAULT_PASSWORD_KEY)?;
            info!("Default credentials cleared from {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn read_env(path: &Path) -> HashMap<String, String> {
        dotenv::from_path_iter(path)
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
    }

    #[test]
    fn test_set_creates_file_with_placeholders() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");

        apply(&path, CredentialMode::Set).unwrap();

        let env = read_env(&path);
        assert_eq!(env.get("DEFAULT_USERNAME").map(String::as_str), Some("<replace>"));
        assert_eq!(env.get("DEFAULT_PASSWORD").map(String::as_str), Some("<replace>"));
    }

    #[test]
    fn test_set_replaces_in_place_and_keeps_other_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "# settings\nAPI_URL=http://localhost\nDEFAULT_USERNAME=alice\n").unwrap();

        apply(&path, CredentialMode::Set).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "# settings\nAPI_URL=http://localhost\nDEFAULT_USERNAME='<replace>'\nDEFAULT_PASSWORD='<replace>'\n"
        );
    }

    #[test]
    fn test_reset_removes_only_credentials() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "API_URL=x\nDEFAULT_USERNAME='a'\nexport DEFAULT_PASSWORD='b'\n").unwrap();

        apply(&path, CredentialMode::Reset).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "API_URL=x\n");
    }

    #[test]
    fn test_reset_on_missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.env");
        assert!(apply(&path, CredentialMode::Reset).is_ok());
        assert!(!path.exists());
    }

    #[test]
    fn test_mode_parsing_is_exact() {
        assert_eq!("SET".parse::<CredentialMode>().unwrap(), CredentialMode::Set);
        assert_eq!("RESET".parse::<CredentialMode>().unwrap(), CredentialMode::Reset);
        assert!("set".parse::<CredentialMode>().is_err());
    }
}
