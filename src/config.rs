//! Purpose: Host configuration for the CLI and embedders.
//! Exports: `HostConfig`, `SEARCH_PATH_ENV`, `DEFAULT_HOST_VERSION`.
//! Role: One place that decides defaults, file overrides, and environment overrides.
//! Invariants: Precedence is defaults, then the JSON file, then `HOSTLINK_SEARCH_PATH`;
//! command-line flags are applied last by the caller.
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};

pub const DEFAULT_HOST_VERSION: &str = "8.6.0";
pub const SEARCH_PATH_ENV: &str = "HOSTLINK_SEARCH_PATH";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Version the host provides for its own package.
    pub version: String,
    /// Encoding directories, reported by the revision 2 slot.
    pub search_path: Vec<String>,
    /// Create a restricted interpreter.
    pub safe: bool,
    /// Register the stub table with the host package.
    pub stubs: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_HOST_VERSION.to_string(),
            search_path: Vec::new(),
            safe: false,
            stubs: true,
        }
    }
}

impl HostConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read config {}", path.display()))
                .with_source(err)
        })?;
        serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid config {}: {err}", path.display()))
                .with_hint("Expected a JSON object with version, search_path, safe, stubs.")
                .with_source(err)
        })
    }

    /// Defaults, optionally overlaid by `path`, then by the environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self, Error> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(value) = std::env::var_os(SEARCH_PATH_ENV) {
            config.apply_search_path(&value);
        }
        Ok(config)
    }

    /// Replaces the search path with a platform path list such as `/a:/b`.
    pub fn apply_search_path(&mut self, value: &OsStr) {
        self.search_path = std::env::split_paths(value)
            .filter(|path| !path.as_os_str().is_empty())
            .map(|path: PathBuf| path.to_string_lossy().into_owned())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::HostConfig;
    use crate::core::error::ErrorKind;

    #[test]
    fn defaults_enable_stubs_with_full_trust() {
        let config = HostConfig::default();
        assert_eq!(config.version, "8.6.0");
        assert!(config.stubs);
        assert!(!config.safe);
        assert!(config.search_path.is_empty());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: HostConfig = serde_json::from_str(r#"{"version": "9.0"}"#).expect("parse");
        assert_eq!(config.version, "9.0");
        assert!(config.stubs);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<HostConfig>(r#"{"verison": "9.0"}"#).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn search_path_list_is_split_and_compacted() {
        let mut config = HostConfig::default();
        config.apply_search_path(std::ffi::OsStr::new("/a/enc::/b/enc"));
        assert_eq!(config.search_path, vec!["/a/enc", "/b/enc"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = HostConfig::load(std::path::Path::new("/nonexistent/hostlink.json"))
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
