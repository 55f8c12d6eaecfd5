//! Config file location.

use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "FLOW2API_CONFIG_PATH";

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config/setting.toml";

/// Where the base layer is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// `FLOW2API_CONFIG_PATH` if set and non-empty, otherwise `config/setting.toml`.
    pub fn discover() -> Self {
        let config_file = std::env::var(CONFIG_PATH_VAR)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self { config_file }
    }

    /// Use an explicit config file.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file: path.into(),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_file() {
        let paths = ConfigPaths::with_file("/etc/flow2api/setting.toml");
        assert_eq!(paths.config_file(), Path::new("/etc/flow2api/setting.toml"));
    }

    #[test]
    fn test_discover_has_a_file() {
        // Depends on the test environment; only check the fallback shape.
        let paths = ConfigPaths::discover();
        assert!(!paths.config_file.as_os_str().is_empty());
    }
}
