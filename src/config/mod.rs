//! Configuration loading and management.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::validate::ValidationConfig;

/// Main configuration structure, loaded from `mend.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fault reader settings.
    pub fault: FaultConfig,
    /// Two-phase validator settings.
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from directory, looking for mend.toml or
    /// .mend/mend.toml.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let mend_toml = dir.join("mend.toml");
        if mend_toml.exists() {
            return Self::from_file(mend_toml);
        }

        let dot_mend_toml = dir.join(".mend/mend.toml");
        if dot_mend_toml.exists() {
            return Self::from_file(dot_mend_toml);
        }

        Ok(Self::default())
    }
}

/// Fault reader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    /// Substring marking where the repository-relative part of an SBFL path
    /// begins; everything before its first occurrence is stripped.
    pub path_marker: String,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            path_marker: "src/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fault.path_marker, "src/");
        assert_eq!(config.validation.time_budget_minutes, 70);
        assert_eq!(config.validation.max_patches_to_validate, 10);
        assert!(config.validation.enable_early_exit);
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend.toml");
        fs::write(
            &path,
            r#"
[fault]
path_marker = "lib/"

[validation]
time_budget_minutes = 5
max_patches_to_validate = 3
enable_early_exit = false
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.fault.path_marker, "lib/");
        assert_eq!(config.validation.time_budget_minutes, 5);
        assert_eq!(config.validation.max_patches_to_validate, 3);
        assert!(!config.validation.enable_early_exit);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mend.toml");
        fs::write(&path, "[validation]\nmax_patches_to_validate = 2\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.validation.max_patches_to_validate, 2);
        assert_eq!(config.validation.time_budget_minutes, 70);
        assert_eq!(config.fault.path_marker, "src/");
    }

    #[test]
    fn test_load_default_probes_dot_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".mend")).unwrap();
        fs::write(
            dir.path().join(".mend/mend.toml"),
            "[fault]\npath_marker = \"source/\"\n",
        )
        .unwrap();

        let config = Config::load_default(dir.path()).unwrap();
        assert_eq!(config.fault.path_marker, "source/");
    }

    #[test]
    fn test_load_default_without_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_default(dir.path()).unwrap();
        assert_eq!(config.fault.path_marker, "src/");
    }
}
