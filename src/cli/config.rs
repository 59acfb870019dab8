//! TOML configuration file support.
//!
//! Storage location, user accounts and default analysis options live in one
//! file; command-line flags override the `[analysis]` values:
//!
//! ```toml
//! # toxhub.toml
//! [storage]
//! data_dir = "data"
//! extensions = ["csv", "tsv"]
//!
//! [analysis]
//! measurement_column = "BodyWeight"
//! statistic_time_point = 28
//! control_group = "G1"
//!
//! [[users]]
//! id = "admin"
//! password = "change-me"
//! role = "admin"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use toxhub::config::AnalysisOptions;
use toxhub::session::UserAccount;

/// Root configuration structure for toxhub.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Study storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Default analysis options.
    #[serde(default)]
    pub analysis: AnalysisOptions,

    /// Accounts allowed to log in.
    #[serde(default)]
    pub users: Vec<UserAccount>,
}

/// Configuration for the study store.
#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the study files (default: `data`).
    pub data_dir: Option<PathBuf>,

    /// File extensions listed as studies.
    pub extensions: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toxhub::dataset::TimePoint;
    use toxhub::filter::TimeSelection;
    use toxhub::session::Role;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [storage]
            data_dir = "/srv/toxhub"
            extensions = ["csv"]

            [analysis]
            group_column = "Group"
            measurement_column = "BodyWeight"
            statistic_time_point = 28
            control_group = "G1"
            time_range = [0, 28]
            selected_groups = ["G1", "G2"]

            [[users]]
            id = "admin"
            password = "tox1234"
            role = "admin"
            name = "Administrator"

            [[users]]
            id = "client01"
            password = "guest01"
            prefix = "C01_"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/srv/toxhub")));
        assert_eq!(config.storage.extensions, Some(vec!["csv".to_string()]));
        assert_eq!(config.analysis.measurement_column.as_deref(), Some("BodyWeight"));
        assert_eq!(
            config.analysis.statistic_time_point,
            Some(TimeSelection::At(TimePoint::from(28)))
        );
        assert_eq!(config.analysis.time_range, Some((0.0, 28.0)));
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[0].role, Role::Admin);
        assert_eq!(config.users[1].role, Role::User);
        assert_eq!(config.users[1].prefix, "C01_");
    }

    #[test]
    fn test_pooled_time_point() {
        let config = Config::from_str("[analysis]\nstatistic_time_point = \"pooled\"\n").unwrap();
        assert_eq!(config.analysis.statistic_time_point, Some(TimeSelection::Pooled));
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert!(config.storage.data_dir.is_none());
        assert!(config.users.is_empty());
        assert_eq!(config.analysis, AnalysisOptions::default());
    }
}
