//! Tool configuration for metafile consumers.
//!
//! Controls how setup commands are templated and which requirement view is
//! the default. Every key is optional.
//!
//! # Example YAML
//!
//! ```yaml
//! user_env: USER
//! unknown_user: UNKNOWN_USER
//! include_build_requires: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use metafile_core::{CommandContext, UNKNOWN_USER, USER_ENV};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings shared by metafile consumers.
///
/// # Examples
///
/// ```
/// # use metafile_db::ToolConfig;
/// let config: ToolConfig = serde_yaml::from_str("unknown_user: nobody").unwrap();
/// assert_eq!(config.user_env, "USER");
/// assert_eq!(config.unknown_user, "nobody");
/// assert!(!config.include_build_requires);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Environment variable read for `!USER!`.
    pub user_env: String,
    /// Text substituted for `!USER!` when that variable is unset.
    pub unknown_user: String,
    /// Whether requirement queries merge build requirements by default.
    pub include_build_requires: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            user_env: USER_ENV.to_string(),
            unknown_user: UNKNOWN_USER.to_string(),
            include_build_requires: false,
        }
    }
}

impl ToolConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::DatabaseError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Builds a [`CommandContext`] whose user comes from
    /// [`user_env`](Self::user_env), falling back to
    /// [`unknown_user`](Self::unknown_user).
    pub fn command_context(&self, version: &str, base: &str, root: &str) -> CommandContext {
        CommandContext::new(version, base, root)
            .with_user(std::env::var(&self.user_env).ok())
            .with_unknown_user(&self.unknown_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
user_env: LOGNAME
unknown_user: somebody
include_build_requires: true
"#;
        let config: ToolConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.user_env, "LOGNAME");
        assert_eq!(config.unknown_user, "somebody");
        assert!(config.include_build_requires);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: ToolConfig = serde_yaml::from_str("include_build_requires: true").unwrap();
        assert_eq!(config.user_env, USER_ENV);
        assert_eq!(config.unknown_user, UNKNOWN_USER);
    }

    #[test]
    fn test_unset_user_env_falls_back() {
        let config = ToolConfig {
            user_env: "METAFILE_TEST_SURELY_UNSET_VARIABLE".into(),
            unknown_user: "ghost".into(),
            include_build_requires: false,
        };
        let context = config.command_context("1.0", "/b", "/r");
        assert_eq!(context.render("!USER!@!VERSION!"), "ghost@1.0");
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metafile.yaml");

        let original = ToolConfig {
            include_build_requires: true,
            ..ToolConfig::default()
        };
        original.save(&path).unwrap();

        let loaded = ToolConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ToolConfig::load("/nonexistent/metafile-config.yaml").unwrap_err();
        assert!(matches!(err, crate::DatabaseError::IoError(_)));
    }
}
