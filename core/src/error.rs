//! Error types for metafile loading.
//!
//! A load fails in one of three ways: the file cannot be read, the YAML is not
//! well-formed, or the document parses but breaks a schema rule. Syntax and
//! schema failures are kept apart so callers can tell a typo in the
//! serialization from a semantically wrong package definition.

use thiserror::Error;

use crate::validate::SchemaViolation;

/// Errors that can occur while loading a package metafile.
#[derive(Debug, Error)]
pub enum MetafileError {
    /// The file could not be opened or read.
    #[error("failed to read package metafile '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The document is not well-formed YAML.
    #[error("package metafile '{path}' is not valid YAML: {source}")]
    Syntax {
        path: String,
        source: serde_yaml::Error,
    },

    /// The document parsed but violates a schema rule.
    #[error("package metafile '{path}' {violation}")]
    Schema {
        path: String,
        violation: SchemaViolation,
    },
}

impl MetafileError {
    pub(crate) fn schema(path: &str, violation: SchemaViolation) -> Self {
        Self::Schema {
            path: path.to_string(),
            violation,
        }
    }

    /// Path string of the metafile that failed to load.
    pub fn path(&self) -> &str {
        match self {
            Self::Io { path, .. } | Self::Syntax { path, .. } | Self::Schema { path, .. } => path,
        }
    }

    /// Returns `true` for YAML syntax failures.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    /// Returns `true` for schema rule violations.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// The violated rule, if this is a schema error.
    pub fn violation(&self) -> Option<&SchemaViolation> {
        match self {
            Self::Schema { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`MetafileError`].
pub type Result<T> = std::result::Result<T, MetafileError>;
