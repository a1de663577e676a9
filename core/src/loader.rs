//! Versioned metafile loading.
//!
//! [`Loader`] runs the full pipeline: read, parse, check the root shape and
//! `config_version`, extract the common fields, then hand the document to the
//! [`SchemaExtractor`] registered for its version.
//!
//! Supporting a new format version means writing one extractor and
//! registering it with [`Loader::with_extractor`]; the common-field logic does
//! not change.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use crate::document::{parse_document, read_document};
use crate::error::{MetafileError, Result};
use crate::types::{CommonFields, DependencyFields, Descriptor};
use crate::validate::{
    SchemaViolation, check_authors, common_fields, config_version, is_empty_document,
    string_list, variant_list,
};

/// Extracts the version-specific fields of a metafile.
pub trait SchemaExtractor: Send + Sync {
    /// The `config_version` this extractor handles.
    fn version(&self) -> u32;

    /// Extracts fields from `doc`. `common` holds the already-parsed shared
    /// fields.
    fn extract(
        &self,
        doc: &Mapping,
        common: &CommonFields,
    ) -> std::result::Result<DependencyFields, SchemaViolation>;
}

/// Format version 0.
///
/// Reads `requires`, `build_requires`, `variants` and `commands`. Each must be
/// a list when present; an empty list is treated as absent. Only the first
/// element of each list is type-checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionZero;

impl SchemaExtractor for VersionZero {
    fn version(&self) -> u32 {
        0
    }

    fn extract(
        &self,
        doc: &Mapping,
        _common: &CommonFields,
    ) -> std::result::Result<DependencyFields, SchemaViolation> {
        Ok(DependencyFields {
            requires: string_list(doc, "requires")?,
            build_requires: string_list(doc, "build_requires")?,
            variants: variant_list(doc, "variants")?,
            commands: string_list(doc, "commands")?,
        })
    }
}

type AuthorValidator = dyn Fn(&str) -> bool + Send + Sync;

/// Loads and validates package metafiles.
///
/// # Examples
///
/// ```
/// use metafile_core::Loader;
///
/// let loader = Loader::new();
///
/// // An empty metafile is a valid stub package.
/// let stub = loader.load_str("zlib/package.yaml", "").unwrap();
/// assert!(stub.is_stub());
///
/// // A non-empty one must declare its format version.
/// let err = loader.load_str("foo/package.yaml", "name: foo").unwrap_err();
/// assert!(err.is_schema());
/// assert_eq!(
///     err.to_string(),
///     "package metafile 'foo/package.yaml' is missing 'config_version'"
/// );
/// ```
pub struct Loader {
    extractors: BTreeMap<u32, Box<dyn SchemaExtractor>>,
    author_validator: Option<Box<AuthorValidator>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("versions", &self.extractors.keys().collect::<Vec<_>>())
            .field("author_validator", &self.author_validator.is_some())
            .finish()
    }
}

impl Loader {
    /// A loader for every format version this crate ships.
    pub fn new() -> Self {
        Self::empty().with_extractor(VersionZero)
    }

    /// A loader with no extractors registered.
    pub fn empty() -> Self {
        Self {
            extractors: BTreeMap::new(),
            author_validator: None,
        }
    }

    /// Registers `extractor`, replacing any previous one for its version.
    pub fn with_extractor(mut self, extractor: impl SchemaExtractor + 'static) -> Self {
        self.extractors.insert(extractor.version(), Box::new(extractor));
        self
    }

    /// Installs a check run on every author of every loaded metafile.
    ///
    /// Without one, authors are never checked.
    pub fn with_author_validator(
        mut self,
        validator: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.author_validator = Some(Box::new(validator));
        self
    }

    /// Format versions with a registered extractor, ascending.
    pub fn versions(&self) -> Vec<u32> {
        self.extractors.keys().copied().collect()
    }

    /// Reads, parses and validates the metafile at `path`.
    ///
    /// # Errors
    ///
    /// [`MetafileError::Io`] if the file cannot be read,
    /// [`MetafileError::Syntax`] if it is not valid YAML, and
    /// [`MetafileError::Schema`] if it breaks a schema rule.
    pub fn load(&self, path: &str) -> Result<Descriptor> {
        let value = read_document(path)?;
        self.load_value(path, &value)
    }

    /// Like [`load`](Self::load), for in-memory text. `label` stands in for
    /// the path in the descriptor and in errors.
    pub fn load_str(&self, label: &str, text: &str) -> Result<Descriptor> {
        let value = parse_document(label, text)?;
        self.load_value(label, &value)
    }

    /// Validates an already-parsed document.
    pub fn load_value(&self, path: &str, value: &Value) -> Result<Descriptor> {
        let descriptor = self
            .build(path, value)
            .map_err(|violation| MetafileError::schema(path, violation))?;
        debug!(
            path,
            version = descriptor.schema_version(),
            stub = descriptor.is_stub(),
            "Loaded package metafile"
        );
        Ok(descriptor)
    }

    fn build(
        &self,
        path: &str,
        value: &Value,
    ) -> std::result::Result<Descriptor, SchemaViolation> {
        if is_empty_document(value) {
            return Ok(Descriptor::stub(path));
        }
        let Value::Mapping(doc) = value else {
            return Err(SchemaViolation::NonMappingRoot);
        };

        let version = config_version(doc)?;
        let common = common_fields(doc, version)?;

        let extractor = self
            .extractors
            .get(&version)
            .ok_or(SchemaViolation::NoExtractor(version))?;
        trace!(path, version, "Dispatching to schema extractor");
        let deps = extractor.extract(doc, &common)?;

        if let Some(validator) = &self.author_validator {
            check_authors(common.authors.as_deref(), validator.as_ref())?;
        }

        Ok(Descriptor::assemble(path, common, deps))
    }
}
