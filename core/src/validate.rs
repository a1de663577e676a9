//! Field-level schema rules.
//!
//! Each helper pulls one key out of a metafile mapping and enforces the shape
//! the schema expects of it. List fields are validated shallowly: only the
//! first element is type-checked, and later elements are rendered to text
//! without complaint. A document with a bad element further down the list is
//! therefore accepted.
//!
//! # Examples
//!
//! ```
//! use metafile_core::{Loader, SchemaViolation};
//!
//! let loader = Loader::new();
//! let err = loader
//!     .load_str("pkg.yaml", "config_version: 0\nrequires: python-2.6\n")
//!     .unwrap_err();
//! assert_eq!(err.violation(), Some(&SchemaViolation::NonListField("requires")));
//! ```

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::types::{CommonFields, METAFILE_VERSION};

/// Schema rules a metafile can break.
///
/// The `Display` impl completes a sentence that starts with
/// `package metafile '<path>'`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// Root node is a sequence or scalar.
    #[error("contains non-dictionary root node")]
    NonMappingRoot,
    /// Non-empty document without `config_version`.
    #[error("is missing 'config_version'")]
    MissingConfigVersion,
    /// `config_version` cannot be read as an integer.
    #[error("contains invalid config version '{0}'")]
    InvalidConfigVersion(String),
    /// `config_version` is an integer outside the supported range.
    #[error(
        "contains unsupported config version '{0}' (supported: 0 to {max})",
        max = METAFILE_VERSION
    )]
    UnsupportedConfigVersion(i64),
    /// Supported version with no registered extractor.
    #[error("uses config version {0}, which has no registered extractor")]
    NoExtractor(u32),
    /// `authors` is present but not a list.
    #[error("contains 'authors' entry which is not a list")]
    AuthorsNotList,
    /// A list field holds something other than a list.
    #[error("contains non-list '{0}' node")]
    NonListField(&'static str),
    /// A string-list field starts with a non-string element.
    #[error("contains non-string '{0}' entries")]
    NonStringEntries(&'static str),
    /// `variants` starts with a non-list element.
    #[error("contains non-list '{0}' entries")]
    NonListEntries(&'static str),
    /// The installed author validator rejected an author.
    #[error("contains invalid user as author: '{0}'")]
    InvalidAuthor(String),
}

/// Returns `true` if `value` denotes a stub package: null, or an empty
/// mapping, sequence, or string.
pub(crate) fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(map) => map.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Reads the mandatory `config_version` key and coerces it to a supported
/// version number.
pub(crate) fn config_version(doc: &Mapping) -> Result<u32, SchemaViolation> {
    let raw = doc
        .get("config_version")
        .ok_or(SchemaViolation::MissingConfigVersion)?;
    let version = coerce_integer(raw)
        .ok_or_else(|| SchemaViolation::InvalidConfigVersion(render_flow(raw)))?;
    if version < 0 || version > i64::from(METAFILE_VERSION) {
        return Err(SchemaViolation::UnsupportedConfigVersion(version));
    }
    u32::try_from(version).map_err(|_| SchemaViolation::UnsupportedConfigVersion(version))
}

/// Lenient integer conversion: integers pass through, finite floats truncate
/// toward zero, booleans are 0/1, strings are trimmed and parsed as decimal.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else if let Some(u) = n.as_u64() {
                Some(i64::try_from(u).unwrap_or(i64::MAX))
            } else {
                n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
            }
        }
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Tagged(tagged) => coerce_integer(&tagged.value),
        _ => None,
    }
}

/// Extracts the fields shared by every schema version.
pub(crate) fn common_fields(
    doc: &Mapping,
    schema_version: u32,
) -> Result<CommonFields, SchemaViolation> {
    let authors = match doc.get("authors") {
        None => None,
        Some(Value::Sequence(items)) => Some(items.clone()),
        Some(_) => return Err(SchemaViolation::AuthorsNotList),
    };

    Ok(CommonFields {
        schema_version,
        uuid: scalar_field(doc, "uuid"),
        authors,
        description: scalar_field(doc, "description").map(|d| d.trim().to_string()),
        version: scalar_field(doc, "version"),
        name: scalar_field(doc, "name"),
        help: scalar_field(doc, "help"),
    })
}

/// Reads an optional string field. Any value is coerced to text, collections
/// in flow style; `null` counts as absent.
pub fn scalar_field(doc: &Mapping, key: &str) -> Option<String> {
    match doc.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(render_flow(value)),
    }
}

/// Reads an optional list field. An absent key or an empty list both yield
/// `None`.
pub fn list_field<'a>(
    doc: &'a Mapping,
    key: &'static str,
) -> Result<Option<&'a [Value]>, SchemaViolation> {
    match doc.get(key) {
        None => Ok(None),
        Some(Value::Sequence(items)) if items.is_empty() => Ok(None),
        Some(Value::Sequence(items)) => Ok(Some(items.as_slice())),
        Some(_) => Err(SchemaViolation::NonListField(key)),
    }
}

/// Reads a list of strings, checking only the first element.
///
/// Partial validation: elements after the first are rendered with
/// [`render_lenient`] whatever their type.
pub fn string_list(doc: &Mapping, key: &'static str) -> Result<Vec<String>, SchemaViolation> {
    let Some(items) = list_field(doc, key)? else {
        return Ok(Vec::new());
    };
    if !matches!(items.first(), Some(Value::String(_))) {
        return Err(SchemaViolation::NonStringEntries(key));
    }
    Ok(items.iter().map(render_lenient).collect())
}

/// Reads a list of lists, checking only that the first element is a list.
///
/// Partial validation: the first variant's elements are not checked, and a
/// later non-list variant becomes a single-element variant.
pub fn variant_list(
    doc: &Mapping,
    key: &'static str,
) -> Result<Vec<Vec<String>>, SchemaViolation> {
    let Some(items) = list_field(doc, key)? else {
        return Ok(Vec::new());
    };
    if !matches!(items.first(), Some(Value::Sequence(_))) {
        return Err(SchemaViolation::NonListEntries(key));
    }
    Ok(items
        .iter()
        .map(|item| match item {
            Value::Sequence(dims) => dims.iter().map(render_lenient).collect(),
            other => vec![render_lenient(other)],
        })
        .collect())
}

/// Runs `check` over every author, rendered to text.
pub(crate) fn check_authors(
    authors: Option<&[Value]>,
    check: &dyn Fn(&str) -> bool,
) -> Result<(), SchemaViolation> {
    for author in authors.unwrap_or_default() {
        let author = render_lenient(author);
        if !check(&author) {
            return Err(SchemaViolation::InvalidAuthor(author));
        }
    }
    Ok(())
}

/// Text form of a scalar, or `None` for sequences, mappings and null.
fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => render_scalar(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Text form of any value: scalars as themselves, null as `""`, collections
/// in single-line flow style.
pub fn render_lenient(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => render_flow(other),
    }
}

fn render_flow(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Sequence(items) => {
            let inner: Vec<String> = items.iter().map(render_flow).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Mapping(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", render_flow(k), render_flow(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, render_flow(&tagged.value)),
        scalar => render_scalar(scalar).unwrap_or_default(),
    }
}
