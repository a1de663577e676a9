//! Descriptor type definitions and query methods.
//!
//! A [`Descriptor`] is the validated, immutable form of a package metafile.
//! Every field is private; the query methods are the only way to read it, so
//! a descriptor handed out by the loader cannot drift from what was validated.

use serde::Serialize;
use serde_yaml::Value;

use crate::error::{MetafileError, Result};
use crate::template::CommandContext;
use crate::validate::check_authors;

/// Newest metafile format version this crate understands.
///
/// Only bump this when package metafiles have to change format in a way that
/// is not backwards compatible.
pub const METAFILE_VERSION: u32 = 0;

/// Fields shared by every schema version, extracted before version dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonFields {
    /// Schema version the document declared.
    pub schema_version: u32,
    pub uuid: Option<String>,
    /// Authors, element types unchecked.
    pub authors: Option<Vec<Value>>,
    /// Description with surrounding whitespace trimmed.
    pub description: Option<String>,
    pub version: Option<String>,
    pub name: Option<String>,
    pub help: Option<String>,
}

/// Dependency and build fields produced by a version-specific extractor.
///
/// An empty vector means "absent"; [`Descriptor::assemble`] normalizes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyFields {
    pub requires: Vec<String>,
    pub build_requires: Vec<String>,
    pub variants: Vec<Vec<String>>,
    pub commands: Vec<String>,
}

/// Validated, immutable package metadata.
///
/// List-valued fields are either absent or non-empty; "present but empty"
/// cannot be represented.
///
/// # Examples
///
/// ```
/// use metafile_core::Loader;
///
/// let yaml = r#"
/// config_version: 0
/// name: foo
/// version: 1.2.0
/// requires: [python-2.6]
/// build_requires: [cmake-2.8, boost-1.47]
/// "#;
/// let descriptor = Loader::new().load_str("foo/package.yaml", yaml).unwrap();
///
/// assert_eq!(descriptor.name(), Some("foo"));
/// assert_eq!(
///     descriptor.requires(true).unwrap(),
///     vec!["cmake-2.8", "boost-1.47", "python-2.6"]
/// );
/// assert_eq!(descriptor.requires(false).unwrap(), vec!["python-2.6"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    #[serde(rename = "config_version")]
    schema_version: u32,
    #[serde(skip)]
    source_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authors: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requires: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build_requires: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variants: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commands: Option<Vec<String>>,
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

impl Descriptor {
    /// Builds a descriptor from already-validated parts.
    ///
    /// Empty dependency lists become absent fields.
    pub fn assemble(
        source_path: impl Into<String>,
        common: CommonFields,
        deps: DependencyFields,
    ) -> Self {
        Self {
            schema_version: common.schema_version,
            source_path: source_path.into(),
            uuid: common.uuid,
            authors: common.authors,
            description: common.description,
            name: common.name,
            version: common.version,
            help: common.help,
            requires: non_empty(deps.requires),
            build_requires: non_empty(deps.build_requires),
            variants: non_empty(deps.variants),
            commands: non_empty(deps.commands),
        }
    }

    /// The descriptor of an empty metafile: version 0, every field absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use metafile_core::Descriptor;
    ///
    /// let stub = Descriptor::stub("third_party/zlib/package.yaml");
    /// assert!(stub.is_stub());
    /// assert_eq!(stub.schema_version(), 0);
    /// assert!(stub.requires(true).is_none());
    /// ```
    pub fn stub(source_path: impl Into<String>) -> Self {
        Self::assemble(
            source_path,
            CommonFields::default(),
            DependencyFields::default(),
        )
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Path string this descriptor was loaded from, exactly as given.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    pub fn authors(&self) -> Option<&[Value]> {
        self.authors.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Returns `true` if nothing beyond the default version was declared.
    pub fn is_stub(&self) -> bool {
        *self == Self::stub(self.source_path.clone())
    }

    /// Required package names, if any.
    ///
    /// With `include_build_requires`, build requirements come first, followed
    /// by runtime requirements. Build requirements tend to be more tightly
    /// versioned, so a resolver that sees them first narrows the search
    /// sooner. An empty merge yields `None`, never an empty vector.
    pub fn requires(&self, include_build_requires: bool) -> Option<Vec<String>> {
        if !include_build_requires {
            return self.requires.clone();
        }
        let merged: Vec<String> = self
            .build_requires
            .iter()
            .chain(self.requires.iter())
            .flatten()
            .cloned()
            .collect();
        non_empty(merged)
    }

    /// Build-only requirements, if any.
    pub fn build_requires(&self) -> Option<&[String]> {
        self.build_requires.as_deref()
    }

    /// Build variants, if any. Each variant is an ordered list of dimension
    /// values.
    pub fn variants(&self) -> Option<&[Vec<String>]> {
        self.variants.as_deref()
    }

    /// Raw command templates, placeholders unsubstituted.
    pub fn commands(&self) -> Option<&[String]> {
        self.commands.as_deref()
    }

    /// Commands with placeholders substituted from `context`.
    ///
    /// Returns `None` when the metafile declares no commands.
    ///
    /// # Examples
    ///
    /// ```
    /// use metafile_core::{CommandContext, Loader};
    ///
    /// let yaml = "config_version: 0\ncommands: ['export PATH=!ROOT!/bin:$PATH']\n";
    /// let descriptor = Loader::new().load_str("pkg.yaml", yaml).unwrap();
    /// let context = CommandContext::new("1.0", "/base", "/pkgs/foo/1.0");
    /// assert_eq!(
    ///     descriptor.render_commands(&context).unwrap(),
    ///     vec!["export PATH=/pkgs/foo/1.0/bin:$PATH"]
    /// );
    /// ```
    pub fn render_commands(&self, context: &CommandContext) -> Option<Vec<String>> {
        let commands = self.commands.as_ref()?;
        Some(commands.iter().map(|cmd| context.render(cmd)).collect())
    }

    /// Checks every author against `check`.
    ///
    /// Used at release time to keep packages from going out with stale author
    /// information. Authors are rendered to text before the check.
    pub fn validate_authors(&self, check: impl Fn(&str) -> bool) -> Result<()> {
        check_authors(self.authors(), &check)
            .map_err(|violation| MetafileError::schema(&self.source_path, violation))
    }
}
