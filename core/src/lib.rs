//! Versioned loading, validation, and querying of package metafiles.
//!
//! A package metafile is a small YAML document describing a package's
//! identity, its runtime and build-time requirements, its build variants, and
//! the shell commands that set up its environment. This crate is the trust
//! boundary between that document and the rest of a resolver toolchain:
//!
//! - [`Loader`] reads a file, checks its root shape and `config_version`, and
//!   dispatches to the [`SchemaExtractor`] for that version.
//! - [`Descriptor`] is the immutable result, with queries such as
//!   [`Descriptor::requires`] (build requirements merged first).
//! - [`CommandContext`] substitutes `!VERSION!`, `!ROOT!`, `!USER!` and the
//!   other placeholders in setup commands.
//!
//! Syntax failures ([`MetafileError::Syntax`]) are reported separately from
//! schema failures ([`MetafileError::Schema`]), which carry a
//! [`SchemaViolation`] naming the broken rule.
//!
//! # Example
//!
//! ```
//! use metafile_core::*;
//!
//! let yaml = r#"
//! config_version: 0
//! name: maya
//! version: 2012.5
//! requires: [python-2.6]
//! variants:
//!   - [lin64]
//!   - [osx]
//! commands:
//!   - export MAYA_VERSION=!MAJOR_VERSION!
//!   - export MAYA_ROOT=!ROOT!
//! "#;
//!
//! let descriptor = Loader::new().load_str("maya/package.yaml", yaml).unwrap();
//! assert_eq!(descriptor.version(), Some("2012.5"));
//! assert_eq!(descriptor.variants().unwrap().len(), 2);
//!
//! let context = CommandContext::new("2012.5", "/pkgs/maya", "/pkgs/maya/2012.5")
//!     .with_user(Some("alice".into()));
//! assert_eq!(
//!     descriptor.render_commands(&context).unwrap(),
//!     vec!["export MAYA_VERSION=2012", "export MAYA_ROOT=/pkgs/maya/2012.5"]
//! );
//! ```

mod document;
mod error;
mod loader;
mod template;
mod types;
mod validate;

pub use document::{parse_document, read_document};
pub use error::{MetafileError, Result};
pub use loader::{Loader, SchemaExtractor, VersionZero};
pub use template::{CommandContext, UNKNOWN_USER, USER_ENV, VersionParts, render_commands};
pub use types::{CommonFields, DependencyFields, Descriptor, METAFILE_VERSION};
pub use validate::{
    SchemaViolation, list_field, render_lenient, scalar_field, string_list, variant_list,
};
