//! Descriptor caching and tool configuration for package metafiles.
//!
//! This crate sits in front of [`metafile_core`]:
//!
//! - [`DescriptorCache`] guarantees that each metafile path is parsed at most
//!   once and that repeated lookups share one [`Descriptor`] instance.
//! - [`ToolConfig`] is the YAML configuration consumers use to control
//!   command templating and default requirement views.
//!
//! # Quick start
//!
//! ```no_run
//! use metafile_db::{DescriptorCache, ToolConfig};
//!
//! let cache = DescriptorCache::new();
//! let config = ToolConfig::load("metafile.yaml").unwrap_or_default();
//!
//! let descriptor = cache.get_or_load("/pkgs/foo/1.0/package.yaml").unwrap();
//! if let Some(requires) = descriptor.requires(config.include_build_requires) {
//!     println!("foo requires {}", requires.join(" "));
//! }
//! ```
//!
//! [`Descriptor`]: metafile_core::Descriptor

mod cache;
mod config;
mod error;

pub use cache::DescriptorCache;
pub use config::ToolConfig;
pub use error::{DatabaseError, Result};
