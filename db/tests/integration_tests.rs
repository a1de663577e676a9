use std::fs;
use std::path::Path;
use std::sync::Arc;

use metafile_core::{CommandContext, Descriptor, Loader, SchemaViolation};
use metafile_db::{DescriptorCache, ToolConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MAYA: &str = r#"
config_version: 0
name: maya
version: 2012.5.1
description: "  Autodesk Maya  "
authors: [alice, bob]
requires:
  - python-2.6
build_requires:
  - cmake-2.8
  - boost-1.47
variants:
  - [lin64, centos-5]
  - [osx]
commands:
  - setup !VERSION! !USER!
  - export MAYA_LOCATION=!BASE!/!MAJOR_VERSION!/!MINOR_VERSION!
  - export PATH=!ROOT!/bin:$PATH
"#;

fn write(dir: &Path, name: &str, yaml: &str) -> String {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, yaml).unwrap();
    path.to_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Loading from disk
// ---------------------------------------------------------------------------

#[test]
fn test_full_metafile_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "maya/package.yaml", MAYA);

    let cache = DescriptorCache::new();
    let maya = cache.get_or_load(&path).unwrap();

    assert_eq!(maya.source_path(), path);
    assert_eq!(maya.name(), Some("maya"));
    assert_eq!(maya.version(), Some("2012.5.1"));
    assert_eq!(maya.description(), Some("Autodesk Maya"));
    assert_eq!(maya.authors().unwrap().len(), 2);
    assert_eq!(maya.requires(false).unwrap(), vec!["python-2.6"]);
    assert_eq!(
        maya.requires(true).unwrap(),
        vec!["cmake-2.8", "boost-1.47", "python-2.6"]
    );
    assert_eq!(maya.variants().unwrap().len(), 2);
    assert_eq!(maya.commands().unwrap().len(), 3);
}

#[test]
fn test_rendered_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "package.yaml", MAYA);
    let maya = DescriptorCache::new().get_or_load(&path).unwrap();

    let context = CommandContext::new("2.5.1", "/base", "/root").with_user(Some("alice".into()));
    assert_eq!(
        maya.render_commands(&context).unwrap(),
        vec![
            "setup 2.5.1 alice",
            "export MAYA_LOCATION=/base/2/5",
            "export PATH=/root/bin:$PATH",
        ]
    );

    let context = context.with_user(None);
    assert_eq!(
        maya.render_commands(&context).unwrap()[0],
        "setup 2.5.1 UNKNOWN_USER"
    );

    // Raw templates are untouched by rendering.
    assert_eq!(maya.commands().unwrap()[0], "setup !VERSION! !USER!");
}

#[test]
fn test_tool_config_drives_templating() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "package.yaml", MAYA);
    let config_path = write(
        dir.path(),
        "metafile.yaml",
        "user_env: METAFILE_INTEGRATION_UNSET_VAR\nunknown_user: builder\n",
    );

    let config = ToolConfig::load(&config_path).unwrap();
    let maya = DescriptorCache::new().get_or_load(&path).unwrap();
    let context = config.command_context("3", "/b", "/r");
    assert_eq!(
        maya.render_commands(&context).unwrap(),
        vec!["setup 3 builder", "export MAYA_LOCATION=/b/3/", "export PATH=/r/bin:$PATH"]
    );
}

#[test]
fn test_empty_file_is_stub() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "zlib/package.yaml", "");
    let stub = DescriptorCache::new().get_or_load(&path).unwrap();
    assert!(stub.is_stub());
    assert_eq!(stub.schema_version(), 0);
    assert!(stub.requires(true).is_none());
    assert!(stub.render_commands(&CommandContext::new("1", "", "")).is_none());
}

#[test]
fn test_syntax_and_schema_errors_distinguished() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(dir.path(), "broken.yaml", "config_version: 0\nrequires: [a\n");
    let invalid = write(dir.path(), "invalid.yaml", "- config_version: 0\n");
    let cache = DescriptorCache::new();

    let err = cache.get_or_load(&broken).unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(err.path(), broken);

    let err = cache.get_or_load(&invalid).unwrap_err();
    assert!(err.is_schema());
    assert_eq!(err.violation(), Some(&SchemaViolation::NonMappingRoot));
    assert_eq!(
        err.to_string(),
        format!("package metafile '{invalid}' contains non-dictionary root node")
    );
}

// ---------------------------------------------------------------------------
// Cache semantics
// ---------------------------------------------------------------------------

#[test]
fn test_failed_load_retried_after_fix() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "package.yaml", "name: foo\n");
    let cache = DescriptorCache::new();

    let err = cache.get_or_load(&path).unwrap_err();
    assert_eq!(err.violation(), Some(&SchemaViolation::MissingConfigVersion));
    assert!(!cache.contains(&path));

    fs::write(&path, "config_version: 0\nname: foo\n").unwrap();
    let fixed = cache.get_or_load(&path).unwrap();
    assert_eq!(fixed.name(), Some("foo"));
    assert!(Arc::ptr_eq(&fixed, &cache.get_or_load(&path).unwrap()));
}

#[test]
fn test_paths_are_not_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "package.yaml", "config_version: 0\n");
    let dotted = format!("{}/./package.yaml", dir.path().to_str().unwrap());
    let cache = DescriptorCache::new();

    let a = cache.get_or_load(&path).unwrap();
    let b = cache.get_or_load(&dotted).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(b.source_path(), dotted);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_concurrent_misses_load_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "package.yaml", MAYA);
    let cache = DescriptorCache::new();

    let loaded: Vec<Arc<Descriptor>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| cache.get_or_load(&path).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.len(), 1);
    for descriptor in &loaded {
        assert!(Arc::ptr_eq(descriptor, &loaded[0]));
    }
}

#[test]
fn test_author_validator_through_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "package.yaml", MAYA);
    let strict = DescriptorCache::with_loader(
        Loader::new().with_author_validator(|author| author == "alice"),
    );

    let err = strict.get_or_load(&path).unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&SchemaViolation::InvalidAuthor("bob".to_string()))
    );
    assert!(strict.is_empty());
}
