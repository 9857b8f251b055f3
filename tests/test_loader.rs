//! Loading sources from disk and building them.

use std::fs;

use yang_reactor::project::{LoadError, load_directory, load_file};
use yang_reactor::{SourceIdentifier, build};

#[test]
fn test_load_directory_and_build() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("deps")).unwrap();
    fs::write(
        dir.path().join("deps/foo.yang"),
        "module foo { namespace urn:foo; prefix foo; container top { } }",
    )
    .unwrap();
    fs::write(
        dir.path().join("bar.yang"),
        r#"module bar { namespace urn:bar; prefix bar; import foo { prefix foo; }
            augment "/foo:top" { leaf y { type string; } } }"#,
    )
    .unwrap();
    fs::write(dir.path().join("README"), "not a module").unwrap();

    let sources = load_directory(dir.path()).unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].identifier(), &SourceIdentifier::new("bar", None));
    assert_eq!(sources[1].name().as_ref(), format!("deps{}foo.yang", std::path::MAIN_SEPARATOR));

    let model = build(&sources).unwrap();
    assert!(model.find_schema_path("/foo:top/bar:y").is_some());
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_directory(dir.path()).unwrap().is_empty());
}

#[test]
fn test_not_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("m.yang");
    fs::write(&file, "module m { namespace urn:m; prefix m; }").unwrap();
    assert!(matches!(load_directory(&file), Err(LoadError::NotADirectory(_))));

    let source = load_file(&file).unwrap();
    assert_eq!(source.identifier().name, "m");
}
