// tests/recipe.rs

//! Recipe ingestion integration tests
//!
//! Exercises the public ingestion pipeline end to end: schema
//! validation, template rendering and source URL validation.

use mere::{Error, Recipe};
use std::io::Write;
use std::path::Path;

const DUMMY_B3SUM: &str = "8c312c270003dd6c40fc01b048efc664308ecadf14c4bfcee7980fb59bed4d16";

fn write_recipe(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_home_template_renders_verbatim_into_url() {
    let file = write_recipe(&format!(
        concat!(
            "name: x\n",
            "home: https://x\n",
            "version: '1'\n",
            "release: 1\n",
            "sources:\n",
            "  - url: '{{{{.Home}}}}/file.tar.gz'\n",
            "    b3sum: {}\n",
        ),
        DUMMY_B3SUM
    ));
    let cache = tempfile::tempdir().unwrap();
    let recipe = Recipe::with_cache(file.path(), cache.path()).unwrap();
    assert_eq!(recipe.sources[0].url, "https://x/file.tar.gz");
    assert_eq!(recipe.sources[0].save_path(), cache.path().join("file.tar.gz"));
}

#[test]
fn test_release_as_string_names_field_and_kind() {
    let file = write_recipe("name: x\nversion: '1'\nrelease: '1'\n");
    let msg = Recipe::new(file.path()).unwrap_err().to_string();
    assert!(msg.contains("release"), "got: {msg}");
    assert!(msg.contains("integer"), "got: {msg}");
}

#[test]
fn test_b3sum_of_wrong_length_is_rejected() {
    for bad in [DUMMY_B3SUM[..63].to_string(), format!("{DUMMY_B3SUM}0")] {
        let file = write_recipe(&format!(
            "name: x\nversion: '1'\nrelease: 1\nsources:\n  - url: https://x/f.tar.gz\n    b3sum: {bad}\n"
        ));
        let err = Recipe::new(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::Schema { .. }), "got: {msg}");
        assert!(msg.contains("sources.0.b3sum"), "got: {msg}");
    }
}

#[test]
fn test_unsupported_scheme_is_rejected() {
    let file = write_recipe(&format!(
        "name: x\nversion: '1'\nrelease: 1\nsources:\n  - url: gxp://blergh/blargh\n    b3sum: {DUMMY_B3SUM}\n"
    ));
    match Recipe::new(file.path()).unwrap_err() {
        Error::UnsupportedScheme(scheme) => assert_eq!(scheme, "gxp"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scheme_less_url_is_rejected() {
    let file = write_recipe(&format!(
        "name: x\nversion: '1'\nrelease: 1\nsources:\n  - url: '://blergh'\n    b3sum: {DUMMY_B3SUM}\n"
    ));
    assert!(matches!(Recipe::new(file.path()).unwrap_err(), Error::MissingScheme));
}

#[test]
fn test_invalid_yaml_is_rejected() {
    let file = write_recipe("name: x\n  bad indent: [\n");
    let err = Recipe::new(file.path()).unwrap_err();
    assert!(matches!(err, Error::Yaml(_)));
}

#[test]
fn test_missing_recipe_file_is_an_io_error() {
    let err = Recipe::new(Path::new("testdata/no-such-recipe.yaml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_json_recipes_are_accepted() {
    // YAML is a superset of JSON, so a JSON document ingests unchanged.
    let file = write_recipe(&format!(
        r#"{{"name": "x", "version": "1", "release": 1, "sources": [{{"url": "https://x/f.tar.gz", "b3sum": "{DUMMY_B3SUM}"}}]}}"#
    ));
    let cache = tempfile::tempdir().unwrap();
    let recipe = Recipe::with_cache(file.path(), cache.path()).unwrap();
    assert_eq!(recipe.name, "x");
    assert_eq!(recipe.release, 1);
}

#[test]
fn test_package_files_are_template_rendered() {
    let file = write_recipe(concat!(
        "name: hello\nversion: '2.12'\nrelease: 1\n",
        "packages:\n",
        "  - name: hello\n",
        "    files: ['/usr/bin/{{.Name}}', '/usr/share/doc/{{.Name}}-{{.Version}}']\n",
    ));
    let recipe = Recipe::new(file.path()).unwrap();
    assert_eq!(
        recipe.packages[0].files,
        vec!["/usr/bin/hello", "/usr/share/doc/hello-2.12"]
    );
}
