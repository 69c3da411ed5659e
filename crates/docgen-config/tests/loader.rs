use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use docgen_config::{Config, ConfigError, ConfigSourceKind, LoadOptions, Pattern};
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create config");
    file.write_all(contents.as_bytes()).expect("write config");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

fn pattern_strings<'a, I>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Pattern>,
{
    patterns
        .into_iter()
        .map(|p| p.original().to_string())
        .collect()
}

#[test]
fn loads_defaults_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let config = Config::load(LoadOptions::default().with_working_dir(working_dir.clone()))
        .expect("load defaults");

    assert_eq!(config.cwd, working_dir);
    assert!(config.components_root.as_os_str().is_empty());
    assert_eq!(config.components_dir(), working_dir);
    assert_eq!(config.out_dir, working_dir.join("docs"));
    assert_eq!(
        pattern_strings(config.components.iter()),
        vec!["**/[a-zA-Z]*.{vue,jsx,tsx}".to_string()]
    );
    assert!(config.out_file.is_none());
    assert!(!config.watch);
    assert!(config.templates.component.is_none());

    assert_eq!(config.sources.layers.len(), 1);
    assert_eq!(config.sources.layers[0].kind, ConfigSourceKind::Default);
}

#[test]
fn applies_precedence_and_resolves_paths_per_layer() {
    let temp = TempDir::new().expect("tempdir");
    let workspace = canonical(temp.path());

    write_file(
        workspace.join("docgen.config.toml"),
        r#"
        components_root = "src/components"
        components = "**/*.vue"
        out_dir = "docs/components"

        [templates]
        component = "templates/component.hbs"
        "#,
    );

    let overrides = workspace.join("ci");
    fs::create_dir(&overrides).expect("create override dir");
    let override_path = overrides.join("docgen.ci.toml");
    write_file(
        &override_path,
        r#"
        out_file = "all-components.md"
        watch = true
        "#,
    );

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(&workspace)
            .with_override_path(&override_path),
    )
    .expect("load config with precedence");

    assert_eq!(config.components_root, workspace.join("src/components"));
    assert_eq!(config.components_dir(), workspace.join("src/components"));
    assert_eq!(
        pattern_strings(config.components.iter()),
        vec!["**/*.vue".to_string()]
    );
    assert_eq!(config.out_dir, workspace.join("docs/components"));
    assert_eq!(config.out_file, Some(overrides.join("all-components.md")));
    assert!(config.watch);
    assert_eq!(
        config.templates.component,
        Some(workspace.join("templates/component.hbs"))
    );

    let kinds: Vec<_> = config
        .sources
        .layers
        .iter()
        .map(|layer| layer.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ConfigSourceKind::Default,
            ConfigSourceKind::Local,
            ConfigSourceKind::Override
        ]
    );
}

#[test]
fn missing_override_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let err = Config::load(
        LoadOptions::default()
            .with_working_dir(&working_dir)
            .with_override_path("nope.toml"),
    )
    .expect_err("override must exist");

    match err {
        ConfigError::OverrideNotFound { path } => {
            assert_eq!(path, working_dir.join("nope.toml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(working_dir.join("docgen.config.toml"), "out_dir = [");

    let err = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect_err("expected parse failure");

    assert!(matches!(err, ConfigError::Parse { .. }), "got {err}");
}

#[test]
fn unknown_keys_are_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(working_dir.join("docgen.config.toml"), "outDir = \"docs\"\n");

    let err = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect_err("expected parse failure");

    assert!(err.to_string().contains("failed to parse config"));
}

#[test]
fn invalid_glob_pattern_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join("docgen.config.toml"),
        r#"
        components = ["[["]
        "#,
    );

    let err = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect_err("expected validation failure");

    match err {
        ConfigError::Validation(errors) => {
            let joined = errors.to_string();
            assert!(
                joined.contains("invalid glob pattern '[['"),
                "unexpected error output: {joined}"
            );
            assert!(joined.contains("local config at"), "{joined}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_component_list_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(working_dir.join("docgen.config.toml"), "components = []\n");

    let err = Config::load(LoadOptions::default().with_working_dir(&working_dir))
        .expect_err("expected validation failure");

    assert!(err
        .to_string()
        .contains("at least one component pattern is required"));
}
