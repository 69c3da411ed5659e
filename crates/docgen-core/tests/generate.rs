use std::fs;
use std::path::Path;

use docgen_core::{Docgen, DocgenError, TemplateError, WatchEvent};
use docgen_test_support::{test_config, write_file, RecordingEngine};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn project() -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path(), "src/components/Button.vue", "<template/>");
    write_file(
        temp.path(),
        "src/components/Button.md",
        "Use for *primary* actions.   \n",
    );
    write_file(temp.path(), "src/components/forms/Input.vue", "<template/>");
    temp
}

fn config_for(temp: &TempDir) -> docgen_core::Config {
    let mut config = test_config(temp.path());
    config.components_root = "src/components".into();
    config
}

#[tokio::test]
async fn generates_one_formatted_file_per_component() {
    let temp = project();
    let docgen = Docgen::new(config_for(&temp)).expect("docgen");

    let report = docgen.generate_all().await.expect("generate");

    assert!(report.is_success());
    let docs = temp.path().join("docs");
    assert_eq!(
        report.written,
        vec![docs.join("Button.md"), docs.join("forms/Input.md")]
    );

    let button = fs::read_to_string(docs.join("Button.md")).expect("button docs");
    assert_eq!(
        button,
        "# Button\n\nSource: `Button.vue`\n\nUse for *primary* actions.\n"
    );
    let input = fs::read_to_string(docs.join("forms/Input.md")).expect("input docs");
    assert_eq!(input, "# Input\n\nSource: `forms/Input.vue`\n");
}

#[tokio::test]
async fn engine_receives_paths_rooted_at_components_dir() {
    let temp = project();
    let engine = RecordingEngine::new();
    let docgen = Docgen::new(config_for(&temp))
        .expect("docgen")
        .with_engine(engine.clone());

    docgen.generate_all().await.expect("generate");

    let root = temp.path().join("src/components");
    let mut calls = engine.calls();
    calls.sort_by(|a, b| a.component_path.cmp(&b.component_path));
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].component_path, "Button.vue");
    assert_eq!(calls[0].absolute_path, root.join("Button.vue"));
    assert_eq!(
        calls[0].extra_content.as_deref(),
        Some("Use for *primary* actions.   \n")
    );
    assert_eq!(calls[1].component_path, "forms/Input.vue");
    assert_eq!(calls[1].extra_content, None);
}

#[tokio::test]
async fn failing_components_do_not_stop_the_rest() {
    let temp = project();
    let engine = |_: &Path, _: &docgen_core::Config, name: &str, _: Option<&str>| {
        if name.starts_with("forms/") {
            Err(TemplateError::Other("cannot document forms".into()))
        } else {
            Ok(format!("# {name}"))
        }
    };
    let docgen = Docgen::new(config_for(&temp))
        .expect("docgen")
        .with_engine(engine);

    let report = docgen.generate_all().await.expect("generate");

    assert_eq!(report.written, vec![temp.path().join("docs/Button.md")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].component, "forms/Input.vue");
    assert!(matches!(
        report.failures[0].error,
        DocgenError::Template { .. }
    ));
    assert!(!temp.path().join("docs/forms/Input.md").exists());
}

#[tokio::test]
async fn single_file_mode_concatenates_in_discovery_order() {
    let temp = project();
    let mut config = config_for(&temp);
    let out_file = temp.path().join("COMPONENTS.md");
    config.out_file = Some(out_file.clone());
    let docgen = Docgen::new(config).expect("docgen");

    let report = docgen.generate_all().await.expect("generate");

    assert_eq!(report.written, vec![out_file.clone()]);
    let combined = fs::read_to_string(&out_file).expect("combined docs");
    assert_eq!(
        combined,
        "# Button\n\nSource: `Button.vue`\n\nUse for *primary* actions.\n\n# Input\n\nSource: `forms/Input.vue`\n"
    );
    assert!(!temp.path().join("docs").exists());
}

#[tokio::test]
async fn custom_dest_strategy_is_honoured() {
    let temp = project();
    let config = config_for(&temp).with_dest_file(|component, config| {
        let name = component.file_stem().unwrap_or_default();
        config.out_dir.join("flat").join(name).with_extension("md")
    });
    let docgen = Docgen::new(config).expect("docgen");

    let report = docgen.generate_all().await.expect("generate");

    let flat = temp.path().join("docs/flat");
    assert_eq!(
        report.written,
        vec![flat.join("Button.md"), flat.join("Input.md")]
    );
}

#[tokio::test]
async fn custom_template_from_config_is_used() {
    let temp = project();
    let template = write_file(temp.path(), "templates/component.hbs", "## {{display_name}}!\n");
    let mut config = config_for(&temp);
    config.templates.component = Some(template);
    let docgen = Docgen::new(config).expect("docgen");

    docgen.generate("Button.vue").await.expect("generate");

    let button = fs::read_to_string(temp.path().join("docs/Button.md")).expect("docs");
    assert_eq!(button, "## Button!\n");
}

#[tokio::test]
async fn missing_custom_template_fails_at_setup() {
    let temp = project();
    let mut config = config_for(&temp);
    config.templates.component = Some(temp.path().join("nope.hbs"));

    let err = Docgen::new(config).err().expect("template must exist");

    assert!(matches!(
        err,
        DocgenError::TemplateLoad(TemplateError::Io { .. })
    ));
}

#[tokio::test]
async fn changes_map_back_to_their_component() {
    let temp = project();
    let docgen = Docgen::new(config_for(&temp)).expect("docgen");
    let root = temp.path().join("src/components");

    assert_eq!(
        docgen.component_for(&root.join("forms/Input.vue")).expect("lookup"),
        Some("forms/Input.vue".to_string())
    );
    assert_eq!(
        docgen.component_for(&root.join("Button.md")).expect("lookup"),
        Some("Button.vue".to_string())
    );
    assert_eq!(
        docgen.component_for(&root.join("README.txt")).expect("lookup"),
        None
    );
    assert_eq!(
        docgen
            .component_for(&temp.path().join("docs/Button.md"))
            .expect("lookup"),
        None
    );
}

#[tokio::test]
async fn regenerate_for_rewrites_only_the_affected_component() {
    let temp = project();
    let docgen = Docgen::new(config_for(&temp)).expect("docgen");
    let root = temp.path().join("src/components");
    fs::write(root.join("Button.md"), "Now with icons.").expect("update doc file");

    let report = docgen
        .regenerate_for(&root.join("Button.md"))
        .await
        .expect("regenerate");

    assert_eq!(report.written, vec![temp.path().join("docs/Button.md")]);
    let button = fs::read_to_string(temp.path().join("docs/Button.md")).expect("docs");
    assert!(button.ends_with("Now with icons.\n"));
    assert!(!temp.path().join("docs/forms/Input.md").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn dangling_links_do_not_block_generation() {
    let temp = project();
    std::os::unix::fs::symlink(
        temp.path().join("gone"),
        temp.path().join("src/components/stale-link"),
    )
    .expect("symlink");
    let docgen = Docgen::new(config_for(&temp)).expect("docgen");

    let report = docgen.generate_all().await.expect("generate");

    assert!(report.is_success());
    assert_eq!(report.written.len(), 2);
    assert!(temp.path().join("docs/Button.md").exists());
}

#[tokio::test]
async fn change_events_keep_working_after_a_failed_regeneration() {
    let temp = project();
    let blocker = write_file(temp.path(), "blocked", "a file, not a directory");
    let mut config = config_for(&temp);
    config.out_file = Some(blocker.join("COMPONENTS.md"));
    let docgen = Docgen::new(config).expect("docgen");
    let changed = temp.path().join("src/components/Button.vue");

    let failed = docgen
        .handle_event(WatchEvent::Changed(changed.clone()))
        .await;
    assert!(failed.written.is_empty());

    fs::remove_file(&blocker).expect("remove blocker");
    let recovered = docgen.handle_event(WatchEvent::Changed(changed)).await;

    assert_eq!(recovered.written, vec![blocker.join("COMPONENTS.md")]);
    assert!(blocker.join("COMPONENTS.md").exists());
}

#[tokio::test]
async fn removal_events_leave_documentation_in_place() {
    let temp = project();
    let docgen = Docgen::new(config_for(&temp)).expect("docgen");
    docgen.generate_all().await.expect("generate");

    let report = docgen
        .handle_event(WatchEvent::Removed(
            temp.path().join("src/components/Button.vue"),
        ))
        .await;

    assert!(report.written.is_empty());
    assert!(temp.path().join("docs/Button.md").exists());
}
