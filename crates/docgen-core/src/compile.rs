use std::path::Path;

use docgen_config::Config;
use tokio::fs;
use tracing::debug;

use crate::error::{DocgenError, DocgenResult};
use crate::paths::normalize_path;
use crate::template::TemplateEngine;

/// Compile the documentation for `component_path`, a path relative to
/// `config.cwd`.
///
/// The supplementary markdown named by `config.doc_file_name` is read when it
/// exists; a missing or unreadable file simply means no extra content. The
/// engine receives the components root joined with `component_path`, the
/// configuration, the unmodified `component_path`, and the extra content.
pub async fn compile_markdown(
    config: &Config,
    component_path: &str,
    engine: &dyn TemplateEngine,
) -> DocgenResult<String> {
    let full_path = normalize_path(&config.cwd.join(component_path));

    let extra_content = match config.doc_file_name(&full_path) {
        Some(doc_path) => read_supplementary(&doc_path).await,
        None => None,
    };

    let root_relative = normalize_path(&config.components_root.join(component_path));

    engine
        .compile_templates(
            &root_relative,
            config,
            component_path,
            extra_content.as_deref(),
        )
        .map_err(|source| DocgenError::Template {
            component: component_path.to_owned(),
            source,
        })
}

async fn read_supplementary(doc_path: &Path) -> Option<String> {
    match fs::read_to_string(doc_path).await {
        Ok(content) => Some(content),
        Err(err) => {
            debug!(path = %doc_path.display(), error = %err, "no supplementary documentation");
            None
        }
    }
}
