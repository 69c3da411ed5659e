//! Shared test harness utilities for docgen crates.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use docgen_config::Config;
use docgen_core::{TemplateEngine, TemplateError};
use docgen_format::{FormatOptions, FormatResult, MarkdownFormatter};

/// Returns a baseline configuration rooted at `dir`.
pub fn test_config(dir: impl Into<PathBuf>) -> Config {
    Config::for_working_dir(dir)
}

/// Write `contents` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(&path, contents).expect("write file");
    path
}

/// Formatter that records every request and answers with a fixed string.
#[derive(Clone, Debug)]
pub struct RecordingFormatter {
    output: String,
    calls: Arc<Mutex<Vec<(String, FormatOptions)>>>,
}

impl RecordingFormatter {
    pub fn returning(output: impl Into<String>) -> Self {
        RecordingFormatter {
            output: output.into(),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, FormatOptions)> {
        self.calls.lock().expect("formatter calls").clone()
    }
}

impl MarkdownFormatter for RecordingFormatter {
    fn format(&self, text: &str, options: &FormatOptions) -> FormatResult<String> {
        self.calls
            .lock()
            .expect("formatter calls")
            .push((text.to_owned(), *options));
        Ok(self.output.clone())
    }
}

/// Arguments captured from one template engine invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineCall {
    pub absolute_path: PathBuf,
    pub config_cwd: PathBuf,
    pub component_path: String,
    pub extra_content: Option<String>,
}

/// Template engine that records its arguments and renders `# <component>`,
/// followed by the extra content when present.
#[derive(Clone, Debug, Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("engine calls").clone()
    }
}

impl TemplateEngine for RecordingEngine {
    fn compile_templates(
        &self,
        absolute_path: &Path,
        config: &Config,
        component_path: &str,
        extra_content: Option<&str>,
    ) -> Result<String, TemplateError> {
        self.calls.lock().expect("engine calls").push(EngineCall {
            absolute_path: absolute_path.to_path_buf(),
            config_cwd: config.cwd.clone(),
            component_path: component_path.to_owned(),
            extra_content: extra_content.map(str::to_owned),
        });

        let mut rendered = format!("# {component_path}\n");
        if let Some(extra) = extra_content {
            rendered.push('\n');
            rendered.push_str(extra);
        }
        Ok(rendered)
    }
}

/// Strategy spy: records every path `doc_file_name` is asked about.
#[derive(Clone, Debug, Default)]
pub struct DocFileNameSpy {
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl DocFileNameSpy {
    /// Install the spy on `config`; every lookup answers `answer`.
    pub fn install(&self, config: Config, answer: Option<PathBuf>) -> Config {
        let calls = Arc::clone(&self.calls);
        config.with_doc_file_name(move |full_path| {
            calls
                .lock()
                .expect("doc file calls")
                .push(full_path.to_path_buf());
            answer.clone()
        })
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().expect("doc file calls").clone()
    }
}
