use std::path::{Path, PathBuf};
use std::sync::Arc;

use docgen_config::Config;
use docgen_format::{CanonicalFormatter, MarkdownFormatter};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::compile::compile_markdown;
use crate::discover::discover_components;
use crate::error::{DocgenError, DocgenResult};
use crate::paths::{component_key, normalize_path};
use crate::template::{HandlebarsEngine, TemplateEngine};
use crate::watch::{ComponentWatcher, WatchEvent};
use crate::writer::write_down_md_file;

/// A component whose documentation could not be produced.
#[derive(Debug)]
pub struct ComponentFailure {
    pub component: String,
    pub error: DocgenError,
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ComponentFailure>,
}

impl GenerateReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives discovery, compilation and writing for every configured component.
///
/// Component paths are relative to the components directory; the stored
/// configuration is rooted there so `compile_markdown` resolves them against
/// it.
pub struct Docgen {
    config: Config,
    engine: Arc<dyn TemplateEngine>,
    formatter: Arc<dyn MarkdownFormatter>,
}

impl Docgen {
    /// Build a driver with the handlebars engine (honouring the configured
    /// template) and the canonical formatter.
    pub fn new(config: Config) -> DocgenResult<Self> {
        let engine = HandlebarsEngine::from_config(&config).map_err(DocgenError::TemplateLoad)?;
        Ok(Self {
            config: config.rooted_at_components(),
            engine: Arc::new(engine),
            formatter: Arc::new(CanonicalFormatter),
        })
    }

    pub fn with_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn with_formatter(mut self, formatter: impl MarkdownFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn discover(&self) -> DocgenResult<Vec<String>> {
        discover_components(&self.config)
    }

    /// Compile one component without writing it.
    pub async fn render(&self, component: &str) -> DocgenResult<String> {
        compile_markdown(&self.config, component, self.engine.as_ref()).await
    }

    /// Compile one component and write it to its destination file.
    pub async fn generate(&self, component: &str) -> DocgenResult<PathBuf> {
        let rendered = self.render(component).await?;
        let destination = self.config.dest_file(Path::new(component));
        write_down_md_file(self.formatter.as_ref(), &rendered, &destination).await?;
        info!(component, destination = %destination.display(), "wrote documentation");
        Ok(destination)
    }

    /// Generate documentation for every discovered component. A failing
    /// component is recorded in the report and does not stop the others.
    pub async fn generate_all(&self) -> DocgenResult<GenerateReport> {
        let components = self.discover()?;
        debug!(count = components.len(), "discovered components");

        match &self.config.out_file {
            Some(out_file) => self.generate_single_file(out_file, &components).await,
            None => {
                let results = join_all(components.iter().map(|component| async move {
                    (component, self.generate(component).await)
                }))
                .await;

                let mut report = GenerateReport::default();
                for (component, result) in results {
                    match result {
                        Ok(destination) => report.written.push(destination),
                        Err(error) => record_failure(&mut report, component, error),
                    }
                }
                Ok(report)
            }
        }
    }

    /// Render all components and write them, in discovery order, into one file.
    async fn generate_single_file(
        &self,
        out_file: &Path,
        components: &[String],
    ) -> DocgenResult<GenerateReport> {
        let results = join_all(components.iter().map(|component| self.render(component))).await;

        let mut report = GenerateReport::default();
        let mut sections = Vec::with_capacity(components.len());
        for (component, result) in components.iter().zip(results) {
            match result {
                Ok(rendered) => sections.push(rendered),
                Err(error) => record_failure(&mut report, component, error),
            }
        }

        if !sections.is_empty() {
            write_down_md_file(self.formatter.as_ref(), &sections.join("\n\n"), out_file).await?;
            info!(
                destination = %out_file.display(),
                components = sections.len(),
                "wrote combined documentation"
            );
            report.written.push(out_file.to_path_buf());
        }

        Ok(report)
    }

    /// Map a changed file to the component it documents: either the
    /// component source itself or its supplementary markdown file.
    pub fn component_for(&self, changed: &Path) -> DocgenResult<Option<String>> {
        if self.is_output(changed) {
            return Ok(None);
        }

        let root = self.config.components_dir();
        if let Ok(relative) = changed.strip_prefix(&root) {
            if self.config.is_component(relative) {
                return Ok(Some(component_key(relative)));
            }
        }

        let changed = normalize_path(changed);
        let owner = self.discover()?.into_iter().find(|component| {
            let full_path = normalize_path(&self.config.cwd.join(component));
            self.config.doc_file_name(&full_path).as_deref() == Some(changed.as_path())
        });
        Ok(owner)
    }

    /// Regenerate whatever `changed` affects. Returns the files written, or an
    /// empty report when the path is unrelated to any component.
    pub async fn regenerate_for(&self, changed: &Path) -> DocgenResult<GenerateReport> {
        let Some(component) = self.component_for(changed)? else {
            return Ok(GenerateReport::default());
        };

        if self.config.out_file.is_some() {
            return self.generate_all().await;
        }

        let mut report = GenerateReport::default();
        match self.generate(&component).await {
            Ok(destination) => report.written.push(destination),
            Err(error) => record_failure(&mut report, &component, error),
        }
        Ok(report)
    }

    /// Generate everything once, then keep regenerating on changes until the
    /// watcher shuts down.
    pub async fn watch(&self) -> DocgenResult<()> {
        let initial = self.generate_all().await?;
        info!(
            written = initial.written.len(),
            failed = initial.failures.len(),
            "initial generation complete, watching for changes"
        );

        let mut watcher = ComponentWatcher::new(&self.config.components_dir())?;
        while let Some(event) = watcher.next_event().await {
            self.handle_event(event).await;
        }
        Ok(())
    }

    /// React to one watcher event. Failures are logged and reported as an
    /// empty report so a long-running watch session keeps going.
    pub async fn handle_event(&self, event: WatchEvent) -> GenerateReport {
        match event {
            WatchEvent::Changed(path) => match self.regenerate_for(&path).await {
                Ok(report) => {
                    if !report.written.is_empty() {
                        debug!(path = %path.display(), written = report.written.len(), "regenerated");
                    }
                    report
                }
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "failed to regenerate");
                    GenerateReport::default()
                }
            },
            WatchEvent::Removed(path) => {
                info!(path = %path.display(), "file removed; existing documentation left in place");
                GenerateReport::default()
            }
        }
    }

    fn is_output(&self, path: &Path) -> bool {
        match &self.config.out_file {
            Some(out_file) => path == out_file.as_path(),
            None => path.starts_with(&self.config.out_dir),
        }
    }
}

fn record_failure(report: &mut GenerateReport, component: &str, error: DocgenError) {
    warn!(component, error = %error, "failed to generate documentation");
    report.failures.push(ComponentFailure {
        component: component.to_owned(),
        error,
    });
}
