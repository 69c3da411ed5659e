//! Configuration primitives and loader for the docgen toolkit.
//!
//! The loader resolves configuration from the following stack, lowest
//! precedence first: built-in defaults → `docgen.config.toml` in the working
//! directory → an explicit override file.
//! Parsed settings are normalised into typed structures so downstream crates
//! can operate without touching raw TOML. The two path strategies
//! (`doc_file_name`, `dest_file`) are plain function values carried by the
//! [`Config`] and can be swapped programmatically.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "docgen.config.toml";

const DEFAULT_COMPONENTS: &str = "**/[a-zA-Z]*.{vue,jsx,tsx}";
const DEFAULT_OUT_DIR: &str = "docs";
const DOC_EXTENSION: &str = "md";

/// Maps a component's full path to the path of its supplementary markdown file.
pub type DocFileNameFn = Arc<dyn Fn(&Path) -> Option<PathBuf> + Send + Sync>;

/// Maps a component path to the destination of its generated documentation.
pub type DestFileFn = Arc<dyn Fn(&Path, &Config) -> PathBuf + Send + Sync>;

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone)]
pub struct Config {
    /// Directory component paths are relative to.
    pub cwd: PathBuf,
    /// Base directory joined in front of component paths handed to the
    /// template engine. Empty means `cwd`.
    pub components_root: PathBuf,
    pub components: PatternList,
    pub out_dir: PathBuf,
    pub out_file: Option<PathBuf>,
    pub watch: bool,
    pub templates: TemplateSettings,
    pub sources: ConfigSources,
    doc_file_name: DocFileNameFn,
    dest_file: DestFileFn,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("cwd", &self.cwd)
            .field("components_root", &self.components_root)
            .field("components", &self.components)
            .field("out_dir", &self.out_dir)
            .field("out_file", &self.out_file)
            .field("watch", &self.watch)
            .field("templates", &self.templates)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// Template overrides for the rendering engine.
#[derive(Clone, Debug, Default)]
pub struct TemplateSettings {
    pub component: Option<PathBuf>,
}

impl Config {
    /// Built-in defaults rooted at `cwd`, without reading anything from disk.
    pub fn for_working_dir(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let source = ConfigSource::default(cwd.clone());
        let mut errors = Vec::new();
        let partial = defaults_layer(source.clone());
        let resolved = partial.finalize(&mut errors);
        debug_assert!(errors.is_empty(), "built-in defaults must validate");
        resolved.into_config(
            cwd.clone(),
            ConfigSources {
                working_directory: cwd,
                layers: vec![source],
            },
        )
    }

    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let local_config_path = working_dir.join(CONFIG_FILE_NAME);
        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let mut errors = Vec::new();
        let resolved = merged.finalize(&mut errors);
        if !errors.is_empty() {
            return Err(ConfigError::Validation(ConfigValidationErrors(errors)));
        }

        Ok(resolved.into_config(
            working_dir.clone(),
            ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        ))
    }

    /// Absolute directory component discovery starts from.
    pub fn components_dir(&self) -> PathBuf {
        if self.components_root.as_os_str().is_empty() {
            self.cwd.clone()
        } else {
            self.cwd.join(&self.components_root)
        }
    }

    /// Copy of this configuration whose working directory and root are both
    /// the components directory, so component paths relative to the root
    /// resolve to the same file through either field.
    pub fn rooted_at_components(&self) -> Self {
        let dir = self.components_dir();
        let mut scoped = self.clone();
        scoped.cwd = dir.clone();
        scoped.components_root = dir;
        scoped
    }

    /// Path of the supplementary markdown file for the component at `full_path`.
    pub fn doc_file_name(&self, full_path: &Path) -> Option<PathBuf> {
        (self.doc_file_name)(full_path)
    }

    /// Destination of the documentation generated for `component_path`.
    pub fn dest_file(&self, component_path: &Path) -> PathBuf {
        (self.dest_file)(component_path, self)
    }

    /// Replace the supplementary-file lookup strategy.
    pub fn with_doc_file_name<F>(mut self, strategy: F) -> Self
    where
        F: Fn(&Path) -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.doc_file_name = Arc::new(strategy);
        self
    }

    /// Replace the destination strategy.
    pub fn with_dest_file<F>(mut self, strategy: F) -> Self
    where
        F: Fn(&Path, &Config) -> PathBuf + Send + Sync + 'static,
    {
        self.dest_file = Arc::new(strategy);
        self
    }

    /// Whether `relative` (relative to the components directory) names a component.
    pub fn is_component(&self, relative: &Path) -> bool {
        self.components.is_match(relative)
    }
}

/// Default supplementary file: the component path with an `.md` extension.
pub fn default_doc_file_name(full_path: &Path) -> Option<PathBuf> {
    Some(full_path.with_extension(DOC_EXTENSION))
}

/// Default destination: `out_dir/<component path>.md`.
pub fn default_dest_file(component_path: &Path, config: &Config) -> PathBuf {
    config.out_dir.join(component_path).with_extension(DOC_EXTENSION)
}

/// Pattern plus compiled matcher helper.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    matcher: GlobMatcher,
}

impl Pattern {
    fn new(source: ConfigSource, value: String) -> Result<Self, ConfigValidationError> {
        match GlobBuilder::new(&value).literal_separator(true).build() {
            Ok(glob) => Ok(Pattern {
                original: value,
                matcher: glob.compile_matcher(),
            }),
            Err(err) => Err(ConfigValidationError::new(
                Some(source),
                format!("invalid glob pattern '{value}': {err}"),
            )),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}

/// Ordered list of glob patterns.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    fn new(patterns: Vec<Pattern>) -> Self {
        PatternList { patterns }
    }

    /// Compile `values` into a pattern list, as the CLI does for overrides.
    pub fn parse<I, S>(values: I) -> Result<Self, ConfigValidationErrors>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = ConfigSource {
            kind: ConfigSourceKind::Override,
            path: None,
            base_dir: PathBuf::from("."),
        };
        let mut errors = Vec::new();
        let located = Located::new(values.into_iter().map(Into::into).collect(), source);
        let patterns = compile_patterns(located, "components", &mut errors);
        if errors.is_empty() {
            Ok(PatternList::new(patterns))
        } else {
            Err(ConfigValidationErrors(errors))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// True when any pattern matches.
    pub fn is_match(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(path))
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    PartialConfig {
        components_root: None,
        components: Some(Located::new(vec![DEFAULT_COMPONENTS.into()], source.clone())),
        out_dir: Some(Located::new(PathBuf::from(DEFAULT_OUT_DIR), source.clone())),
        out_file: None,
        watch: Some(false),
        component_template: None,
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    components_root: Option<Located<PathBuf>>,
    components: Option<Located<Vec<String>>>,
    out_dir: Option<Located<PathBuf>>,
    out_file: Option<Located<PathBuf>>,
    watch: Option<bool>,
    component_template: Option<Located<PathBuf>>,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        if other.components_root.is_some() {
            self.components_root = other.components_root;
        }
        if other.components.is_some() {
            self.components = other.components;
        }
        if other.out_dir.is_some() {
            self.out_dir = other.out_dir;
        }
        if other.out_file.is_some() {
            self.out_file = other.out_file;
        }
        if other.watch.is_some() {
            self.watch = other.watch;
        }
        if other.component_template.is_some() {
            self.component_template = other.component_template;
        }
    }

    fn finalize(self, errors: &mut Vec<ConfigValidationError>) -> ResolvedConfig {
        let components = compile_patterns(
            self.components.unwrap_or_default(),
            "components",
            errors,
        );
        if components.is_empty() && errors.is_empty() {
            errors.push(ConfigValidationError::new(
                None,
                "at least one component pattern is required".to_owned(),
            ));
        }

        let out_dir = self
            .out_dir
            .map(|located| resolve_path(&located))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));

        ResolvedConfig {
            components_root: self
                .components_root
                .map(|located| resolve_path(&located))
                .unwrap_or_default(),
            components: PatternList::new(components),
            out_dir,
            out_file: self.out_file.map(|located| resolve_path(&located)),
            watch: self.watch.unwrap_or(false),
            templates: TemplateSettings {
                component: self.component_template.map(|located| resolve_path(&located)),
            },
        }
    }
}

struct ResolvedConfig {
    components_root: PathBuf,
    components: PatternList,
    out_dir: PathBuf,
    out_file: Option<PathBuf>,
    watch: bool,
    templates: TemplateSettings,
}

impl ResolvedConfig {
    fn into_config(self, cwd: PathBuf, sources: ConfigSources) -> Config {
        Config {
            cwd,
            components_root: self.components_root,
            components: self.components,
            out_dir: self.out_dir,
            out_file: self.out_file,
            watch: self.watch,
            templates: self.templates,
            sources,
            doc_file_name: Arc::new(default_doc_file_name),
            dest_file: Arc::new(default_dest_file),
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

impl Default for Located<Vec<String>> {
    fn default() -> Self {
        Located::new(Vec::new(), ConfigSource::default(PathBuf::from(".")))
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() || path.as_os_str().is_empty() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

fn compile_patterns(
    located: Located<Vec<String>>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for pattern in located.value {
        match Pattern::new(located.source.clone(), pattern) {
            Ok(compiled) => patterns.push(compiled),
            Err(err) => errors.push(err.with_context(context)),
        }
    }
    patterns
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    pub fn new(source: Option<ConfigSource>, message: impl Into<String>) -> Self {
        ConfigValidationError {
            source,
            message: message.into(),
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    components_root: Option<PathBuf>,
    #[serde(default)]
    components: Option<RawPatterns>,
    #[serde(default)]
    out_dir: Option<PathBuf>,
    #[serde(default)]
    out_file: Option<PathBuf>,
    #[serde(default)]
    watch: Option<bool>,
    #[serde(default)]
    templates: Option<RawTemplates>,
}

/// `components` accepts either a single glob or a list of globs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPatterns {
    One(String),
    Many(Vec<String>),
}

impl RawPatterns {
    fn into_vec(self) -> Vec<String> {
        match self {
            RawPatterns::One(pattern) => vec![pattern],
            RawPatterns::Many(patterns) => patterns,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplates {
    #[serde(default)]
    component: Option<PathBuf>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            components_root: self
                .components_root
                .map(|value| Located::new(value, source.clone())),
            components: self
                .components
                .map(|value| Located::new(value.into_vec(), source.clone())),
            out_dir: self.out_dir.map(|value| Located::new(value, source.clone())),
            out_file: self.out_file.map(|value| Located::new(value, source.clone())),
            watch: self.watch,
            component_template: self
                .templates
                .and_then(|templates| templates.component)
                .map(|value| Located::new(value, source)),
        }
    }
}
