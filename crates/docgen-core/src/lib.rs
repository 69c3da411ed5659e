//! Core orchestration layer for docgen: compile a component's documentation
//! and write it to disk.

pub mod compile;
pub mod discover;
pub mod docgen;
pub mod error;
pub mod paths;
pub mod template;
pub mod watch;
pub mod writer;

pub use compile::compile_markdown;
pub use discover::discover_components;
pub use docgen::{ComponentFailure, Docgen, GenerateReport};
pub use docgen_config::{Config, LoadOptions};
pub use docgen_format::{CanonicalFormatter, CommandFormatter, FormatOptions, MarkdownFormatter};
pub use error::{DocgenError, DocgenResult, ExitCode};
pub use template::{HandlebarsEngine, TemplateEngine, TemplateError};
pub use watch::{ComponentWatcher, WatchEvent};
pub use writer::write_down_md_file;
