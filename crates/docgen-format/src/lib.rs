//! Markdown formatters used to normalise generated documentation before it
//! is written to disk.

mod canonical;
mod command;

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

pub use canonical::CanonicalFormatter;
pub use command::CommandFormatter;

/// Input language handed to a formatter.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Parser {
    #[default]
    Markdown,
}

impl Parser {
    pub fn as_str(self) -> &'static str {
        match self {
            Parser::Markdown => "markdown",
        }
    }
}

/// Options passed alongside every formatting request.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FormatOptions {
    pub parser: Parser,
}

impl FormatOptions {
    pub fn markdown() -> Self {
        FormatOptions {
            parser: Parser::Markdown,
        }
    }
}

/// Pluggable code formatter. Implementations must tolerate malformed
/// markdown and only fail on unrecoverable problems.
pub trait MarkdownFormatter: Send + Sync {
    fn format(&self, text: &str, options: &FormatOptions) -> FormatResult<String>;
}

impl<F> MarkdownFormatter for F
where
    F: Fn(&str, &FormatOptions) -> FormatResult<String> + Send + Sync,
{
    fn format(&self, text: &str, options: &FormatOptions) -> FormatResult<String> {
        self(text, options)
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to run formatter '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("formatter '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("formatter '{program}' produced non UTF-8 output")]
    InvalidOutput { program: String },

    #[error("{0}")]
    Other(String),
}

pub type FormatResult<T> = Result<T, FormatError>;
