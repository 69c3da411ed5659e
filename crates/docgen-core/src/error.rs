use std::io;
use std::path::PathBuf;

use docgen_config::ConfigError;
use docgen_format::FormatError;
use thiserror::Error;

use crate::template::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    ComponentFailures = 1,
    Config = 2,
    Template = 3,
    Format = 4,
    Io = 5,
    Watch = 6,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Error)]
pub enum DocgenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to compile documentation for '{component}': {source}")]
    Template {
        component: String,
        source: TemplateError,
    },

    #[error("failed to load component template: {0}")]
    TemplateLoad(TemplateError),

    #[error("failed to format markdown: {0}")]
    Format(#[from] FormatError),

    #[error("i/o error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl DocgenError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::Config,
            Self::Template { .. } | Self::TemplateLoad(_) => ExitCode::Template,
            Self::Format(_) => ExitCode::Format,
            Self::Io { .. } => ExitCode::Io,
            Self::Watch(_) => ExitCode::Watch,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type DocgenResult<T> = Result<T, DocgenError>;
