use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use crate::{FormatError, FormatOptions, FormatResult, MarkdownFormatter};

/// Formatter that pipes markdown through an external program and reads the
/// formatted text back from its standard output.
///
/// The `{parser}` placeholder in any argument is replaced with the requested
/// parser name, so `prettier --parser {parser}` works for every request.
#[derive(Clone, Debug)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandFormatter {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `prettier --parser markdown`, resolved from `PATH`.
    pub fn prettier() -> Self {
        CommandFormatter::new("prettier", ["--parser", "{parser}"])
    }

    /// Split a whitespace-separated command line. Returns `None` when empty.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(CommandFormatter::new(program, parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn resolved_args(&self, options: &FormatOptions) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{parser}", options.parser.as_str()))
            .collect()
    }
}

impl MarkdownFormatter for CommandFormatter {
    fn format(&self, text: &str, options: &FormatOptions) -> FormatResult<String> {
        let spawn_error = |source| FormatError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(self.resolved_args(options))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Feed stdin from a separate thread so a chatty formatter cannot
        // deadlock on a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.to_owned();
            thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child.wait_with_output().map_err(spawn_error)?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // Programs that exit without draining stdin close the pipe early.
                Ok(Err(source)) if source.kind() == ErrorKind::BrokenPipe => {}
                Ok(Err(source)) => return Err(spawn_error(source)),
                Err(_) => {
                    return Err(FormatError::Other(format!(
                        "stdin writer for '{}' panicked",
                        self.program
                    )))
                }
            }
        }

        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| FormatError::InvalidOutput {
            program: self.program.clone(),
        })
    }
}
