use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use docgen_config::{
    Config, ConfigError, ConfigValidationError, ConfigValidationErrors, LoadOptions, PatternList,
};
use docgen_core::paths::display_relative;
use docgen_core::{Docgen, DocgenError, DocgenResult, ExitCode, GenerateReport};
use docgen_format::CommandFormatter;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match runtime.block_on(execute(cli)) {
        Ok(code) => Ok(code),
        Err(err) => {
            eprintln!("docgen error: {err}");
            Ok(err.exit_code().code())
        }
    }
}

async fn execute(cli: Cli) -> DocgenResult<i32> {
    let config = cli.load_config()?;
    let project_dir = config.cwd.clone();
    let watch = cli.watch || config.watch;

    let mut docgen = Docgen::new(config)?;
    if let Some(formatter) = cli.external_formatter()? {
        info!(program = formatter.program(), "formatting with external command");
        docgen = docgen.with_formatter(formatter);
    }

    if watch {
        docgen.watch().await?;
        return Ok(ExitCode::Success.code());
    }

    let report = docgen.generate_all().await?;
    print_report(&report, &project_dir);

    let code = if report.is_success() {
        ExitCode::Success
    } else {
        ExitCode::ComponentFailures
    };
    Ok(code.code())
}

fn print_report(report: &GenerateReport, project_dir: &Path) {
    for path in &report.written {
        println!("wrote {}", display_relative(path, project_dir));
    }
    for failure in &report.failures {
        eprintln!("failed {}: {}", failure.component, failure.error);
    }
    println!(
        "{} written, {} failed",
        report.written.len(),
        report.failures.len()
    );
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbose >= 2))
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "docgen",
    author,
    version,
    about = "Generate markdown documentation for UI components"
)]
struct Cli {
    /// Explicit config file (replaces docgen.config.toml lookup)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,
    /// Component glob, relative to the components root; repeatable
    #[arg(long = "components", value_name = "GLOB", action = ArgAction::Append)]
    components: Vec<String>,
    /// Directory generated files are written under
    #[arg(long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,
    /// Write every component into this single file
    #[arg(long = "out-file", value_name = "FILE")]
    out_file: Option<PathBuf>,
    /// Keep running and regenerate on changes
    #[arg(long)]
    watch: bool,
    /// External formatter, e.g. "prettier --parser {parser}"
    #[arg(long = "formatter-command", value_name = "CMD", conflicts_with = "prettier")]
    formatter_command: Option<String>,
    /// Format with `prettier --parser markdown` from PATH
    #[arg(long)]
    prettier: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn load_config(&self) -> Result<Config, DocgenError> {
        let mut options = LoadOptions::default();
        if let Some(dir) = &self.cwd {
            options = options.with_working_dir(dir.clone());
        }
        if let Some(path) = &self.config {
            options = options.with_override_path(path.clone());
        }

        let mut config = Config::load(options)?;

        if !self.components.is_empty() {
            config.components =
                PatternList::parse(self.components.iter().cloned()).map_err(ConfigError::Validation)?;
        }
        if let Some(dir) = &self.out_dir {
            config.out_dir = config.cwd.join(dir);
        }
        if let Some(file) = &self.out_file {
            config.out_file = Some(config.cwd.join(file));
        }
        Ok(config)
    }

    fn external_formatter(&self) -> Result<Option<CommandFormatter>, DocgenError> {
        if self.prettier {
            return Ok(Some(CommandFormatter::prettier()));
        }
        let Some(command) = self.formatter_command.as_deref() else {
            return Ok(None);
        };
        match CommandFormatter::from_command_line(command) {
            Some(formatter) => Ok(Some(formatter)),
            None => Err(ConfigError::Validation(ConfigValidationErrors(vec![
                ConfigValidationError::new(None, "--formatter-command must name a program"),
            ]))
            .into()),
        }
    }
}
