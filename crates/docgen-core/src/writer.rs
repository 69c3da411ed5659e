use std::path::Path;

use docgen_format::{FormatOptions, MarkdownFormatter};
use tokio::fs;

use crate::error::{DocgenError, DocgenResult};

/// Format `raw_markdown` and write the result to `destination`, creating
/// missing parent directories. Any existing file is replaced.
///
/// The formatter runs exactly once and its output is written verbatim.
pub async fn write_down_md_file(
    formatter: &dyn MarkdownFormatter,
    raw_markdown: &str,
    destination: &Path,
) -> DocgenResult<()> {
    let formatted = formatter.format(raw_markdown, &FormatOptions::markdown())?;

    if let Some(parent) = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| DocgenError::io(parent, source))?;
    }

    fs::write(destination, formatted)
        .await
        .map_err(|source| DocgenError::io(destination, source))
}
