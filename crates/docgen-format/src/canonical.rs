use std::sync::OnceLock;

use pulldown_cmark::{Event, Options, Parser as CmarkParser, Tag};
use regex::Regex;

use crate::{FormatOptions, FormatResult, MarkdownFormatter};

/// Built-in formatter producing a stable, canonical markdown layout.
///
/// Rules applied outside code blocks and HTML blocks:
/// - CRLF line endings become LF
/// - trailing whitespace is stripped, except two-space hard breaks
/// - runs of blank lines collapse to one, leading and trailing blanks go
/// - ATX headings lose extra spacing and closing hashes, and get a blank
///   line on both sides
/// - `*` and `+` bullets become `-`
///
/// The output always ends with exactly one newline unless it is empty.
/// Formatting already canonical text returns it unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalFormatter;

impl MarkdownFormatter for CanonicalFormatter {
    fn format(&self, text: &str, _options: &FormatOptions) -> FormatResult<String> {
        Ok(canonicalize(text))
    }
}

struct OutputLine {
    text: String,
}

impl OutputLine {
    fn new(text: impl Into<String>) -> Self {
        OutputLine { text: text.into() }
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

fn canonicalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let lines: Vec<&str> = text.split('\n').collect();
    let protected = protected_lines(&text, lines.len());

    let mut out: Vec<OutputLine> = Vec::with_capacity(lines.len());
    let mut blank_pending = false;

    for (idx, raw) in lines.iter().enumerate() {
        if protected[idx] {
            if blank_pending && !raw.trim().is_empty() {
                push_blank(&mut out);
                blank_pending = false;
            }
            out.push(OutputLine::new(*raw));
            continue;
        }

        if raw.trim().is_empty() {
            push_blank(&mut out);
            continue;
        }

        if let Some(heading) = normalize_atx_heading(raw) {
            push_blank(&mut out);
            out.push(OutputLine::new(heading));
            blank_pending = true;
            continue;
        }

        if blank_pending {
            push_blank(&mut out);
            blank_pending = false;
        }

        let next = lines.get(idx + 1).copied();
        let trimmed = trim_trailing(raw, keeps_hard_break(next, idx + 1, &protected));
        out.push(OutputLine::new(normalize_bullet(&trimmed).unwrap_or(trimmed)));
    }

    while out.last().map_or(false, OutputLine::is_blank) {
        out.pop();
    }

    if out.is_empty() {
        return String::new();
    }

    let mut rendered = out
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n");
    rendered.push('\n');
    rendered
}

/// Push a single blank separator unless the output is empty or already ends
/// with a blank line.
fn push_blank(out: &mut Vec<OutputLine>) {
    match out.last() {
        None => {}
        Some(last) if last.is_blank() => {}
        Some(_) => out.push(OutputLine::new(String::new())),
    }
}

/// Mark every line that belongs to a code block or a block-level HTML chunk.
fn protected_lines(text: &str, line_count: usize) -> Vec<bool> {
    let mut protected = vec![false; line_count];
    let mut inline_depth = 0usize;

    for (event, range) in CmarkParser::new_ext(text, Options::all()).into_offset_iter() {
        let span = match event {
            Event::Start(Tag::CodeBlock(_)) => Some(range),
            Event::Start(Tag::Paragraph)
            | Event::Start(Tag::Heading(..))
            | Event::Start(Tag::Item)
            | Event::Start(Tag::TableCell) => {
                inline_depth += 1;
                None
            }
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(..))
            | Event::End(Tag::Item)
            | Event::End(Tag::TableCell) => {
                inline_depth = inline_depth.saturating_sub(1);
                None
            }
            Event::Html(_) if inline_depth == 0 => Some(range),
            _ => None,
        };

        if let Some(span) = span {
            if span.is_empty() {
                continue;
            }
            let first = line_of(text, span.start);
            let last = line_of(text, span.end - 1);
            for flag in protected.iter_mut().take(last + 1).skip(first) {
                *flag = true;
            }
        }
    }

    protected
}

fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|byte| **byte == b'\n')
        .count()
}

/// A two-space hard break only matters when the paragraph continues on the
/// next line. A heading, list item or blockquote ends the paragraph.
fn keeps_hard_break(next: Option<&str>, next_idx: usize, protected: &[bool]) -> bool {
    match next {
        Some(line) => {
            !line.trim().is_empty()
                && !protected.get(next_idx).copied().unwrap_or(false)
                && normalize_atx_heading(line).is_none()
                && !block_start_pattern().is_match(line)
        }
        None => false,
    }
}

fn trim_trailing(line: &str, keep_hard_break: bool) -> String {
    let trimmed = line.trim_end();
    if keep_hard_break && line[trimmed.len()..].starts_with("  ") && !line.ends_with('\t') {
        format!("{trimmed}  ")
    } else {
        trimmed.to_owned()
    }
}

/// Canonical form of an unindented ATX heading, or `None` when `line` is not one.
fn normalize_atx_heading(line: &str) -> Option<String> {
    let pound_count = line.chars().take_while(|ch| *ch == '#').count();
    if pound_count == 0 || pound_count > 6 {
        return None;
    }

    let after_hashes = &line[pound_count..];
    if !after_hashes.is_empty() && !after_hashes.starts_with(char::is_whitespace) {
        return None;
    }

    let mut content = after_hashes.trim();
    let stripped_hashes = content.trim_end_matches('#');
    if stripped_hashes.len() < content.len() {
        if stripped_hashes.is_empty() {
            content = "";
        } else if stripped_hashes.ends_with(char::is_whitespace) {
            content = stripped_hashes.trim_end();
        }
    }

    let hashes = &line[..pound_count];
    if content.is_empty() {
        Some(hashes.to_owned())
    } else {
        Some(format!("{hashes} {content}"))
    }
}

fn bullet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\s*)[*+]([ \t]+\S.*)$").expect("valid bullet regex"))
}

fn block_start_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^ {0,3}(?:[-*+][ \t]|\d{1,9}[.)][ \t]|>)").expect("valid block regex")
    })
}

fn normalize_bullet(line: &str) -> Option<String> {
    if is_thematic_break(line) {
        return None;
    }
    let captures = bullet_pattern().captures(line)?;
    Some(format!("{}-{}", &captures[1], &captures[2]))
}

fn is_thematic_break(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|ch| !ch.is_whitespace()).collect();
    marks.len() >= 3
        && marks
            .first()
            .map_or(false, |first| {
                matches!(*first, '*' | '-' | '_') && marks.iter().all(|ch| ch == first)
            })
}
