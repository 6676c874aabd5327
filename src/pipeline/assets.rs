//! File selection, copying and light-weight text transforms for build tasks.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

static CSS_COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
static CSS_WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
static CSS_PUNCTUATION_REGEX: OnceLock<Regex> = OnceLock::new();
static CSS_BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static CSS_COLON_REGEX: OnceLock<Regex> = OnceLock::new();

/// Files under `root` (recursively) accepted by `filter`, as paths relative to `root`.
///
/// A missing `root` yields no files.
pub fn collect_files<F>(root: &Path, filter: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.context(format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .context("Walked path outside of its root")?
            .to_path_buf();
        if filter(&relative) {
            files.push(relative);
        }
    }
    Ok(files)
}

/// Whether `path` has one of `extensions` (case-insensitive, without the dot).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Write `contents` to `dest`, creating parent directories. Returns the byte count.
pub fn write_file(dest: &Path, contents: &[u8]) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(dest, contents).context(format!("Failed to write {}", dest.display()))?;
    Ok(contents.len() as u64)
}

/// Copy `src` to `dest`, creating parent directories. Returns the byte count.
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::copy(src, dest).context(format!(
        "Failed to copy {} to {}",
        src.display(),
        dest.display()
    ))
}

/// Strip comments and redundant whitespace from a stylesheet.
///
/// Whitespace around `:` is only removed inside declaration blocks, since in
/// selectors it is significant (`a :hover` is not `a:hover`).
pub fn minify_css(css: &str) -> String {
    let comments = CSS_COMMENT_REGEX
        .get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("comment pattern is valid"));
    let whitespace = CSS_WHITESPACE_REGEX
        .get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
    let punctuation = CSS_PUNCTUATION_REGEX
        .get_or_init(|| Regex::new(r"\s*([{};,>])\s*").expect("punctuation pattern is valid"));
    let block = CSS_BLOCK_REGEX
        .get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("block pattern is valid"));
    let colon = CSS_COLON_REGEX
        .get_or_init(|| Regex::new(r"\s*:\s*").expect("colon pattern is valid"));

    let css = comments.replace_all(css, "");
    let css = whitespace.replace_all(&css, " ");
    let css = punctuation.replace_all(&css, "$1");
    let css = block.replace_all(&css, |caps: &Captures| {
        colon.replace_all(&caps[0], ":").into_owned()
    });
    css.replace(";}", "}").trim().to_string()
}

/// Drop line indentation and blank lines from an HTML page.
///
/// Pages containing `<pre` or `<textarea` are returned unchanged since their
/// whitespace is content.
pub fn trim_html(html: &str) -> String {
    if html.contains("<pre") || html.contains("<textarea") {
        return html.to_string();
    }
    html.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
