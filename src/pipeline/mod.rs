//! Static-site build pipeline.
//!
//! # Architecture
//!
//! - `Task`: one named build step reading from the source tree and writing to
//!   the temporary and/or publish trees
//! - `Phase`: tasks that run concurrently; phases run in order
//! - `assets`: file selection, copying and text minification helpers
//! - `markdown`: content documents to JSON
//!
//! File work is blocking, so each task runs on tokio's blocking pool and the
//! tasks of one phase are joined with `futures::future::try_join_all`.

pub mod assets;
pub mod markdown;

use crate::config::{Config, LOCALES_DIR};
use crate::i18n::{BundleValidator, LanguageRegistry};
use anyhow::{Context, Result};
use assets::{collect_files, copy_file, has_extension, minify_css, trim_html, write_file};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Stylesheets built by `build:css`, relative to `<source>/css`.
pub const STYLESHEETS: [&str; 4] = ["768.css", "align.css", "animations.css", "main.css"];

const FONT_EXTENSIONS: [&str; 5] = ["eot", "svg", "ttf", "woff", "woff2"];
const MAIN_SCRIPT: &str = "main.js";
const LIBRARY_STYLESHEET: &str = "bootstrap.min.css";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Clean,
    Library,
    Css,
    Fonts,
    Images,
    Html,
    Js,
    Markdown,
    Locales,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Clean => "clean",
            Task::Library => "library",
            Task::Css => "build:css",
            Task::Fonts => "build:fonts",
            Task::Images => "build:images",
            Task::Html => "build:html",
            Task::Js => "build:js",
            Task::Markdown => "build:markdown",
            Task::Locales => "check:locales",
        }
    }

    pub fn from_name(name: &str) -> Option<Task> {
        Self::all().into_iter().find(|task| task.name() == name)
    }

    pub fn all() -> [Task; 9] {
        [
            Task::Clean,
            Task::Library,
            Task::Css,
            Task::Fonts,
            Task::Images,
            Task::Html,
            Task::Js,
            Task::Markdown,
            Task::Locales,
        ]
    }
}

pub type Phase = Vec<Task>;

/// Full production build: clean, libraries, then every asset task at once.
pub fn default_sequence() -> Vec<Phase> {
    vec![
        vec![Task::Clean],
        vec![Task::Library],
        vec![
            Task::Css,
            Task::Fonts,
            Task::Images,
            Task::Html,
            Task::Js,
            Task::Markdown,
            Task::Locales,
        ],
    ]
}

/// What the development server needs before it starts.
pub fn serve_sequence() -> Vec<Phase> {
    vec![vec![Task::Css, Task::Js, Task::Markdown]]
}

/// Output of one task, logged like a size report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub task: &'static str,
    pub files: usize,
    pub bytes: u64,
}

impl TaskSummary {
    fn new(task: Task) -> Self {
        Self {
            task: task.name(),
            ..Default::default()
        }
    }

    fn add(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }
}

/// Run phases in order, the tasks of each phase concurrently.
///
/// Stops at the first failing phase.
pub async fn run_sequence(config: &Config, phases: &[Phase]) -> Result<Vec<TaskSummary>> {
    let started = Instant::now();
    let mut summaries = Vec::new();

    for phase in phases {
        let runs = phase.iter().map(|&task| run_task(config, task));
        summaries.extend(futures::future::try_join_all(runs).await?);
    }

    let files: usize = summaries.iter().map(|s| s.files).sum();
    let bytes: u64 = summaries.iter().map(|s| s.bytes).sum();
    info!(
        "Build finished in {:.2?}: {} files, {} bytes",
        started.elapsed(),
        files,
        bytes
    );
    Ok(summaries)
}

/// Run a single task on the blocking pool.
pub async fn run_task(config: &Config, task: Task) -> Result<TaskSummary> {
    info!("Starting '{}'", task.name());
    let started = Instant::now();

    let owned = config.clone();
    let summary = tokio::task::spawn_blocking(move || execute(&owned, task))
        .await
        .context(format!("Task '{}' panicked", task.name()))?
        .context(format!("Task '{}' failed", task.name()))?;

    info!(
        "Finished '{}' after {:.2?}: {} files, {} bytes",
        summary.task,
        started.elapsed(),
        summary.files,
        summary.bytes
    );
    Ok(summary)
}

fn execute(config: &Config, task: Task) -> Result<TaskSummary> {
    match task {
        Task::Clean => clean(config),
        Task::Library => library(config),
        Task::Css => css(config),
        Task::Fonts => fonts(config),
        Task::Images => images(config),
        Task::Html => html(config),
        Task::Js => js(config),
        Task::Markdown => markdown_task(config),
        Task::Locales => locales(config),
    }
}

fn clean(config: &Config) -> Result<TaskSummary> {
    let summary = TaskSummary::new(Task::Clean);
    for dir in [&config.temporary_dir, &config.publish_dir] {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => info!("Removed {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).context(format!("Failed to remove {}", dir.display()));
            }
        }
    }
    Ok(summary)
}

fn library(config: &Config) -> Result<TaskSummary> {
    let mut summary = TaskSummary::new(Task::Library);

    let stylesheet = Path::new("css").join(LIBRARY_STYLESHEET);
    let src = config.source_dir.join(&stylesheet);
    if src.exists() {
        summary.add(copy_file(&src, &config.publish_dir.join(&stylesheet))?);
    } else {
        warn!("Library stylesheet {} not found", src.display());
    }

    let js_root = config.source_dir.join("js");
    let scripts = collect_files(&js_root, |p| {
        has_extension(p, &["js"]) && p != Path::new(MAIN_SCRIPT)
    })?;
    for script in scripts {
        let dest = config.publish_dir.join("js").join(&script);
        summary.add(copy_file(&js_root.join(&script), &dest)?);
    }
    Ok(summary)
}

fn css(config: &Config) -> Result<TaskSummary> {
    let mut summary = TaskSummary::new(Task::Css);
    let css_root = config.source_dir.join("css");

    for name in STYLESHEETS {
        let src = css_root.join(name);
        if !src.exists() {
            warn!("Stylesheet {} not found, skipping", src.display());
            continue;
        }
        let text =
            std::fs::read_to_string(&src).context(format!("Failed to read {}", src.display()))?;
        write_file(&config.temporary_dir.join("css").join(name), text.as_bytes())?;
        let minified = minify_css(&text);
        summary.add(write_file(
            &config.publish_dir.join("css").join(name),
            minified.as_bytes(),
        )?);
    }
    Ok(summary)
}

fn fonts(config: &Config) -> Result<TaskSummary> {
    let mut summary = TaskSummary::new(Task::Fonts);
    let font_root = config.source_dir.join("fonts");
    let publish_root = config.publish_dir.join("fonts");

    for sheet in collect_files(&font_root, |p| has_extension(p, &["css"]))? {
        let src = font_root.join(&sheet);
        let text =
            std::fs::read_to_string(&src).context(format!("Failed to read {}", src.display()))?;
        summary.add(write_file(
            &publish_root.join(&sheet),
            minify_css(&text).as_bytes(),
        )?);
    }

    for font in collect_files(&font_root, |p| has_extension(p, &FONT_EXTENSIONS))? {
        summary.add(copy_file(&font_root.join(&font), &publish_root.join(&font))?);
    }
    Ok(summary)
}

fn images(config: &Config) -> Result<TaskSummary> {
    copy_tree(
        Task::Images,
        &config.source_dir.join("images"),
        &config.publish_dir.join("images"),
        |_| true,
    )
}

fn html(config: &Config) -> Result<TaskSummary> {
    let mut summary = TaskSummary::new(Task::Html);
    for page in collect_files(&config.source_dir, |p| has_extension(p, &["html"]))? {
        let src = config.source_dir.join(&page);
        let text =
            std::fs::read_to_string(&src).context(format!("Failed to read {}", src.display()))?;
        summary.add(write_file(
            &config.publish_dir.join(&page),
            trim_html(&text).as_bytes(),
        )?);
    }
    Ok(summary)
}

fn js(config: &Config) -> Result<TaskSummary> {
    let mut summary = TaskSummary::new(Task::Js);
    let src = config.source_dir.join("js").join(MAIN_SCRIPT);
    if src.exists() {
        summary.add(copy_file(
            &src,
            &config.publish_dir.join("js").join(MAIN_SCRIPT),
        )?);
    } else {
        warn!("Script {} not found", src.display());
    }
    Ok(summary)
}

fn markdown_task(config: &Config) -> Result<TaskSummary> {
    let mut summary = TaskSummary::new(Task::Markdown);
    let content_root = config.source_dir.join("contents");

    for doc in collect_files(&content_root, |p| has_extension(p, &["md"]))? {
        let src = content_root.join(&doc);
        let text =
            std::fs::read_to_string(&src).context(format!("Failed to read {}", src.display()))?;
        let value = markdown::to_json(&text).context(format!("Invalid content {}", src.display()))?;
        let json = serde_json::to_vec_pretty(&value)?;

        let output: PathBuf = Path::new("contents").join(doc.with_extension("json"));
        write_file(&config.temporary_dir.join(&output), &json)?;
        summary.add(write_file(&config.publish_dir.join(&output), &json)?);
    }
    Ok(summary)
}

/// Validate the bundle tree, then publish it. Validation findings are logged, never fatal.
fn locales(config: &Config) -> Result<TaskSummary> {
    let locale_root = config.source_dir.join(LOCALES_DIR);
    let report = BundleValidator::validate_directory(&locale_root, LanguageRegistry::get());

    for warning in &report.warnings {
        warn!("Locale check: {}", warning);
    }
    for error in &report.errors {
        warn!("Locale check error: {}", error);
    }
    if report.is_clean() {
        info!("All locale bundles are complete");
    }

    copy_tree(
        Task::Locales,
        &locale_root,
        &config.publish_dir.join(LOCALES_DIR),
        |p| has_extension(p, &["json"]),
    )
}

fn copy_tree<F>(task: Task, from: &Path, to: &Path, filter: F) -> Result<TaskSummary>
where
    F: Fn(&Path) -> bool,
{
    let mut summary = TaskSummary::new(task);
    for file in collect_files(from, filter)? {
        summary.add(copy_file(&from.join(&file), &to.join(&file))?);
    }
    Ok(summary)
}
