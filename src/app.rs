use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::config::Roots;
use crate::error::PatentError;
use crate::fetcher::FieldFetcher;
use crate::resolver::{DocumentResolver, ResolutionSummary};
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: String,
    pub finished_at: String,
    pub categories: Vec<CategoryReport>,
    pub skipped: Vec<SkippedQuery>,
    pub attempted: usize,
    pub succeeded: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub queries: Vec<ResolutionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedQuery {
    pub path: String,
    pub reason: String,
}

/// Walks `<input>/<category>/<query>.json` and resolves every query record.
pub struct BatchRunner<F: FieldFetcher> {
    input_root: Utf8PathBuf,
    resolver: DocumentResolver<F>,
    exclude: Vec<String>,
}

impl<F: FieldFetcher> BatchRunner<F> {
    pub fn new(input_root: Utf8PathBuf, resolver: DocumentResolver<F>) -> Self {
        Self {
            input_root,
            resolver,
            exclude: Vec::new(),
        }
    }

    pub fn from_roots(roots: &Roots, fetcher: F) -> Self {
        let store = RecordStore::new_with_paths(roots.documents.clone(), roots.images.clone());
        Self::new(roots.input.clone(), DocumentResolver::new(store, fetcher))
    }

    /// Categories listed here are skipped entirely.
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn run(&self, sink: &dyn ProgressSink) -> Result<BatchReport, PatentError> {
        let started_at = iso_timestamp();
        let mut categories = Vec::new();
        let mut skipped = Vec::new();

        for (category, dir) in list_entries(&self.input_root, EntryKind::Dir)? {
            if self.exclude.iter().any(|name| name == &category) {
                tracing::info!(category = category.as_str(), "category excluded");
                continue;
            }

            sink.event(ProgressEvent {
                message: format!(
                    "Starting the scraping process for CPC: {category} ------------------"
                ),
                elapsed: None,
            });
            let mut queries = Vec::new();
            for (_, path) in list_entries(&dir, EntryKind::JsonFile)? {
                match self.resolver.resolve(&path, sink) {
                    Ok(summary) => queries.push(summary),
                    Err(err) if err.is_per_query() => {
                        tracing::warn!(query = path.as_str(), "skipping query record: {err}");
                        skipped.push(SkippedQuery {
                            path: path.to_string(),
                            reason: err.to_string(),
                        });
                    }
                    Err(err) => return Err(err),
                }
            }
            sink.event(ProgressEvent {
                message: format!(
                    "Completed scraping process for CPC: {category} ----------------------"
                ),
                elapsed: None,
            });
            categories.push(CategoryReport { category, queries });
        }

        let (attempted, succeeded) = categories
            .iter()
            .flat_map(|report| report.queries.iter())
            .fold((0, 0), |(attempted, succeeded), summary| {
                (attempted + summary.attempted, succeeded + summary.succeeded)
            });

        Ok(BatchReport {
            started_at,
            finished_at: iso_timestamp(),
            categories,
            skipped,
            attempted,
            succeeded,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    JsonFile,
}

/// Direct children of `dir` of the given kind, sorted by name.
fn list_entries(
    dir: &Utf8Path,
    kind: EntryKind,
) -> Result<Vec<(String, Utf8PathBuf)>, PatentError> {
    let entries = fs::read_dir(dir.as_std_path())
        .map_err(|err| PatentError::Persistence(format!("read dir {dir}: {err}")))?;
    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| PatentError::Persistence(err.to_string()))?;
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            tracing::warn!("skipping non-utf8 path {}", entry.path().display());
            continue;
        };
        let Some(name) = path.file_name().map(str::to_string) else {
            continue;
        };
        let matches = match kind {
            EntryKind::Dir => path.is_dir(),
            EntryKind::JsonFile => path.is_file() && path.extension() == Some("json"),
        };
        if matches {
            items.push((name, path));
        }
    }
    items.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(items)
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
