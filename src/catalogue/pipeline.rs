//! Glue between the store and the index builders: fetch each manuscript's
//! metadata, turn it into a document, and publish the result. One bad
//! manuscript never aborts a run; it is logged, counted, and skipped.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use super::document::{ProcessedManuscript, process_manuscript};
use super::index::SearchIndex;
use super::store::{CatalogueStore, INDEX_CONTENT_TYPE, ManuscriptEntry};

const PROGRESS_TEMPLATE: &str = "{bar:40.cyan/blue} {pos}/{len} {msg}";

pub fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let bar = ProgressBar::new(len);
    bar.set_style(style);
    bar.set_message(message);
    bar
}

#[derive(Debug, Default)]
pub struct ProcessOutcome {
    pub processed: Vec<ProcessedManuscript>,
    pub failures: Vec<String>,
}

/// Download and normalize the metadata for each entry. Failures are
/// collected rather than propagated so one corrupt manuscript cannot
/// sink the rest of the batch.
pub fn process_entries(
    store: &dyn CatalogueStore,
    prefix: &str,
    entries: &[ManuscriptEntry],
    progress: &ProgressBar,
) -> ProcessOutcome {
    let mut outcome = ProcessOutcome::default();
    for entry in entries {
        match fetch_document(store, prefix, entry) {
            Ok(processed) => outcome.processed.push(processed),
            Err(err) => {
                error!(manuscript = %entry.id, "processing failed: {err:#}");
                outcome.failures.push(entry.id.clone());
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
    outcome
}

fn fetch_document(
    store: &dyn CatalogueStore,
    prefix: &str,
    entry: &ManuscriptEntry,
) -> Result<ProcessedManuscript> {
    let object = ManuscriptEntry::metadata_name(prefix, &entry.id);
    let bytes = store
        .download(&object)
        .with_context(|| format!("downloading {object}"))?;
    let metadata: serde_json::Value =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {object}"))?;
    Ok(process_manuscript(
        &entry.id,
        &metadata,
        entry.pages,
        Some(entry.metadata.fingerprint.clone()),
    ))
}

/// Fetch and parse the previously published index. A missing object is
/// not an error; it just means there is nothing to merge against.
pub fn load_prior_index(
    store: &dyn CatalogueStore,
    index_object: &str,
) -> Result<Option<SearchIndex>> {
    let bytes = match store.download(index_object) {
        Ok(bytes) => bytes,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("downloading prior index {index_object}"));
        }
    };
    SearchIndex::parse(&bytes)
        .with_context(|| format!("parsing prior index {index_object}"))
        .map(Some)
}

pub fn upload_index(store: &dyn CatalogueStore, index_object: &str, bytes: &[u8]) -> Result<u64> {
    store
        .upload(index_object, bytes, INDEX_CONTENT_TYPE)
        .with_context(|| format!("uploading index to {}", store.describe()))
}
