use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::catalogue::config::load_config;
use crate::catalogue::index::{SCHEMA_VERSION, SearchIndex};
use crate::catalogue::pipeline::load_prior_index;
use crate::commands::{CommandReport, resolve_store};

#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    pub path: Option<PathBuf>,
    pub from_dir: Option<PathBuf>,
}

pub fn run(opts: &InspectOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("inspect");

    let index = match &opts.path {
        Some(path) => {
            report.detail(format!("index={}", path.display()));
            let bytes =
                fs::read(path).with_context(|| format!("reading index {}", path.display()))?;
            SearchIndex::parse(&bytes)
                .with_context(|| format!("parsing index {}", path.display()))?
        }
        None => {
            let cfg = load_config()?;
            let store = resolve_store(&cfg, opts.from_dir.as_deref())?;
            report.detail(format!("index={}", cfg.store.index_object));
            report.detail(format!("store={}", store.describe()));
            let Some(index) = load_prior_index(store.as_ref(), &cfg.store.index_object)? else {
                report.issue(format!(
                    "no index published at {}",
                    cfg.store.index_object
                ));
                return Ok(report);
            };
            index
        }
    };

    report.detail(format!("version={}", index.metadata.version));
    report.detail(format!("generated={}", index.metadata.generated_date));
    report.detail(format!(
        "manuscripts={}",
        index.metadata.manuscript_count
    ));
    report.detail(format!(
        "facets: languages={} materials={} scripts={} repositories={} transcription={}",
        index.facets.languages.len(),
        index.facets.material_keywords.len(),
        index.facets.script_keywords.len(),
        index.facets.repository.len(),
        index.facets.transcription_status.len()
    ));

    let missing_coords = index
        .documents
        .iter()
        .filter(|doc| doc.pca_coords.is_none())
        .count();
    let missing_fingerprints = index
        .documents
        .iter()
        .filter(|doc| doc.fingerprint.is_none())
        .count();
    report.detail(format!("documents_missing_coords={missing_coords}"));
    report.detail(format!(
        "documents_missing_fingerprint={missing_fingerprints}"
    ));

    if index.metadata.version != SCHEMA_VERSION {
        report.issue(format!(
            "unexpected schema version {} (this tool writes {})",
            index.metadata.version, SCHEMA_VERSION
        ));
    }
    if index.metadata.manuscript_count != index.documents.len() {
        report.issue(format!(
            "manuscriptCount {} does not match {} documents",
            index.metadata.manuscript_count,
            index.documents.len()
        ));
    }

    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for doc in &index.documents {
        if !seen.insert(doc.id.as_str()) {
            duplicates.insert(doc.id.as_str());
        }
    }
    if !duplicates.is_empty() {
        let ids: Vec<&str> = duplicates.into_iter().collect();
        report.issue(format!("duplicate document ids: {}", ids.join(", ")));
    }

    Ok(report)
}
