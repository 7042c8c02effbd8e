//! The published search index: one JSON document with a metadata header,
//! the document list, and precomputed facets. Also the incremental merge
//! that reconciles a prior index against a fresh scan.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use super::document::{Document, MISSING_BRIEF, ProcessedManuscript};
use super::facets::{Facets, extract_facets};
use super::language::{LanguageInfo, client_language_metadata};
use super::projection::project_documents;
use super::store::ManuscriptEntry;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub version: u32,
    #[serde(rename = "manuscriptCount")]
    pub manuscript_count: usize,
    #[serde(rename = "generatedDate")]
    pub generated_date: String,
    pub language_metadata: BTreeMap<String, LanguageInfo>,
}

impl IndexMetadata {
    fn now(manuscript_count: usize) -> Self {
        Self {
            version: SCHEMA_VERSION,
            manuscript_count,
            generated_date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            language_metadata: client_language_metadata(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndex {
    pub metadata: IndexMetadata,
    pub documents: Vec<Document>,
    pub facets: Facets,
}

impl SearchIndex {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("serializing search index")
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("parsing search index")
    }
}

fn attach_projection(documents: &mut [Document], texts: &[(String, String)]) {
    let coords = project_documents(texts);
    for doc in documents {
        doc.pca_coords = coords.get(&doc.id).copied();
    }
}

/// Build a complete index from freshly processed manuscripts. The
/// projection runs on the full search text captured during processing.
pub fn assemble_index(processed: Vec<ProcessedManuscript>) -> SearchIndex {
    let texts: Vec<(String, String)> = processed
        .iter()
        .map(|p| (p.document.id.clone(), p.search_text.clone()))
        .collect();
    let mut documents: Vec<Document> = processed.into_iter().map(|p| p.document).collect();

    attach_projection(&mut documents, &texts);
    let facets = extract_facets(&documents);

    SearchIndex {
        metadata: IndexMetadata::now(documents.len()),
        documents,
        facets,
    }
}

/// What an incremental run must do, from set-differencing the prior
/// index's manuscript IDs against a fresh scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePlan {
    pub new_ids: Vec<String>,
    pub changed_ids: Vec<String>,
    pub removed_ids: Vec<String>,
    pub unchanged_ids: Vec<String>,
}

impl MergePlan {
    /// IDs whose metadata must be re-downloaded and re-processed.
    pub fn refresh_ids(&self) -> BTreeSet<String> {
        self.new_ids
            .iter()
            .chain(self.changed_ids.iter())
            .cloned()
            .collect()
    }

    pub fn is_noop(&self) -> bool {
        self.new_ids.is_empty() && self.changed_ids.is_empty() && self.removed_ids.is_empty()
    }
}

/// Classify every manuscript by comparing store fingerprints against the
/// ones recorded in the prior index. A document with no recorded
/// fingerprint (older index formats) is always treated as changed.
pub fn plan_merge(prior: &SearchIndex, entries: &[ManuscriptEntry]) -> MergePlan {
    let prior_by_id: BTreeMap<&str, &Document> = prior
        .documents
        .iter()
        .map(|doc| (doc.id.as_str(), doc))
        .collect();
    let current_ids: BTreeSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();

    let mut plan = MergePlan::default();
    for entry in entries {
        match prior_by_id.get(entry.id.as_str()) {
            None => plan.new_ids.push(entry.id.clone()),
            Some(doc) => {
                let unchanged = doc
                    .fingerprint
                    .as_deref()
                    .is_some_and(|prior_fp| {
                        !prior_fp.is_empty() && prior_fp == entry.metadata.fingerprint
                    });
                if unchanged {
                    plan.unchanged_ids.push(entry.id.clone());
                } else {
                    plan.changed_ids.push(entry.id.clone());
                }
            }
        }
    }
    for id in prior_by_id.keys() {
        if !current_ids.contains(id) {
            plan.removed_ids.push(id.to_string());
        }
    }
    plan
}

/// Projection text available from the index itself, used when merging
/// documents that were not re-processed this run.
fn index_search_text(doc: &Document) -> String {
    let mut parts = vec![doc.title.as_str()];
    if doc.brief != MISSING_BRIEF {
        parts.push(doc.brief.as_str());
    }
    parts.retain(|part| !part.trim().is_empty());
    parts.join(" ")
}

/// Overwrite the prior index with re-processed documents, drop removed
/// manuscripts, and rebuild everything derived: projection coordinates,
/// facets, and the metadata header. Documents come out ordered by ID.
pub fn merge_index(
    prior: SearchIndex,
    refreshed: Vec<ProcessedManuscript>,
    removed_ids: &BTreeSet<String>,
) -> SearchIndex {
    let mut by_id: BTreeMap<String, Document> = prior
        .documents
        .into_iter()
        .filter(|doc| !removed_ids.contains(&doc.id))
        .map(|doc| (doc.id.clone(), doc))
        .collect();
    for processed in refreshed {
        by_id.insert(processed.document.id.clone(), processed.document);
    }

    let mut documents: Vec<Document> = by_id.into_values().collect();
    // Re-fit over uniform index-side text so carried-over and refreshed
    // documents share one corpus.
    let texts: Vec<(String, String)> = documents
        .iter()
        .map(|doc| (doc.id.clone(), index_search_text(doc)))
        .collect();
    attach_projection(&mut documents, &texts);
    let facets = extract_facets(&documents);

    SearchIndex {
        metadata: IndexMetadata::now(documents.len()),
        documents,
        facets,
    }
}

/// Write the serialized index under `path` via a temp file in the same
/// directory, so a crash never leaves a half-written index behind.
pub fn write_local_copy(bytes: &[u8], path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("creating output directory {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temp file in {}", parent.display()))?;
    tmp.write_all(bytes).context("writing local index copy")?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::document::{PageStats, process_manuscript};
    use crate::catalogue::store::ObjectInfo;
    use serde_json::json;

    fn processed(id: &str, title: &str, fingerprint: &str) -> ProcessedManuscript {
        let metadata = json!({
            "title": title,
            "languages": ["Latin"],
            "contents_summary": format!("{title} with calendar and litany"),
        });
        process_manuscript(
            id,
            &metadata,
            PageStats::default(),
            Some(fingerprint.to_string()),
        )
    }

    fn entry(id: &str, fingerprint: &str) -> ManuscriptEntry {
        ManuscriptEntry {
            id: id.to_string(),
            metadata: ObjectInfo {
                name: format!("catalogue/{id}/standard_metadata.json"),
                fingerprint: fingerprint.to_string(),
                size: 2,
            },
            pages: PageStats::default(),
        }
    }

    fn sample_index() -> SearchIndex {
        assemble_index(vec![
            processed("ms-1", "Psalter", "fp-1"),
            processed("ms-2", "Gradual", "fp-2"),
            processed("ms-3", "Herbal", "fp-3"),
        ])
    }

    #[test]
    fn assemble_attaches_coordinates_and_facets() {
        let index = sample_index();
        assert_eq!(index.metadata.version, SCHEMA_VERSION);
        assert_eq!(index.metadata.manuscript_count, 3);
        assert!(index.metadata.language_metadata.contains_key("la"));
        assert!(index.documents.iter().all(|d| d.pca_coords.is_some()));
        assert_eq!(index.facets.languages["lat"].len(), 3);
    }

    #[test]
    fn serialized_shape_matches_the_client_contract() {
        let index = sample_index();
        let value: serde_json::Value = serde_json::from_slice(&index.to_bytes().unwrap()).unwrap();
        assert_eq!(value["metadata"]["version"], 1);
        assert_eq!(value["metadata"]["manuscriptCount"], 3);
        assert!(value["metadata"]["generatedDate"].is_string());
        assert_eq!(value["metadata"]["language_metadata"]["la"]["name"], "Latin");
        assert_eq!(value["documents"].as_array().unwrap().len(), 3);
        assert!(value["facets"]["languages"].is_object());
    }

    #[test]
    fn parse_roundtrips() {
        let index = sample_index();
        let again = SearchIndex::parse(&index.to_bytes().unwrap()).unwrap();
        assert_eq!(again.documents, index.documents);
        assert_eq!(again.facets, index.facets);
    }

    #[test]
    fn plan_classifies_new_changed_removed_unchanged() {
        let prior = sample_index();
        let entries = vec![
            entry("ms-1", "fp-1"),
            entry("ms-2", "fp-2-modified"),
            entry("ms-4", "fp-4"),
        ];

        let plan = plan_merge(&prior, &entries);
        assert_eq!(plan.unchanged_ids, vec!["ms-1"]);
        assert_eq!(plan.changed_ids, vec!["ms-2"]);
        assert_eq!(plan.new_ids, vec!["ms-4"]);
        assert_eq!(plan.removed_ids, vec!["ms-3"]);
        assert!(!plan.is_noop());

        let refresh = plan.refresh_ids();
        assert!(refresh.contains("ms-2") && refresh.contains("ms-4"));
        assert!(!refresh.contains("ms-1"));
    }

    #[test]
    fn missing_fingerprint_counts_as_changed() {
        let mut prior = sample_index();
        for doc in &mut prior.documents {
            doc.fingerprint = None;
        }
        let plan = plan_merge(&prior, &[entry("ms-1", "fp-1")]);
        assert_eq!(plan.changed_ids, vec!["ms-1"]);
        assert!(plan.unchanged_ids.is_empty());
    }

    #[test]
    fn merge_overwrites_drops_and_rebuilds() {
        let prior = sample_index();
        let refreshed = vec![
            processed("ms-2", "Gradual, second recension", "fp-2b"),
            processed("ms-4", "Antiphonal", "fp-4"),
        ];
        let removed: BTreeSet<String> = ["ms-3".to_string()].into();

        let merged = merge_index(prior, refreshed, &removed);
        let ids: Vec<&str> = merged.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["ms-1", "ms-2", "ms-4"]);
        assert_eq!(merged.metadata.manuscript_count, 3);

        let ms2 = merged.documents.iter().find(|d| d.id == "ms-2").unwrap();
        assert_eq!(ms2.title, "Gradual, second recension");
        assert_eq!(ms2.fingerprint.as_deref(), Some("fp-2b"));

        // Every surviving document gets fresh coordinates and facet rows.
        assert!(merged.documents.iter().all(|d| d.pca_coords.is_some()));
        assert_eq!(merged.facets.languages["lat"].len(), 3);
        assert!(!merged.facets.repository.is_empty());
    }

    #[test]
    fn local_copy_lands_atomically_under_new_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public/search-index.json");
        let index = sample_index();
        write_local_copy(&index.to_bytes().unwrap(), &path).unwrap();

        let reread = SearchIndex::parse(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(reread.metadata.manuscript_count, 3);
    }
}
