//! Facet maps: facet value -> manuscript IDs, precomputed so the client
//! filters without any query engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::document::Document;

pub type FacetMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    pub languages: FacetMap,
    pub material_keywords: FacetMap,
    pub script_keywords: FacetMap,
    pub repository: FacetMap,
    #[serde(default)]
    pub transcription_status: FacetMap,
}

fn bucket(map: &mut FacetMap, value: &str, id: &str) {
    map.entry(value.to_string())
        .or_default()
        .push(id.to_string());
}

/// Group documents by facet value. IDs appear in document order within
/// each bucket. The repository facet uses the stored string as-is, which
/// may be empty.
pub fn extract_facets(documents: &[Document]) -> Facets {
    let mut facets = Facets::default();
    for doc in documents {
        for language in &doc.languages {
            bucket(&mut facets.languages, language, &doc.id);
        }
        for keyword in &doc.material_keywords {
            bucket(&mut facets.material_keywords, keyword, &doc.id);
        }
        for keyword in &doc.script_keywords {
            bucket(&mut facets.script_keywords, keyword, &doc.id);
        }
        bucket(&mut facets.repository, &doc.repository, &doc.id);
        bucket(
            &mut facets.transcription_status,
            &doc.transcription_status,
            &doc.id,
        );
    }
    facets
}
