//! Assembly of one indexed document from raw catalogue metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::language::standardize_languages;
use super::materials::extract_material_keywords;
use super::metadata::{
    ensure_str, ensure_string_list, get_path, parse_coordinates, parse_date_range,
};
use super::scripts::extract_script_keywords;

pub const DEFAULT_TITLE: &str = "Untitled Manuscript";
pub const MISSING_BRIEF: &str = "No description available";

pub const STATUS_UNTRANSCRIBED: &str = "untranscribed";
pub const STATUS_PARTIAL: &str = "partial";
pub const STATUS_TRANSCRIBED: &str = "transcribed";

/// One manuscript as published in the index `documents` array.
///
/// Field order is the serialization order the client sees. Optional fields
/// are omitted entirely rather than written as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub shelfmark: String,
    pub repository: String,
    pub authors: Vec<String>,
    pub origin_location: String,
    pub languages: Vec<String>,
    pub material_keywords: Vec<String>,
    pub script_keywords: Vec<String>,
    pub page_count: usize,
    #[serde(default = "default_transcription_status")]
    pub transcription_status: String,
    pub brief: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pca_coords: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

fn default_transcription_status() -> String {
    STATUS_UNTRANSCRIBED.to_string()
}

/// A processed manuscript plus the text the similarity projection runs on.
/// The search text never reaches the published index.
#[derive(Debug, Clone)]
pub struct ProcessedManuscript {
    pub document: Document,
    pub search_text: String,
}

/// Counts derived from the page tree during the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    pub page_count: usize,
    pub transcribed_pages: usize,
}

pub fn transcription_status(pages: PageStats) -> &'static str {
    if pages.transcribed_pages == 0 || pages.page_count == 0 {
        STATUS_UNTRANSCRIBED
    } else if pages.transcribed_pages >= pages.page_count {
        STATUS_TRANSCRIBED
    } else {
        STATUS_PARTIAL
    }
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn join_nonblank(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize one manuscript's raw metadata into a [`ProcessedManuscript`].
///
/// Never fails: every field degrades to its documented default instead.
pub fn process_manuscript(
    id: &str,
    metadata: &Value,
    pages: PageStats,
    fingerprint: Option<String>,
) -> ProcessedManuscript {
    let title = ensure_str(metadata.get("title"), DEFAULT_TITLE);

    let script_type = ensure_str(
        get_path(metadata, &["physical_description", "script_type"]),
        "unknown",
    );
    let script_keywords = extract_script_keywords(&script_type);

    let material_type = ensure_str(
        get_path(metadata, &["physical_description", "material"]),
        "unknown",
    );
    let mut material_keywords = extract_material_keywords(&material_type);
    for field in ["binding", "artwork"] {
        let description = ensure_str(get_path(metadata, &["physical_description", field]), "");
        if !description.is_empty() {
            material_keywords.extend(extract_material_keywords(&description));
        }
    }
    let material_keywords = dedup_preserving_order(material_keywords);

    let raw_languages = ensure_string_list(metadata.get("languages"), &["Unknown"]);
    let languages = standardize_languages(&raw_languages);

    let date_range = parse_date_range(metadata.get("date_range"));
    let coordinates = parse_coordinates(metadata.get("coordinates"));

    let contents_summary = ensure_str(metadata.get("contents_summary"), "");
    let historical_context = ensure_str(metadata.get("historical_context"), "");
    let search_text = join_nonblank(&[&title, &contents_summary, &historical_context]);

    let brief = if contents_summary.is_empty() {
        MISSING_BRIEF.to_string()
    } else {
        contents_summary.clone()
    };

    let document = Document {
        id: id.to_string(),
        title,
        shelfmark: ensure_str(metadata.get("shelfmark"), ""),
        repository: ensure_str(metadata.get("repository"), ""),
        authors: ensure_string_list(metadata.get("authors"), &["Unknown"]),
        origin_location: ensure_str(metadata.get("origin_location"), "Unknown"),
        languages,
        material_keywords,
        script_keywords,
        page_count: pages.page_count,
        transcription_status: transcription_status(pages).to_string(),
        brief,
        start_year: date_range.map(|r| r.start_year),
        end_year: date_range.map(|r| r.end_year),
        date_range_text: date_range.map(|r| format!("{}-{}", r.start_year, r.end_year)),
        latitude: coordinates.map(|p| p.latitude),
        longitude: coordinates.map(|p| p.longitude),
        pca_coords: None,
        fingerprint,
    };

    ProcessedManuscript {
        document,
        search_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pages(page_count: usize, transcribed_pages: usize) -> PageStats {
        PageStats {
            page_count,
            transcribed_pages,
        }
    }

    #[test]
    fn full_record_is_normalized() {
        let metadata = json!({
            "title": "Book of Hours, Use of Sarum",
            "shelfmark": "MS Lat. 42",
            "repository": "Bodleian Library",
            "authors": ["Anonymous"],
            "origin_location": "Flanders",
            "languages": ["Latin", "Middle English"],
            "date_range": [1440, 1460],
            "coordinates": [51.0543, 3.7174],
            "contents_summary": "Calendar, hours of the Virgin, penitential psalms.",
            "historical_context": "Produced for the English export market.",
            "physical_description": {
                "material": "Parchment",
                "script_type": "Gothic textualis",
                "binding": "contemporary blind-tooled calf over wooden boards"
            }
        });

        let got = process_manuscript("ms-042", &metadata, pages(12, 12), Some("abc123".into()));
        let doc = &got.document;

        assert_eq!(doc.id, "ms-042");
        assert_eq!(doc.title, "Book of Hours, Use of Sarum");
        assert_eq!(doc.languages, vec!["lat", "enm"]);
        assert_eq!(
            doc.material_keywords,
            vec!["parchment", "leather", "wooden", "tooling", "contemporary"]
        );
        assert_eq!(doc.script_keywords, vec!["gothic", "textualis"]);
        assert_eq!(doc.page_count, 12);
        assert_eq!(doc.transcription_status, STATUS_TRANSCRIBED);
        assert_eq!(doc.start_year, Some(1440));
        assert_eq!(doc.end_year, Some(1460));
        assert_eq!(doc.date_range_text.as_deref(), Some("1440-1460"));
        assert_eq!(doc.latitude, Some(51.0543));
        assert_eq!(doc.fingerprint.as_deref(), Some("abc123"));
        assert!(got.search_text.starts_with("Book of Hours"));
        assert!(got.search_text.contains("export market"));
    }

    #[test]
    fn empty_record_gets_defaults() {
        let metadata = json!({});
        let got = process_manuscript("ms-000", &metadata, pages(0, 0), None);
        let doc = &got.document;

        assert_eq!(doc.title, DEFAULT_TITLE);
        assert_eq!(doc.shelfmark, "");
        assert_eq!(doc.repository, "");
        assert_eq!(doc.authors, vec!["Unknown"]);
        assert_eq!(doc.origin_location, "Unknown");
        assert_eq!(doc.languages, vec!["Unknown"]);
        assert!(doc.material_keywords.is_empty());
        // An absent script type reads as "unknown", which matches nothing.
        assert_eq!(doc.script_keywords, vec!["other"]);
        assert_eq!(doc.brief, MISSING_BRIEF);
        assert_eq!(doc.transcription_status, STATUS_UNTRANSCRIBED);
        assert_eq!(doc.start_year, None);
        assert_eq!(doc.latitude, None);
        // The defaulted title still gives the document projection text.
        assert_eq!(got.search_text, DEFAULT_TITLE);
    }

    #[test]
    fn binding_and_artwork_keywords_merge_without_duplicates() {
        let metadata = json!({
            "physical_description": {
                "material": "parchment and paper",
                "binding": "modern calf, rebacked",
                "artwork": "gilt initials on parchment"
            }
        });
        let got = process_manuscript("ms-1", &metadata, pages(0, 0), None);
        assert_eq!(
            got.document.material_keywords,
            vec!["parchment", "paper", "leather", "modern", "restored", "metal_decoration"]
        );
    }

    #[test]
    fn malformed_optional_fields_are_dropped_not_fatal() {
        let metadata = json!({
            "title": "Fragment",
            "date_range": ["circa 1200"],
            "coordinates": [95.0, 10.0],
            "physical_description": "a string, not an object"
        });
        let got = process_manuscript("ms-2", &metadata, pages(1, 0), None);
        let doc = &got.document;
        assert_eq!(doc.start_year, None);
        assert_eq!(doc.date_range_text, None);
        assert_eq!(doc.latitude, None);
        assert_eq!(doc.script_keywords, vec!["other"]);
    }

    #[test]
    fn transcription_status_buckets() {
        assert_eq!(transcription_status(pages(0, 0)), STATUS_UNTRANSCRIBED);
        assert_eq!(transcription_status(pages(8, 0)), STATUS_UNTRANSCRIBED);
        assert_eq!(transcription_status(pages(8, 3)), STATUS_PARTIAL);
        assert_eq!(transcription_status(pages(8, 8)), STATUS_TRANSCRIBED);
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let metadata = json!({"title": "Psalter"});
        let got = process_manuscript("ms-3", &metadata, pages(0, 0), None);
        let value = serde_json::to_value(&got.document).unwrap();
        assert!(value.get("start_year").is_none());
        assert!(value.get("pca_coords").is_none());
        assert!(value.get("fingerprint").is_none());
        assert_eq!(value["page_count"], 0);
    }
}
