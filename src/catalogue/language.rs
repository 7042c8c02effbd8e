//! Language standardization to ISO 639-3 codes.
//!
//! Catalogue records name languages every way imaginable: display names
//! ("Latin"), MARC-style qualified names ("English, Middle (1100-1500)"),
//! two- or three-letter codes, or nothing useful at all. Standardization
//! tries a manual table first, then the embedded ISO table, and keeps the
//! raw value when every lookup misses so no data is silently dropped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nonstandard and MARC-qualified forms seen in real records. Matched
/// exactly, before any ISO lookup.
const MANUAL_LANGUAGE_MAP: &[(&str, &str)] = &[
    ("Middle English", "enm"),
    ("English, Middle (1100-1500)", "enm"),
    ("French, Middle (ca.1400-1600)", "frm"),
    ("Greek, Ancient (to 1453)", "grc"),
    ("Church Slavic", "chu"),
    ("Middle High German", "gmh"),
    ("German, Middle High (ca.1050-1500)", "gmh"),
    ("No linguistic content; Not applicable", "zxx"),
    ("none", "zxx"),
];

/// Embedded ISO 639 slice: `(name, alpha-2 or "", alpha-3)`. Covers the
/// languages that actually occur in western manuscript catalogues rather
/// than the full registry.
const ISO_LANGUAGES: &[(&str, &str, &str)] = &[
    ("Latin", "la", "lat"),
    ("Ancient Greek", "", "grc"),
    ("Greek", "el", "ell"),
    ("Church Slavic", "cu", "chu"),
    ("English", "en", "eng"),
    ("Middle English", "", "enm"),
    ("Old English", "", "ang"),
    ("German", "de", "deu"),
    ("Middle High German", "", "gmh"),
    ("Old High German", "", "goh"),
    ("Middle Low German", "", "gml"),
    ("French", "fr", "fra"),
    ("Middle French", "", "frm"),
    ("Old French", "", "fro"),
    ("Anglo-Norman", "", "xno"),
    ("Italian", "it", "ita"),
    ("Spanish", "es", "spa"),
    ("Portuguese", "pt", "por"),
    ("Catalan", "ca", "cat"),
    ("Occitan", "oc", "oci"),
    ("Old Occitan", "", "pro"),
    ("Dutch", "nl", "nld"),
    ("Middle Dutch", "", "dum"),
    ("Irish", "ga", "gle"),
    ("Old Irish", "", "sga"),
    ("Middle Irish", "", "mga"),
    ("Welsh", "cy", "cym"),
    ("Cornish", "kw", "cor"),
    ("Breton", "br", "bre"),
    ("Scottish Gaelic", "gd", "gla"),
    ("Scots", "", "sco"),
    ("Danish", "da", "dan"),
    ("Swedish", "sv", "swe"),
    ("Norwegian", "no", "nor"),
    ("Old Norse", "", "non"),
    ("Icelandic", "is", "isl"),
    ("Gothic", "", "got"),
    ("Czech", "cs", "ces"),
    ("Polish", "pl", "pol"),
    ("Russian", "ru", "rus"),
    ("Ukrainian", "uk", "ukr"),
    ("Belarusian", "be", "bel"),
    ("Bulgarian", "bg", "bul"),
    ("Serbian", "sr", "srp"),
    ("Croatian", "hr", "hrv"),
    ("Slovenian", "sl", "slv"),
    ("Slovak", "sk", "slk"),
    ("Hungarian", "hu", "hun"),
    ("Romanian", "ro", "ron"),
    ("Albanian", "sq", "sqi"),
    ("Finnish", "fi", "fin"),
    ("Estonian", "et", "est"),
    ("Basque", "eu", "eus"),
    ("Maltese", "mt", "mlt"),
    ("Turkish", "tr", "tur"),
    ("Ottoman Turkish", "", "ota"),
    ("Arabic", "ar", "ara"),
    ("Hebrew", "he", "heb"),
    ("Aramaic", "", "arc"),
    ("Syriac", "", "syr"),
    ("Classical Syriac", "", "syc"),
    ("Coptic", "", "cop"),
    ("Geez", "", "gez"),
    ("Amharic", "am", "amh"),
    ("Armenian", "hy", "hye"),
    ("Georgian", "ka", "kat"),
    ("Persian", "fa", "fas"),
    ("Sanskrit", "sa", "san"),
    ("Yiddish", "yi", "yid"),
    ("Ladino", "", "lad"),
    ("Multiple languages", "", "mul"),
    ("Undetermined", "", "und"),
    ("No linguistic content", "", "zxx"),
];

fn push_unique(codes: &mut Vec<String>, code: String) {
    if !codes.contains(&code) {
        codes.push(code);
    }
}

/// Map raw language values to ISO 639-3 codes.
///
/// Lookup order per value: manual table (exact), ISO name
/// (case-insensitive), alpha-2 code, alpha-3 code. Values that survive
/// every lookup are kept verbatim (trimmed). The result is deduplicated
/// preserving first-seen order.
pub fn standardize_languages(raw: &[String]) -> Vec<String> {
    let mut codes = Vec::new();

    for value in raw {
        let trimmed = value.trim();

        if let Some((_, code)) = MANUAL_LANGUAGE_MAP
            .iter()
            .find(|(name, _)| *name == trimmed)
        {
            push_unique(&mut codes, code.to_string());
            continue;
        }

        if let Some((_, _, alpha3)) = ISO_LANGUAGES
            .iter()
            .find(|(name, _, _)| name.eq_ignore_ascii_case(trimmed))
        {
            push_unique(&mut codes, alpha3.to_string());
            continue;
        }

        let chars = trimmed.chars().count();
        if chars == 2 {
            let lower = trimmed.to_lowercase();
            if let Some((_, _, alpha3)) = ISO_LANGUAGES
                .iter()
                .find(|(_, alpha2, _)| !alpha2.is_empty() && *alpha2 == lower)
            {
                push_unique(&mut codes, alpha3.to_string());
                continue;
            }
        }
        if chars == 3 {
            let lower = trimmed.to_lowercase();
            if ISO_LANGUAGES.iter().any(|(_, _, alpha3)| *alpha3 == lower) {
                push_unique(&mut codes, lower);
                continue;
            }
        }

        push_unique(&mut codes, trimmed.to_string());
    }

    codes
}

/// Display metadata for the codes the client renders. Shipped verbatim in
/// the index under `metadata.language_metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_historical: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// `(code, display name, historical, parent-or-"")`
const CLIENT_LANGUAGES: &[(&str, &str, bool, &str)] = &[
    ("la", "Latin", true, ""),
    ("grc", "Ancient Greek", true, "el"),
    ("chu", "Church Slavic", true, ""),
    ("en", "English", false, ""),
    ("enm", "Middle English", true, "en"),
    ("ang", "Old English", true, "en"),
    ("de", "German", false, ""),
    ("gmh", "Middle High German", true, "de"),
    ("goh", "Old High German", true, "de"),
    ("fr", "French", false, ""),
    ("frm", "Middle French", true, "fr"),
    ("fro", "Old French", true, "fr"),
    ("it", "Italian", false, ""),
    ("es", "Spanish", false, ""),
    ("pt", "Portuguese", false, ""),
    ("ar", "Arabic", false, ""),
    ("el", "Greek", false, ""),
    ("he", "Hebrew", false, ""),
    ("zxx", "No linguistic content", false, ""),
];

pub fn client_language_metadata() -> BTreeMap<String, LanguageInfo> {
    CLIENT_LANGUAGES
        .iter()
        .map(|(code, name, historical, parent)| {
            let info = LanguageInfo {
                name: name.to_string(),
                is_historical: historical.then_some(true),
                parent: (!parent.is_empty()).then(|| parent.to_string()),
            };
            (code.to_string(), info)
        })
        .collect()
}
