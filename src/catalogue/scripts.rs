//! Script (palaeographic hand) keyword extraction.
//!
//! Curators describe hands in free text, e.g. "Gothic textualis formata with
//! later cursive additions". Matching is substring-based over a fixed keyword
//! table, so one description can yield several keywords.

/// Script families, matched first. The family name is the emitted keyword.
const SCRIPT_FAMILIES: &[(&str, &[&str])] = &[
    ("gothic", &["gothic", "textura", "textualis", "rotunda"]),
    ("humanistic", &["humanist", "humanistic", "roman"]),
    ("carolingian", &["caroline", "carolingian"]),
    ("insular", &["insular", "anglo-saxon", "irish"]),
    ("cursive", &["cursive", "cursiva"]),
    ("secretary", &["secretary"]),
    ("bastarda", &["bastarda", "bâtarde", "batarde"]),
    ("hybrida", &["hybrida"]),
    ("italic", &["italic"]),
    ("beneventan", &["beneventan"]),
    ("mercantesca", &["mercantesca"]),
    ("anglicana", &["anglicana"]),
];

/// Attributes that refine a family, matched after families.
const SCRIPT_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("textualis", &["textualis", "textura"]),
    ("quadrata", &["quadrata"]),
    ("rotunda", &["rotunda", "rounded"]),
    ("formata", &["formata"]),
    ("minuscule", &["minuscule"]),
    ("majuscule", &["majuscule"]),
    ("semi-cursive", &["semi-cursive"]),
    ("bookhand", &["bookhand", "book hand", "book-hand"]),
    ("semi-quadrata", &["semi-quadrata", "semiquadrata"]),
    ("protogothic", &["protogothic"]),
    ("uncial", &["uncial", "semiuncial"]),
];

const NOT_APPLICABLE_MARKERS: &[&str] = &["n/a", "not applicable"];

pub const OTHER_KEYWORD: &str = "other";
pub const NOT_APPLICABLE_KEYWORD: &str = "not_applicable";

/// Extract standardized script keywords from a free-text hand description.
///
/// Blank input yields no keywords. Descriptions marked not-applicable yield
/// `["not_applicable"]`. Anything non-blank that matches nothing yields
/// `["other"]` so the facet still counts the manuscript.
pub fn extract_script_keywords(description: &str) -> Vec<String> {
    if description.trim().is_empty() {
        return Vec::new();
    }

    let description = description.to_lowercase();
    if NOT_APPLICABLE_MARKERS
        .iter()
        .any(|marker| description.contains(marker))
    {
        return vec![NOT_APPLICABLE_KEYWORD.to_string()];
    }

    let mut keywords = Vec::new();
    for (family, terms) in SCRIPT_FAMILIES {
        if terms.iter().any(|term| description.contains(term)) {
            keywords.push(family.to_string());
        }
    }
    for (attribute, terms) in SCRIPT_ATTRIBUTES {
        if terms.iter().any(|term| description.contains(term)) {
            keywords.push(attribute.to_string());
        }
    }

    if keywords.is_empty() {
        keywords.push(OTHER_KEYWORD.to_string());
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::extract_script_keywords;

    #[test]
    fn blank_description_yields_nothing() {
        assert!(extract_script_keywords("").is_empty());
        assert!(extract_script_keywords("   ").is_empty());
    }

    #[test]
    fn not_applicable_short_circuits() {
        assert_eq!(
            extract_script_keywords("N/A (printed book)"),
            vec!["not_applicable"]
        );
        assert_eq!(
            extract_script_keywords("Not applicable"),
            vec!["not_applicable"]
        );
    }

    #[test]
    fn family_and_attributes_combine() {
        let got = extract_script_keywords("Gothic textualis formata");
        assert_eq!(got, vec!["gothic", "textualis", "formata"]);
    }

    #[test]
    fn textura_maps_to_gothic_family_and_textualis_attribute() {
        let got = extract_script_keywords("Textura quadrata");
        assert_eq!(got, vec!["gothic", "textualis", "quadrata"]);
    }

    #[test]
    fn unmatched_description_falls_back_to_other() {
        assert_eq!(extract_script_keywords("unknown"), vec!["other"]);
        assert_eq!(
            extract_script_keywords("a very peculiar hand"),
            vec!["other"]
        );
    }

    #[test]
    fn accented_bastarda_spelling_matches() {
        assert_eq!(
            extract_script_keywords("Bâtarde flamande"),
            vec!["bastarda"]
        );
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(
            extract_script_keywords("CAROLINGIAN MINUSCULE"),
            vec!["carolingian", "minuscule"]
        );
    }
}
