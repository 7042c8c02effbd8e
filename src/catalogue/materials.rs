//! Material and binding keyword extraction.
//!
//! Like the script tables, matching is substring-based over lowercase text.
//! The same extractor runs over the material, binding, and artwork fields of
//! a record; callers deduplicate across the three.

const PARCHMENT_TERMS: &[&str] = &["parchment", "vellum"];
const LEATHER_TERMS: &[&str] = &["leather", "calf", "morocco", "sheep", "pigskin", "goatskin"];
const WOOD_TERMS: &[&str] = &["wood", "wooden", "boards"];
const METAL_TERMS: &[&str] = &["gilt", "gold", "silver"];
const PAINT_TERMS: &[&str] = &["paint", "gouache", "oil", "illuminat"];
const FRAGMENT_TERMS: &[&str] = &["fragment", "leaf", "bifolium"];

/// Binding features that map term-for-keyword rather than by material class.
const SPECIAL_FEATURES: &[(&str, &str)] = &[
    ("tooled", "tooling"),
    ("clasp", "clasps"),
    ("binding", "binding"),
    ("modern", "modern"),
    ("contemporary", "contemporary"),
    ("mount", "mounted"),
    ("rebacked", "restored"),
    ("new", "restored"),
    ("stamped", "stamped"),
];

fn push_unique(keywords: &mut Vec<String>, keyword: &str) {
    if !keywords.iter().any(|existing| existing == keyword) {
        keywords.push(keyword.to_string());
    }
}

/// Extract standardized material keywords from a free-text description.
/// Vellum is folded into `parchment`; unmatched text yields nothing.
pub fn extract_material_keywords(description: &str) -> Vec<String> {
    if description.trim().is_empty() {
        return Vec::new();
    }

    let description = description.to_lowercase();
    let mut keywords = Vec::new();

    let classes: &[(&str, &[&str])] = &[
        ("parchment", PARCHMENT_TERMS),
        ("paper", &["paper"]),
        ("leather", LEATHER_TERMS),
        ("wooden", WOOD_TERMS),
        ("cloth", &["cloth"]),
        ("metal_decoration", METAL_TERMS),
        ("painted", PAINT_TERMS),
        ("fragment", FRAGMENT_TERMS),
    ];
    for (keyword, terms) in classes {
        if terms.iter().any(|term| description.contains(term)) {
            push_unique(&mut keywords, keyword);
        }
    }

    for (term, keyword) in SPECIAL_FEATURES {
        if description.contains(term) {
            push_unique(&mut keywords, keyword);
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::extract_material_keywords;

    #[test]
    fn blank_description_yields_nothing() {
        assert!(extract_material_keywords("").is_empty());
        assert!(extract_material_keywords("  ").is_empty());
    }

    #[test]
    fn vellum_standardizes_to_parchment() {
        assert_eq!(extract_material_keywords("Vellum"), vec!["parchment"]);
        assert_eq!(extract_material_keywords("parchment"), vec!["parchment"]);
    }

    #[test]
    fn binding_description_yields_multiple_keywords() {
        let got = extract_material_keywords("Contemporary blind-tooled calf over wooden boards");
        assert_eq!(got, vec!["leather", "wooden", "tooling", "contemporary"]);
    }

    #[test]
    fn restored_is_not_duplicated() {
        let got = extract_material_keywords("rebacked with new endpapers");
        assert_eq!(got.iter().filter(|k| *k == "restored").count(), 1);
    }

    #[test]
    fn gilt_and_illumination_map_to_decoration_keywords() {
        let got = extract_material_keywords("Gilt edges, richly illuminated");
        assert_eq!(got, vec!["metal_decoration", "painted"]);
    }

    #[test]
    fn unmatched_text_yields_nothing() {
        assert!(extract_material_keywords("quarto format").is_empty());
    }
}
