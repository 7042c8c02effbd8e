//! TF-IDF vectorization of the manuscript text corpus.
//!
//! Tokens are lowercase runs of at least two word characters. IDF is
//! smoothed (`ln((1+n)/(1+df)) + 1`) and each document row is
//! L2-normalized, so cosine similarity is a plain dot product. When the
//! corpus has more distinct terms than `MAX_FEATURES`, the vocabulary keeps
//! the most frequent terms across the whole corpus.

use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const MAX_FEATURES: usize = 1000;

/// Classic English stop list, alphabetically sorted for binary search.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together",
    "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
    "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS.binary_search(&token).is_ok()
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Lowercase and split into word-character runs of length >= 2, with stop
/// words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in lower.chars() {
        if is_word_char(ch) {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens.retain(|token| token.chars().count() >= 2 && !is_stop_word(token));
    tokens
}

/// A fitted corpus: vocabulary in column order plus the weighted matrix,
/// one row per input document.
#[derive(Debug, Clone)]
pub struct TfidfFit {
    pub vocabulary: Vec<String>,
    pub matrix: Array2<f64>,
}

pub fn fit_transform(corpus: &[&str], max_features: usize) -> TfidfFit {
    let docs: Vec<Vec<String>> = corpus.iter().map(|text| tokenize(text)).collect();

    let mut corpus_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut doc_frequency: BTreeMap<&str, usize> = BTreeMap::new();
    for tokens in &docs {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for token in tokens {
            *corpus_counts.entry(token).or_default() += 1;
            seen.insert(token);
        }
        for token in seen {
            *doc_frequency.entry(token).or_default() += 1;
        }
    }

    let mut terms: Vec<(&str, usize)> = corpus_counts.iter().map(|(t, c)| (*t, *c)).collect();
    if terms.len() > max_features {
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(max_features);
    }
    let mut vocabulary: Vec<String> = terms.into_iter().map(|(t, _)| t.to_string()).collect();
    vocabulary.sort();

    let index: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, term)| (term.as_str(), i))
        .collect();

    let n_docs = corpus.len();
    let n_terms = vocabulary.len();
    let mut matrix = Array2::<f64>::zeros((n_docs, n_terms));
    for (row, tokens) in docs.iter().enumerate() {
        for token in tokens {
            if let Some(&col) = index.get(token.as_str()) {
                matrix[[row, col]] += 1.0;
            }
        }
    }

    for (col, term) in vocabulary.iter().enumerate() {
        let df = doc_frequency.get(term.as_str()).copied().unwrap_or(0);
        let idf = ((1 + n_docs) as f64 / (1 + df) as f64).ln() + 1.0;
        for row in 0..n_docs {
            matrix[[row, col]] *= idf;
        }
    }

    for mut row in matrix.rows_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }

    TfidfFit { matrix, vocabulary }
}
