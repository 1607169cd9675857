//! Text normalization and search-token extraction.
//!
//! Every piece of text that participates in matching, workflow fields at
//! index time and the query string at search time alike, goes through the same
//! [`normalize`]/[`tokenize`] pipeline, so accented and Turkish text matches
//! plain-ASCII queries. [`build_search_tokens`] additionally applies the
//! stopword and length filters and keeps the 64 most frequent tokens per
//! workflow.

use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maximum number of search tokens kept per workflow.
pub const MAX_SEARCH_TOKENS: usize = 64;

/// Tokens shorter than this are dropped at index time.
const MIN_TOKEN_CHARS: usize = 3;

/// English articles, prepositions, pronouns, auxiliaries, and generic
/// automation nouns that carry no ranking signal in this corpus.
const STOPWORDS: &[&str] = &[
    "about", "after", "all", "and", "any", "are", "auto", "automated", "automation", "been",
    "before", "between", "but", "can", "could", "create", "data", "delete", "each", "false",
    "for", "from", "get", "had", "has", "have", "how", "into", "item", "items", "its", "json",
    "list", "more", "most", "new", "node", "nodes", "not", "our", "over", "per", "run", "send",
    "set", "should", "some", "such", "test", "than", "that", "the", "their", "them", "then",
    "these", "they", "this", "those", "trigger", "triggered", "triggers", "true", "under",
    "update", "use", "used", "using", "value", "values", "via", "was", "webhook", "were", "what",
    "when", "where", "which", "while", "who", "why", "will", "with", "workflow", "workflows",
    "would", "you", "your",
];

/// Lowercases, decomposes (NFD), strips combining marks, and maps the Turkish
/// dotless `ı` to `i`.
///
/// Lowercasing runs first so `İ` becomes `i` plus a combining dot, which the
/// mark filter then removes.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect()
}

/// Splits normalized text on every run of non-alphanumeric characters.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Builds the frequency-ranked search-token list for one workflow.
///
/// Tokens shorter than three characters and stopwords are dropped; the rest
/// are counted across all fields, sorted by descending frequency (ties keep
/// first-seen order: the sort is stable and the accumulator preserves
/// insertion order), and capped at [`MAX_SEARCH_TOKENS`].
pub fn build_search_tokens(fields: &[String]) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for field in fields {
        for token in tokenize(field) {
            if token.chars().count() < MIN_TOKEN_CHARS || is_stopword(&token) {
                continue;
            }
            match positions.get(&token) {
                Some(&at) => counts[at].1 += 1,
                None => {
                    positions.insert(token.clone(), counts.len());
                    counts.push((token, 1));
                }
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(MAX_SEARCH_TOKENS);
    counts.into_iter().map(|(token, _)| token).collect()
}
