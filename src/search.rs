use deunicode::deunicode;

/// Normalize a string for filtering: transliterate to ASCII, collapse
/// whitespace and lowercase (e.g. "Иван  Петров" -> "ivan petrov").
pub fn normalize(s: &str) -> String {
    deunicode(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize(trimmed))
    }
}

/// Every whitespace-separated term of `query` occurs somewhere in `haystack`.
/// Both sides are expected to be normalized already.
pub fn matches_terms(haystack: &str, query: &str) -> bool {
    query.split_whitespace().all(|term| haystack.contains(term))
}
