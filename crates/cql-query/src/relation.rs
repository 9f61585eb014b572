//! Mapping between comparison symbols and their FQ relation words.

/// The six comparison relations as `(symbol, word)` pairs.
const RELATIONS: [(&str, &str); 6] = [
    ("<", "lt"),
    (">", "gt"),
    ("=", "eq"),
    ("<>", "ne"),
    (">=", "ge"),
    ("<=", "le"),
];

/// Returns the word for a comparison symbol, e.g. `<=` -> `le`.
pub fn word_of(symbol: &str) -> Option<&'static str> {
    RELATIONS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, word)| *word)
}

/// Returns the comparison symbol for a word, e.g. `le` -> `<=`.
///
/// Only the exact lowercase words match, so `GE` passes through unchanged.
pub fn symbol_of(word: &str) -> Option<&'static str> {
    RELATIONS
        .iter()
        .find(|(_, w)| *w == word)
        .map(|(symbol, _)| *symbol)
}

/// Maps a relation to its word form, passing non-symbols through.
pub fn to_word(relation: &str) -> &str {
    word_of(relation).unwrap_or(relation)
}

/// Maps a relation to its symbol form, passing non-words through.
pub fn to_symbol(relation: &str) -> &str {
    symbol_of(relation).unwrap_or(relation)
}
