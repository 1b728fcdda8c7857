use regex::Regex;
use std::sync::LazyLock;

/// Maximum token length to store in the index.
/// Longer names are mangled or generated and not worth searching for.
const MAX_TOKEN_LENGTH: usize = 128;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("static identifier pattern"));

/// Search key of a display name: template arguments stripped, lowercased.
///
/// `Promise< void >` -> `promise`, `operator<<` stays whole.
pub fn search_key(name: &str) -> String {
    let trimmed = name.trim();
    let base = if trimmed.starts_with("operator") {
        trimmed
    } else {
        trimmed.split('<').next().unwrap_or(trimmed).trim_end()
    };
    base.to_lowercase()
}

/// A search token together with the text it was cut from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub token: String,
    pub text: String,
}

/// Extract search tokens from a symbol name, in first-occurrence order.
///
/// The whole name (see [`search_key`]) always comes first; it is followed by
/// every identifier segment split on case boundaries, digits and
/// underscores, lowercased, deduplicated and at least `min_segment_len`
/// long. `getRole` yields `getrole`, `get`, `role`.
pub fn name_tokens(name: &str, min_segment_len: usize) -> Vec<String> {
    name_terms(name, min_segment_len)
        .into_iter()
        .map(|term| term.token)
        .collect()
}

/// Like [`name_tokens`], keeping the original spelling of each token
pub fn name_terms(name: &str, min_segment_len: usize) -> Vec<Term> {
    let mut terms: Vec<Term> = Vec::new();

    let whole = search_key(name);
    if whole.is_empty() || whole.len() > MAX_TOKEN_LENGTH {
        return terms;
    }

    let stripped = if whole.starts_with("operator") {
        name.trim()
    } else {
        name.split('<').next().unwrap_or(name).trim()
    };
    terms.push(Term {
        token: whole,
        text: stripped.to_string(),
    });

    for ident in extract_identifiers(stripped) {
        for segment in split_identifier(ident) {
            if segment.len() < min_segment_len.max(1) || segment.len() > MAX_TOKEN_LENGTH {
                continue;
            }
            let token = segment.to_lowercase();
            if !terms.iter().any(|t| t.token == token) {
                terms.push(Term {
                    token,
                    text: segment.to_string(),
                });
            }
        }
    }

    terms
}

/// Split one identifier into its words
///
/// Boundaries: underscores, a capital after a lowercase letter or digit, and
/// the last capital of an acronym run when a lowercase letter follows
/// (`DXEndpoint` -> `DX`, `Endpoint`).
pub fn split_identifier(ident: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = ident.char_indices().collect();
    let mut segments = Vec::new();
    let mut start: Option<usize> = None;

    for (pos, &(offset, ch)) in chars.iter().enumerate() {
        let char_type = classify_char(ch);

        match char_type {
            CharType::Underscore | CharType::Other => {
                if let Some(s) = start.take() {
                    segments.push(&ident[s..offset]);
                }
            }
            CharType::Upper | CharType::Lower | CharType::Digit => {
                let Some(s) = start else {
                    start = Some(offset);
                    continue;
                };

                let prev = classify_char(chars[pos - 1].1);
                let next_is_lower = chars
                    .get(pos + 1)
                    .is_some_and(|&(_, c)| classify_char(c) == CharType::Lower);

                let boundary = char_type == CharType::Upper
                    && (matches!(prev, CharType::Lower | CharType::Digit)
                        || (prev == CharType::Upper && next_is_lower));

                if boundary {
                    segments.push(&ident[s..offset]);
                    start = Some(offset);
                }
            }
        }
    }

    if let Some(s) = start {
        segments.push(&ident[s..]);
    }

    segments
}

/// Extract tokens suitable for query matching
pub fn tokenize_query(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(search_key)
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CharType {
    Upper,
    Lower,
    Digit,
    Underscore,
    Other,
}

fn classify_char(ch: char) -> CharType {
    if ch.is_uppercase() {
        CharType::Upper
    } else if ch.is_lowercase() || ch.is_alphabetic() {
        CharType::Lower
    } else if ch.is_ascii_digit() {
        CharType::Digit
    } else if ch == '_' {
        CharType::Underscore
    } else {
        CharType::Other
    }
}

/// Extract identifiers (complete symbols) from a name or signature
pub fn extract_identifiers(content: &str) -> Vec<&str> {
    IDENTIFIER.find_iter(content).map(|m| m.as_str()).collect()
}
