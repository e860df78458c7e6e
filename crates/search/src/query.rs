//! Free-text search over catalog records

use crate::Searchable;

/// A normalized, non-empty search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    normalized: String,
    tokens: Vec<String>,
}

impl SearchQuery {
    /// Normalize raw user input. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        let tokens: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return None;
        }
        Some(Self { normalized, tokens })
    }

    /// Trimmed, lowercased query text
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether every token occurs somewhere in the record's searchable text
    pub fn matches<R: Searchable + ?Sized>(&self, record: &R) -> bool {
        let text = searchable_text(record);
        self.tokens.iter().all(|token| text.contains(token.as_str()))
    }

    /// Whether the record's title contains the whole query string
    pub fn title_contains_query<R: Searchable + ?Sized>(&self, record: &R) -> bool {
        record.title().to_lowercase().contains(&self.normalized)
    }
}

fn searchable_text<R: Searchable + ?Sized>(record: &R) -> String {
    format!(
        "{} {} {} {}",
        record.title(),
        record.category().unwrap_or_default(),
        record.description().unwrap_or_default(),
        record.tags().join(" ")
    )
    .to_lowercase()
}

/// Records containing every query token, most relevant first.
///
/// Titles containing the full query rank ahead of the rest; within each group
/// shorter titles come first and ties keep their input order.
pub fn search<'a, R: Searchable>(records: &'a [R], query: &str) -> Vec<&'a R> {
    let Some(query) = SearchQuery::parse(query) else {
        return Vec::new();
    };
    rank(records.iter().filter(|r| query.matches(*r)).collect(), &query)
}

pub(crate) fn rank<'a, R: Searchable>(mut hits: Vec<&'a R>, query: &SearchQuery) -> Vec<&'a R> {
    // sort_by_cached_key is stable
    hits.sort_by_cached_key(|r| (!query.title_contains_query(*r), r.title().chars().count()));
    hits
}
