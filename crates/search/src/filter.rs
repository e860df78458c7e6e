//! Catalog filtering
//!
//! Decides which records are displayed for the current browse state. A free
//! text query, when present, supersedes the category selection entirely; the
//! selection is kept so clearing the query restores it.
//!
//! Category filtering admits a record through the first tier that accepts it:
//! 1. exact (case-sensitive) category equality
//! 2. tag equality or partial tag overlap
//! 3. fuzzy category confidence at or above the configured threshold
//!
//! Admitted records keep their input order.

use crate::category::{CategoryMatcher, ScoreBreakdown};
use crate::query::{self, SearchQuery};
use crate::Searchable;
use pdfhub_common::config::MatchingConfig;
use pdfhub_common::ALL_CATEGORIES;
use serde::Serialize;

/// Active category selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategorySelection {
    #[default]
    All,
    Label(String),
}

impl CategorySelection {
    /// Absent, blank and "All" all mean no category filter
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(label) if label == ALL_CATEGORIES => Self::All,
            Some(label) => Self::Label(label.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Label(label) => label,
        }
    }
}

/// What the catalog view is currently doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseMode {
    Browsing(CategorySelection),
    Searching {
        query: String,
        /// Selection to restore once the query is cleared
        retained: CategorySelection,
    },
}

impl Default for BrowseMode {
    fn default() -> Self {
        Self::Browsing(CategorySelection::All)
    }
}

impl BrowseMode {
    /// Selecting a category always leaves search mode
    pub fn select_category(self, selection: CategorySelection) -> Self {
        Self::Browsing(selection)
    }

    /// A blank query is the same as clearing it
    pub fn enter_query(self, query: &str) -> Self {
        let retained = self.category().clone();
        if query.trim().is_empty() {
            Self::Browsing(retained)
        } else {
            Self::Searching {
                query: query.to_string(),
                retained,
            }
        }
    }

    pub fn clear_query(self) -> Self {
        let retained = self.category().clone();
        Self::Browsing(retained)
    }

    /// Selected category, whether or not it is currently applied
    pub fn category(&self) -> &CategorySelection {
        match self {
            Self::Browsing(selection) => selection,
            Self::Searching { retained, .. } => retained,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Browsing(_) => None,
            Self::Searching { query, .. } => Some(query),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Browsing(_) => "browsing",
            Self::Searching { .. } => "searching",
        }
    }
}

/// Why a record was admitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum MatchReason {
    All,
    ExactCategory,
    Tag,
    Fuzzy,
    SearchTokens { title_contains_query: bool },
}

/// Per-record diagnostic produced in traced mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTrace {
    /// Position in the input sequence
    pub index: usize,
    pub title: String,
    /// `None` when the record was excluded
    pub reason: Option<MatchReason>,
    /// Present whenever the fuzzy tier was consulted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

/// Filtered records plus an optional trace
#[derive(Debug)]
pub struct FilterOutcome<'a, R> {
    pub records: Vec<&'a R>,
    pub trace: Option<Vec<MatchTrace>>,
}

/// Applies a [`BrowseMode`] to a record snapshot
#[derive(Debug, Clone)]
pub struct CatalogFilter {
    matcher: CategoryMatcher,
    fuzzy_threshold: u32,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl CatalogFilter {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            matcher: CategoryMatcher::new(config),
            fuzzy_threshold: config.fuzzy_threshold,
        }
    }

    /// Records to display, in display order
    pub fn apply<'a, R: Searchable>(&self, records: &'a [R], mode: &BrowseMode) -> Vec<&'a R> {
        self.run(records, mode, false).records
    }

    /// Same as [`apply`](Self::apply), with a trace entry for every input record
    pub fn apply_traced<'a, R: Searchable>(&self, records: &'a [R], mode: &BrowseMode) -> FilterOutcome<'a, R> {
        self.run(records, mode, true)
    }

    /// First tier admitting `record` under `label`, if any
    pub fn tier_for<R: Searchable + ?Sized>(&self, record: &R, label: &str) -> Option<MatchReason> {
        self.evaluate(record, label, false).0
    }

    fn run<'a, R: Searchable>(&self, records: &'a [R], mode: &BrowseMode, traced: bool) -> FilterOutcome<'a, R> {
        let search = match mode {
            BrowseMode::Searching { query, .. } => SearchQuery::parse(query),
            BrowseMode::Browsing(_) => None,
        };

        if let Some(query) = search {
            let hits = query::rank(records.iter().filter(|r| query.matches(*r)).collect(), &query);
            let trace = traced.then(|| {
                records
                    .iter()
                    .enumerate()
                    .map(|(index, record)| MatchTrace {
                        index,
                        title: record.title().to_string(),
                        reason: query.matches(record).then(|| MatchReason::SearchTokens {
                            title_contains_query: query.title_contains_query(record),
                        }),
                        breakdown: None,
                    })
                    .collect()
            });
            return FilterOutcome { records: hits, trace };
        }

        match mode.category() {
            CategorySelection::All => FilterOutcome {
                records: records.iter().collect(),
                trace: traced.then(|| {
                    records
                        .iter()
                        .enumerate()
                        .map(|(index, record)| MatchTrace {
                            index,
                            title: record.title().to_string(),
                            reason: Some(MatchReason::All),
                            breakdown: None,
                        })
                        .collect()
                }),
            },
            CategorySelection::Label(label) => {
                let mut admitted = Vec::new();
                let mut trace = traced.then(|| Vec::with_capacity(records.len()));

                for (index, record) in records.iter().enumerate() {
                    let (reason, breakdown) = self.evaluate(record, label, traced);
                    if reason.is_some() {
                        admitted.push(record);
                    }
                    if let Some(trace) = trace.as_mut() {
                        trace.push(MatchTrace {
                            index,
                            title: record.title().to_string(),
                            reason,
                            breakdown,
                        });
                    }
                }

                FilterOutcome { records: admitted, trace }
            }
        }
    }

    fn evaluate<R: Searchable + ?Sized>(
        &self,
        record: &R,
        label: &str,
        keep_breakdown: bool,
    ) -> (Option<MatchReason>, Option<ScoreBreakdown>) {
        if label == ALL_CATEGORIES {
            return (Some(MatchReason::All), None);
        }
        if record.category() == Some(label) {
            return (Some(MatchReason::ExactCategory), None);
        }
        if tags_match(label, record.tags()) {
            return (Some(MatchReason::Tag), None);
        }

        let breakdown = self.matcher.explain(record, label);
        let reason = (breakdown.score >= self.fuzzy_threshold).then_some(MatchReason::Fuzzy);
        (reason, keep_breakdown.then_some(breakdown))
    }
}

/// Tag tier: whole-label equality, or overlap between label parts and tags
fn tags_match(label: &str, tags: &[String]) -> bool {
    let label = label.trim().to_lowercase();
    let tags: Vec<String> = tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    if label.is_empty() || tags.is_empty() {
        return false;
    }
    if tags.iter().any(|t| *t == label) {
        return true;
    }

    let parts: Vec<&str> = if label.contains('/') {
        label.split('/').collect()
    } else if label.contains(' ') {
        label.split(' ').collect()
    } else {
        return tags
            .iter()
            .any(|t| t.contains(label.as_str()) || label.contains(t.as_str()));
    };

    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .any(|part| tags.iter().any(|t| t.contains(part)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Doc;

    fn browsing(label: &str) -> BrowseMode {
        BrowseMode::default().select_category(CategorySelection::parse(Some(label)))
    }

    fn titles<'a>(hits: &[&'a Doc]) -> Vec<&'a str> {
        hits.iter().map(|d| d.title.as_str()).collect()
    }

    fn catalog() -> Vec<Doc> {
        vec![
            Doc::titled("Rust in Action").category("Programming").tags(&["systems"]),
            Doc::titled("Intro to Transformers").tags(&["ai", "nlp"]),
            Doc::titled("Deep Learning Fundamentals").description("Neural network architectures"),
            Doc::titled("Cooking Pasta at Home").category("Food"),
            Doc::titled("Brand Strategy").category("Marketing").tags(&["branding"]),
        ]
    }

    #[test]
    fn test_selection_parse() {
        assert_eq!(CategorySelection::parse(None), CategorySelection::All);
        assert_eq!(CategorySelection::parse(Some("  ")), CategorySelection::All);
        assert_eq!(CategorySelection::parse(Some("All")), CategorySelection::All);
        assert_eq!(
            CategorySelection::parse(Some(" Design ")),
            CategorySelection::Label("Design".into())
        );
        assert_eq!(CategorySelection::Label("Design".into()).label(), "Design");
        assert_eq!(CategorySelection::All.label(), "All");
    }

    #[test]
    fn test_mode_transitions() {
        let design = CategorySelection::Label("Design".into());

        let mode = BrowseMode::default().select_category(design.clone());
        assert_eq!(mode.kind(), "browsing");

        let mode = mode.enter_query("figma");
        assert_eq!(mode.kind(), "searching");
        assert_eq!(mode.query(), Some("figma"));
        assert_eq!(mode.category(), &design);

        // Selecting a category drops the query
        let mode = mode.select_category(CategorySelection::All);
        assert_eq!(mode, BrowseMode::Browsing(CategorySelection::All));

        let mode = mode.enter_query("figma").clear_query();
        assert_eq!(mode, BrowseMode::Browsing(CategorySelection::All));

        let mode = BrowseMode::Browsing(design.clone()).enter_query("   ");
        assert_eq!(mode, BrowseMode::Browsing(design));
    }

    #[test]
    fn test_all_returns_everything_in_order() {
        let docs = catalog();
        let hits = CatalogFilter::default().apply(&docs, &BrowseMode::default());
        assert_eq!(hits.len(), docs.len());
        assert_eq!(hits[0].title, "Rust in Action");
        assert_eq!(hits[4].title, "Brand Strategy");
    }

    #[test]
    fn test_exact_category_tier() {
        let filter = CatalogFilter::default();
        // Unrelated title, description and tags; the literal category is enough
        let doc = Doc::titled("zzzz").category("Programming").tags(&["qqqq"]);
        assert_eq!(filter.tier_for(&doc, "Programming"), Some(MatchReason::ExactCategory));
    }

    #[test]
    fn test_exact_tier_is_case_sensitive() {
        let filter = CatalogFilter::default();
        let doc = Doc::titled("zzzz").category("programming");
        assert_ne!(filter.tier_for(&doc, "Programming"), Some(MatchReason::ExactCategory));
    }

    #[test]
    fn test_tag_tier_slash_split() {
        let filter = CatalogFilter::default();
        let doc = Doc::titled("zzzz").tags(&["ai"]);
        assert_eq!(filter.tier_for(&doc, "AI/ML"), Some(MatchReason::Tag));
    }

    #[test]
    fn test_tag_tier_rules() {
        let tags = |t: &[&str]| t.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(tags_match("Design", &tags(&["  DESIGN "])));
        assert!(tags_match("Web Development", &tags(&["webapps"])));
        assert!(tags_match("Design", &tags(&["designer"])));
        assert!(tags_match("Marketing", &tags(&["market"])));
        assert!(!tags_match("Design", &tags(&["cooking"])));
        assert!(!tags_match("AI/ML", &tags(&["", "  "])));
        assert!(!tags_match("AI/ML", &[]));
        // Empty parts from a trailing slash never match everything
        assert!(!tags_match("Design/", &tags(&["cooking"])));
    }

    #[test]
    fn test_fuzzy_tier_keyword_boost() {
        let filter = CatalogFilter::default();
        let doc = Doc::titled("Deep Learning Fundamentals").description("Neural network architectures");
        assert_eq!(filter.tier_for(&doc, "AI/ML"), Some(MatchReason::Fuzzy));
    }

    #[test]
    fn test_label_filter_preserves_order() {
        let docs = catalog();
        let hits = CatalogFilter::default().apply(&docs, &browsing("AI/ML"));
        assert_eq!(
            titles(&hits),
            vec!["Intro to Transformers", "Deep Learning Fundamentals"]
        );
    }

    #[test]
    fn test_threshold_is_configurable() {
        let docs = catalog();
        let config = MatchingConfig {
            fuzzy_threshold: 75,
            ..MatchingConfig::default()
        };
        let hits = CatalogFilter::new(&config).apply(&docs, &browsing("AI/ML"));
        assert_eq!(titles(&hits), vec!["Intro to Transformers"]);
    }

    #[test]
    fn test_query_supersedes_category() {
        let docs = catalog();
        let mode = browsing("Marketing").enter_query("rust");
        let hits = CatalogFilter::default().apply(&docs, &mode);
        assert_eq!(titles(&hits), vec!["Rust in Action"]);
    }

    #[test]
    fn test_blank_search_falls_back_to_selection() {
        let docs = catalog();
        let mode = BrowseMode::Searching {
            query: "  ".into(),
            retained: CategorySelection::Label("Marketing".into()),
        };
        let hits = CatalogFilter::default().apply(&docs, &mode);
        assert_eq!(titles(&hits), vec!["Brand Strategy"]);
    }

    #[test]
    fn test_trace_for_label() {
        let docs = catalog();
        let outcome = CatalogFilter::default().apply_traced(&docs, &browsing("AI/ML"));
        let trace = outcome.trace.unwrap();
        assert_eq!(trace.len(), docs.len());

        assert_eq!(trace[1].reason, Some(MatchReason::Tag));
        assert!(trace[1].breakdown.is_none());

        assert_eq!(trace[2].reason, Some(MatchReason::Fuzzy));
        assert_eq!(trace[2].breakdown.as_ref().unwrap().score, 70);

        assert_eq!(trace[3].index, 3);
        assert_eq!(trace[3].reason, None);
        assert!(trace[3].breakdown.as_ref().unwrap().score < 60);
    }

    #[test]
    fn test_trace_for_search() {
        let docs = catalog();
        let mode = BrowseMode::default().enter_query("deep learning");
        let outcome = CatalogFilter::default().apply_traced(&docs, &mode);
        assert_eq!(outcome.records.len(), 1);

        let trace = outcome.trace.unwrap();
        assert_eq!(
            trace[2].reason,
            Some(MatchReason::SearchTokens { title_contains_query: true })
        );
        assert!(trace.iter().filter(|t| t.reason.is_some()).count() == 1);
    }

    #[test]
    fn test_untraced_has_no_trace() {
        let docs = catalog();
        let outcome = CatalogFilter::default().run(&docs, &browsing("Design"), false);
        assert!(outcome.trace.is_none());
    }

    #[test]
    fn test_trace_serializes() {
        let trace = MatchTrace {
            index: 0,
            title: "X".into(),
            reason: Some(MatchReason::SearchTokens { title_contains_query: false }),
            breakdown: None,
        };
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["reason"]["tier"], "search_tokens");
        assert_eq!(json["reason"]["title_contains_query"], false);
        assert!(json.get("breakdown").is_none());
    }
}
