//! Category confidence scoring
//!
//! A record's confidence for a category label combines direct similarity of
//! its fields (weighted, renormalized over the fields it actually has) with
//! a keyword boost drawn from a per-category dictionary.

use crate::similarity::similarity;
use crate::Searchable;
use pdfhub_common::config::MatchingConfig;
use pdfhub_common::ALL_CATEGORIES;
use serde::Serialize;
use std::collections::HashMap;

const CATEGORY_WEIGHT: f64 = 0.4;
const TITLE_WEIGHT: f64 = 0.3;
const DESCRIPTION_WEIGHT: f64 = 0.2;
const TAGS_WEIGHT: f64 = 0.1;

/// Floor for a title that contains the label verbatim
const TITLE_CONTAINS_SCORE: u32 = 70;
/// Floor for a description that contains the label verbatim
const DESCRIPTION_CONTAINS_SCORE: u32 = 60;

/// Record field contributing a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Category,
    Title,
    Description,
    Tags,
}

/// One weighted similarity signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalScore {
    pub field: Field,
    pub score: u32,
    pub weight: f64,
}

/// How a confidence score was reached
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Signals for the fields the record has
    pub signals: Vec<SignalScore>,

    /// Weighted average over `signals`
    pub weighted_score: u32,

    /// Dictionary keywords found in the record text
    pub matched_keywords: Vec<String>,

    /// Score implied by the keywords alone, when any matched
    pub keyword_score: Option<u32>,

    /// Final confidence in `0..=100`
    pub score: u32,
}

/// Scores how well a record fits a category label
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    /// Keyed by trimmed, lowercased label; keywords lowercased and deduplicated
    keywords: HashMap<String, Vec<String>>,
    keyword_base: u32,
    keyword_step: u32,
    keyword_cap: u32,
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl CategoryMatcher {
    pub fn new(config: &MatchingConfig) -> Self {
        let keywords = config
            .keywords
            .iter()
            .map(|(label, words)| {
                let mut normalized: Vec<String> = Vec::with_capacity(words.len());
                for word in words {
                    let word = word.trim().to_lowercase();
                    if !word.is_empty() && !normalized.contains(&word) {
                        normalized.push(word);
                    }
                }
                (label.trim().to_lowercase(), normalized)
            })
            .collect();

        Self {
            keywords,
            keyword_base: config.keyword_base,
            keyword_step: config.keyword_step,
            keyword_cap: config.keyword_cap,
        }
    }

    /// Confidence in `0..=100` that `record` belongs to `target`.
    ///
    /// Returns 0 for the "All" sentinel or a blank label; callers treat "All"
    /// as no filter at all rather than as a zero-confidence match.
    pub fn score<R: Searchable + ?Sized>(&self, record: &R, target: &str) -> u32 {
        self.explain(record, target).score
    }

    /// Same as [`score`](Self::score), keeping every intermediate value
    pub fn explain<R: Searchable + ?Sized>(&self, record: &R, target: &str) -> ScoreBreakdown {
        if target == ALL_CATEGORIES || target.trim().is_empty() {
            return ScoreBreakdown::default();
        }

        let signals = field_signals(record, target);
        let weighted_score = weighted_average(&signals);

        let matched_keywords = self.matched_keywords(record, target);
        let keyword_score = (!matched_keywords.is_empty()).then(|| {
            let hits = matched_keywords.len() as u32;
            self.keyword_base
                .saturating_add(self.keyword_step.saturating_mul(hits))
                .min(self.keyword_cap)
        });

        let score = keyword_score.map_or(weighted_score, |k| weighted_score.max(k));

        ScoreBreakdown {
            signals,
            weighted_score,
            matched_keywords,
            keyword_score,
            score,
        }
    }

    fn matched_keywords<R: Searchable + ?Sized>(&self, record: &R, target: &str) -> Vec<String> {
        let Some(keywords) = self.keywords.get(&target.trim().to_lowercase()) else {
            return Vec::new();
        };

        let text = format!(
            "{} {} {}",
            record.title(),
            record.description().unwrap_or_default(),
            record.category().unwrap_or_default()
        )
        .to_lowercase();

        keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .cloned()
            .collect()
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn contains_normalized(haystack: &str, needle: &str) -> bool {
    haystack
        .trim()
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}

fn field_signals<R: Searchable + ?Sized>(record: &R, target: &str) -> Vec<SignalScore> {
    let mut signals = Vec::with_capacity(4);

    if let Some(category) = present(record.category()) {
        signals.push(SignalScore {
            field: Field::Category,
            score: similarity(category, target),
            weight: CATEGORY_WEIGHT,
        });
    }

    if let Some(title) = present(Some(record.title())) {
        let bonus = if contains_normalized(title, target) { TITLE_CONTAINS_SCORE } else { 0 };
        signals.push(SignalScore {
            field: Field::Title,
            score: similarity(title, target).max(bonus),
            weight: TITLE_WEIGHT,
        });
    }

    if let Some(description) = present(record.description()) {
        let bonus = if contains_normalized(description, target) { DESCRIPTION_CONTAINS_SCORE } else { 0 };
        signals.push(SignalScore {
            field: Field::Description,
            score: similarity(description, target).max(bonus),
            weight: DESCRIPTION_WEIGHT,
        });
    }

    // The tag list always exists; an empty one is a zero signal, not an absent one
    let best_tag = record
        .tags()
        .iter()
        .map(|tag| similarity(tag, target))
        .max()
        .unwrap_or(0);
    signals.push(SignalScore {
        field: Field::Tags,
        score: best_tag,
        weight: TAGS_WEIGHT,
    });

    signals
}

fn weighted_average(signals: &[SignalScore]) -> u32 {
    let total_weight: f64 = signals.iter().map(|s| s.weight).sum();
    if total_weight <= 0.0 {
        return 0;
    }
    let weighted_sum: f64 = signals.iter().map(|s| f64::from(s.score) * s.weight).sum();
    (weighted_sum / total_weight).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Doc;

    fn matcher() -> CategoryMatcher {
        CategoryMatcher::default()
    }

    #[test]
    fn test_all_sentinel_scores_zero() {
        let doc = Doc::titled("All").category("All").tags(&["all"]);
        assert_eq!(matcher().score(&doc, "All"), 0);
        assert_eq!(matcher().score(&doc, "   "), 0);
        assert!(matcher().explain(&doc, "All").signals.is_empty());
    }

    #[test]
    fn test_exact_category_everywhere_scores_100() {
        let doc = Doc::titled("Design")
            .category("Design")
            .description("design")
            .tags(&["DESIGN"]);
        let breakdown = matcher().explain(&doc, "Design");
        assert_eq!(breakdown.weighted_score, 100);
        assert_eq!(breakdown.score, 100);
    }

    #[test]
    fn test_weights_renormalize_over_present_fields() {
        // category 100 at 0.4, title 0 at 0.3, empty tags 0 at 0.1 => 40 / 0.8 = 50
        let doc = Doc::titled("zzzzzzzzzzzzzzzzzzzz").category("Marketing");
        let breakdown = matcher().explain(&doc, "Marketing");
        let fields: Vec<Field> = breakdown.signals.iter().map(|s| s.field).collect();
        assert_eq!(fields, vec![Field::Category, Field::Title, Field::Tags]);
        assert_eq!(breakdown.weighted_score, 50);
        assert!(breakdown.matched_keywords.is_empty());
        assert_eq!(breakdown.score, 50);
    }

    #[test]
    fn test_title_containment_floor() {
        let doc = Doc::titled("A Practical Guide to Programming in Rust");
        let breakdown = matcher().explain(&doc, "programming");
        let title = breakdown.signals.iter().find(|s| s.field == Field::Title).unwrap();
        assert_eq!(title.score, 70);
    }

    #[test]
    fn test_description_containment_floor() {
        let doc = Doc::titled("qqqq").description("An introduction to modern web development practices");
        let breakdown = matcher().explain(&doc, "Web Development");
        let desc = breakdown.signals.iter().find(|s| s.field == Field::Description).unwrap();
        assert_eq!(desc.score, 60);
    }

    #[test]
    fn test_best_tag_wins() {
        let doc = Doc::titled("qqqq").tags(&["cooking", "ai/ml", "travel"]);
        let breakdown = matcher().explain(&doc, "AI/ML");
        let tags = breakdown.signals.iter().find(|s| s.field == Field::Tags).unwrap();
        assert_eq!(tags.score, 100);
    }

    #[test]
    fn test_keyword_boost_two_hits() {
        let doc = Doc::titled("Deep Learning Fundamentals")
            .description("Neural network architectures");
        let breakdown = matcher().explain(&doc, "AI/ML");
        assert_eq!(breakdown.matched_keywords, vec!["deep learning", "neural network"]);
        assert_eq!(breakdown.keyword_score, Some(70));
        assert_eq!(breakdown.score, 70);
    }

    #[test]
    fn test_keyword_boost_is_capped() {
        let doc = Doc::titled("Frontend and backend web development")
            .description("javascript react html css node fullstack website");
        let breakdown = matcher().explain(&doc, "Web Development");
        assert!(breakdown.matched_keywords.len() >= 4);
        assert_eq!(breakdown.keyword_score, Some(90));
    }

    #[test]
    fn test_keyword_boost_never_lowers_score() {
        // Direct similarity is already 100; one keyword would only imply 55
        let doc = Doc::titled("UI").category("Design");
        let breakdown = matcher().explain(&doc, "Design");
        assert_eq!(breakdown.keyword_score, Some(55));
        assert!(breakdown.score >= breakdown.weighted_score);
        assert_eq!(breakdown.score, breakdown.weighted_score.max(55));
    }

    #[test]
    fn test_tags_do_not_feed_keywords() {
        let doc = Doc::titled("qqqq").tags(&["machine learning"]);
        assert!(matcher().explain(&doc, "AI/ML").matched_keywords.is_empty());
    }

    #[test]
    fn test_custom_dictionary_and_thresholds() {
        let mut config = MatchingConfig::default();
        config.keywords.clear();
        config.keywords.insert("science".to_string(), vec!["Physics".into(), "physics".into(), "chemistry".into()]);
        config.keyword_base = 10;
        config.keyword_step = 20;
        config.keyword_cap = 45;
        let matcher = CategoryMatcher::new(&config);

        let doc = Doc::titled("Physics and Chemistry primer");
        let breakdown = matcher.explain(&doc, "Science");
        assert_eq!(breakdown.matched_keywords, vec!["physics", "chemistry"]);
        assert_eq!(breakdown.keyword_score, Some(45));
    }

    #[test]
    fn test_unknown_label_has_no_keywords() {
        let doc = Doc::titled("Deep Learning");
        assert!(matcher().explain(&doc, "Cooking").keyword_score.is_none());
    }
}
