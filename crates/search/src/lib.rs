//! PDFHub matching core
//!
//! Pure, synchronous matching over an in-memory snapshot of catalog records:
//! - Similarity scoring (normalized edit distance)
//! - Category matching (weighted fields plus keyword boost)
//! - Free-text search with relevance ordering
//! - Catalog filtering with exact, tag and fuzzy tiers
//!
//! Nothing here performs I/O or keeps state between calls.

mod category;
mod filter;
mod query;
mod similarity;

pub use category::{CategoryMatcher, Field, ScoreBreakdown, SignalScore};
pub use filter::{BrowseMode, CatalogFilter, CategorySelection, FilterOutcome, MatchReason, MatchTrace};
pub use query::{search, SearchQuery};
pub use similarity::similarity;

use pdfhub_common::PdfRecord;

/// Text fields the matchers read from a record
pub trait Searchable {
    fn title(&self) -> &str;

    fn description(&self) -> Option<&str>;

    fn category(&self) -> Option<&str>;

    fn tags(&self) -> &[String];
}

impl Searchable for PdfRecord {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}
