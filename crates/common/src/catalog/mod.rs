//! Catalog domain model and store contracts
//!
//! Provides:
//! - `PdfRecord`, the cataloged entity, with its derived average rating
//! - Validated `Rating` and `Review` values for public submissions
//! - Insert (`NewPdf`) and partial update (`PdfPatch`) inputs
//! - The `CatalogStore` and `AdminStore` traits backends implement
//! - Rewriting of shared file links into direct view/download links

mod links;
mod memory;

pub use links::{resolve_file_url, LinkMode};
pub use memory::MemoryStore;

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single cataloged PDF entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfRecord {
    pub id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub category: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Link to the document on third-party storage
    pub file_url: String,

    pub thumbnail: Option<String>,

    #[serde(default)]
    pub is_trending: bool,

    pub uploaded_at: DateTime<Utc>,

    /// Append-only, every entry in 1..=5
    #[serde(default)]
    pub ratings: Vec<u8>,

    /// Append-only
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl PdfRecord {
    /// Arithmetic mean of all ratings, 0 when unrated
    pub fn average_rating(&self) -> f64 {
        if self.ratings.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.ratings.iter().map(|r| u32::from(*r)).sum();
        f64::from(sum) / self.ratings.len() as f64
    }
}

/// JSON view of a record including derived fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfView {
    #[serde(flatten)]
    pub record: PdfRecord,

    /// Rounded to one decimal place
    pub average_rating: f64,

    pub rating_count: usize,
}

impl From<PdfRecord> for PdfView {
    fn from(record: PdfRecord) -> Self {
        let average_rating = (record.average_rating() * 10.0).round() / 10.0;
        let rating_count = record.ratings.len();
        Self {
            record,
            average_rating,
            rating_count,
        }
    }
}

/// A public review with its server-assigned timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    comment: String,
    date: DateTime<Utc>,
}

impl Review {
    /// Build a review stamped with the current time. Blank comments are rejected.
    pub fn new(comment: &str) -> Result<Self> {
        if comment.trim().is_empty() {
            return Err(AppError::Validation {
                message: "Review comment cannot be empty".to_string(),
                field: Some("comment".to_string()),
            });
        }
        Ok(Self {
            comment: comment.to_string(),
            date: Utc::now(),
        })
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

/// A star rating known to be within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AppError::Validation {
                message: "Rating must be between 1 and 5".to_string(),
                field: Some("rating".to_string()),
            })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Fields supplied by an administrator when registering a PDF link
#[derive(Debug, Clone, Default)]
pub struct NewPdf {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub file_url: String,
    pub thumbnail: Option<String>,
}

impl NewPdf {
    /// Check required fields and normalize optional ones
    pub fn validated(mut self) -> Result<Self> {
        if self.file_url.trim().is_empty() {
            return Err(AppError::Validation {
                message: "PDF download link is required".to_string(),
                field: Some("pdfLink".to_string()),
            });
        }
        if self.title.trim().is_empty() {
            return Err(AppError::Validation {
                message: "Title is required".to_string(),
                field: Some("title".to_string()),
            });
        }
        self.title = self.title.trim().to_string();
        self.file_url = self.file_url.trim().to_string();
        self.description = non_blank(self.description);
        self.category = non_blank(self.category);
        self.thumbnail = non_blank(self.thumbnail);
        self.tags = clean_tags(self.tags);
        Ok(self)
    }

    /// Materialize a fresh record with a new identifier
    pub fn into_record(self) -> PdfRecord {
        PdfRecord {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            category: self.category,
            tags: self.tags,
            file_url: self.file_url,
            thumbnail: self.thumbnail,
            is_trending: false,
            uploaded_at: Utc::now(),
            ratings: Vec::new(),
            reviews: Vec::new(),
        }
    }
}

/// Partial update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct PdfPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub file_url: Option<String>,
    pub thumbnail: Option<String>,
    pub is_trending: Option<bool>,
}

impl PdfPatch {
    /// Drop blank values so they do not overwrite stored ones
    pub fn normalized(self) -> Self {
        Self {
            title: non_blank(self.title),
            description: non_blank(self.description),
            category: non_blank(self.category),
            tags: self.tags.map(clean_tags),
            file_url: non_blank(self.file_url),
            thumbnail: non_blank(self.thumbnail),
            is_trending: self.is_trending,
        }
    }

    /// Apply onto an existing record. Identifier and timestamps are untouched.
    pub fn apply(self, record: &mut PdfRecord) {
        let patch = self.normalized();
        if let Some(title) = patch.title {
            record.title = title;
        }
        if let Some(description) = patch.description {
            record.description = Some(description);
        }
        if let Some(category) = patch.category {
            record.category = Some(category);
        }
        if let Some(tags) = patch.tags {
            record.tags = tags;
        }
        if let Some(file_url) = patch.file_url {
            record.file_url = file_url;
        }
        if let Some(thumbnail) = patch.thumbnail {
            record.thumbnail = Some(thumbnail);
        }
        if let Some(is_trending) = patch.is_trending {
            record.is_trending = is_trending;
        }
    }
}

/// Split a comma-separated tag list into trimmed, non-empty tags
pub fn parse_tags(raw: &str) -> Vec<String> {
    clean_tags(raw.split(',').map(String::from).collect())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Case-insensitive substring match over title, category and tags
pub fn matches_fields(record: &PdfRecord, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    record.title.to_lowercase().contains(&needle)
        || record
            .category
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(&needle))
        || record.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

/// Administrator credentials
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence contract for catalog records
///
/// Listings are ordered by upload time, newest first.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<PdfRecord>>;

    async fn list_trending(&self) -> Result<Vec<PdfRecord>>;

    async fn get_by_id(&self, id: Uuid) -> Result<PdfRecord>;

    async fn insert(&self, pdf: NewPdf) -> Result<PdfRecord>;

    async fn update(&self, id: Uuid, patch: PdfPatch) -> Result<PdfRecord>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn set_trending(&self, id: Uuid, is_trending: bool) -> Result<PdfRecord> {
        self.update(
            id,
            PdfPatch {
                is_trending: Some(is_trending),
                ..PdfPatch::default()
            },
        )
        .await
    }

    async fn append_rating(&self, id: Uuid, rating: Rating) -> Result<PdfRecord>;

    async fn append_review(&self, id: Uuid, review: Review) -> Result<PdfRecord>;

    /// Server-side fallback search over title, category and tags
    async fn search_fields(&self, query: &str) -> Result<Vec<PdfRecord>>;

    async fn ping(&self) -> Result<()>;
}

/// Persistence contract for administrator accounts
#[async_trait::async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>>;

    /// Fails with a validation error when the email is already registered
    async fn create_admin(&self, email: &str, password_hash: &str) -> Result<AdminAccount>;
}
