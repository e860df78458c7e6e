//! PDFHub Common Library
//!
//! Shared code for the PDFHub services including:
//! - Catalog domain model and store contracts
//! - PostgreSQL and in-memory store backends
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Thumbnail storage
//! - Metrics and observability

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod storage;

// Re-export commonly used types
pub use catalog::{CatalogStore, PdfRecord};
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Category sentinel meaning "no category filter"
pub const ALL_CATEGORIES: &str = "All";
