//! Configuration management for PDFHub services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local),
//!   or a single file named by `APP_CONFIG`
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Thumbnail storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting for public write endpoints
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Category matching parameters
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum request body size (multipart uploads included)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. When absent the catalog is held in memory.
    pub url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Give up retrying the initial connection after this many seconds
    #[serde(default = "default_connect_retry")]
    pub connect_retry_secs: u64,

    /// Apply pending migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,

    /// Directory holding the SQL migrations
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for token signing
    pub jwt_secret: Option<String>,

    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory uploaded thumbnails are written to
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: String,

    /// Public URL prefix under which thumbnails are served
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Thresholds and keyword dictionary used by category matching.
///
/// The numeric defaults are fixed heuristics, not derived thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Browsable category labels, excluding the "All" sentinel
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Domain keywords per category label
    #[serde(default = "default_keywords")]
    pub keywords: BTreeMap<String, Vec<String>>,

    /// Minimum fuzzy score for a record to be admitted by the fallback tier
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: u32,

    /// Boosted score for the first matched keyword, minus one step
    #[serde(default = "default_keyword_base")]
    pub keyword_base: u32,

    /// Added per distinct matched keyword
    #[serde(default = "default_keyword_step")]
    pub keyword_step: u32,

    /// Ceiling for keyword-only evidence
    #[serde(default = "default_keyword_cap")]
    pub keyword_cap: u32,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_request_timeout() -> u64 { 30 }
fn default_body_limit() -> usize { 10 * 1024 * 1024 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_connect_retry() -> u64 { 60 }
fn default_run_migrations() -> bool { true }
fn default_migrations_dir() -> String { "migrations".to_string() }
fn default_jwt_expiration() -> u64 { 86_400 }
fn default_thumbnail_dir() -> String { "uploads".to_string() }
fn default_public_base_url() -> String { "/uploads".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 0 }
fn default_rate_limit() -> u32 { 5 }
fn default_burst() -> u32 { 20 }
fn default_enabled() -> bool { true }
fn default_fuzzy_threshold() -> u32 { 60 }
fn default_keyword_base() -> u32 { 40 }
fn default_keyword_step() -> u32 { 15 }
fn default_keyword_cap() -> u32 { 90 }

fn default_categories() -> Vec<String> {
    ["Web Development", "Programming", "Design", "AI/ML", "Marketing"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_keywords() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 5] = [
        (
            "Web Development",
            &["frontend", "backend", "javascript", "react", "html", "css", "node", "web", "website", "fullstack"],
        ),
        (
            "Programming",
            &["coding", "software", "algorithm", "data structure", "python", "java", "c++", "development", "code"],
        ),
        (
            "Design",
            &["ui", "ux", "graphic", "visual", "photoshop", "figma", "adobe", "creative", "interface", "user experience"],
        ),
        (
            "AI/ML",
            &[
                "artificial intelligence",
                "machine learning",
                "deep learning",
                "neural network",
                "data science",
                "tensorflow",
                "pytorch",
                "ml",
                "ai",
            ],
        ),
        (
            "Marketing",
            &["digital marketing", "seo", "social media", "advertising", "branding", "content marketing", "analytics", "promotion"],
        ),
    ];

    table
        .into_iter()
        .map(|(category, words)| {
            (
                category.to_string(),
                words.iter().map(|w| w.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            connect_retry_secs: default_connect_retry(),
            run_migrations: default_run_migrations(),
            migrations_dir: default_migrations_dir(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_secs: default_jwt_expiration(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            thumbnail_dir: default_thumbnail_dir(),
            public_base_url: default_public_base_url(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            keywords: default_keywords(),
            fuzzy_threshold: default_fuzzy_threshold(),
            keyword_base: default_keyword_base(),
            keyword_step: default_keyword_step(),
            keyword_cap: default_keyword_cap(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}
