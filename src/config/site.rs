//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `api.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";

/// Environment variable overriding `api.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub url: String,
    pub root: String,
    pub public_dir: String,

    // Date / Time
    pub timezone: String,
    pub date_locale: String,

    // Listing
    pub per_page: u32,

    // Generation
    pub concurrency: usize,

    // Content API
    #[serde(default)]
    pub api: ApiConfig,

    // Comment widget
    #[serde(default)]
    pub comments: CommentsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Spacetraveling".to_string(),
            url: "http://example.com".to_string(),
            root: "/".to_string(),
            public_dir: "public".to_string(),

            timezone: String::new(),
            date_locale: "pt_BR".to_string(),

            per_page: 1,

            concurrency: 4,

            api: ApiConfig::default(),
            comments: CommentsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!("API endpoint overridden from environment");
            self.api.endpoint = endpoint;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.api.access_token = Some(token);
        }
    }

    /// Resolve the configured timezone, falling back to UTC
    pub fn tz(&self) -> chrono_tz::Tz {
        if self.timezone.is_empty() {
            return chrono_tz::UTC;
        }
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
            chrono_tz::UTC
        })
    }

    /// Resolve the locale used for the "edited" annotation
    pub fn locale(&self) -> chrono::Locale {
        chrono::Locale::try_from(self.date_locale.as_str()).unwrap_or_else(|_| {
            tracing::warn!("Unknown date locale {:?}, using pt_BR", self.date_locale);
            chrono::Locale::pt_BR
        })
    }
}

/// Headless content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
    /// JSON document dump read instead of the remote API, relative to the base dir
    pub fixtures: Option<String>,
    pub document_type: String,
    pub listing_fields: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            fixtures: None,
            document_type: "posts".to_string(),
            listing_fields: vec![
                "title".to_string(),
                "subtitle".to_string(),
                "author".to_string(),
            ],
        }
    }
}

impl ApiConfig {
    /// Field selectors for listing queries, e.g. `posts.title`
    pub fn fetch_fields(&self) -> Vec<String> {
        self.listing_fields
            .iter()
            .map(|f| format!("{}.{}", self.document_type, f))
            .collect()
    }
}

/// Comment widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enable: bool,
    pub src: String,
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            src: "https://utteranc.es/client.js".to_string(),
            repo: String::new(),
            issue_term: "url".to_string(),
            theme: "photon-dark".to_string(),
        }
    }
}
