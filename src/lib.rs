//! spacetraveling: a static blog generator backed by a headless content API
//!
//! Articles are pulled from the content API, shaped by the assemblers into
//! listing and detail data, and rendered with embedded Tera templates.

pub mod assemble;
pub mod commands;
pub mod comments;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use content::{ContentApi, MemoryContent, PrismicClient};

/// A blog site rooted at a base directory
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Load `_config.yml` from a directory (defaults when absent) plus env overrides
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)
                .with_context(|| format!("Failed to load {:?}", config_path))?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Build from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Construct the content client this site reads from
    pub fn client(&self) -> Result<Arc<dyn ContentApi>> {
        if let Some(fixtures) = &self.config.api.fixtures {
            let path = self.base_dir.join(fixtures);
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read fixtures {:?}", path))?;
            tracing::info!("Reading content from {:?}", path);
            // Listing cursors point at the search route the server answers
            let content = MemoryContent::from_json(&json)?
                .with_cursor_base(helpers::url_for(&self.config, server::FIXTURE_API_ROOT));
            return Ok(Arc::new(content));
        }

        Ok(Arc::new(PrismicClient::from_config(&self.config.api)?))
    }

    /// Initialize a new site
    pub fn init(&self) -> Result<()> {
        commands::init::run(self)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
