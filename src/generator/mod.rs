//! Generator module - writes the static site from content API data
//!
//! Every article page is an independent unit: it reads from the content
//! client and writes only its own output file, so units run concurrently.
//! Any failing unit fails the run.

use anyhow::{Context, Result};
use futures::{StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use crate::assemble::{fetch_listing, load_article};
use crate::comments::CommentEmbed;
use crate::content::{ContentApi, Predicate, QueryOptions};
use crate::helpers::{is_safe_slug, post_path};
use crate::templates::{TemplateRenderer, LOAD_MORE_SCRIPT, STYLESHEET};
use crate::Blog;

/// Largest page the content API serves
const SLUG_PAGE_SIZE: u32 = 100;

/// Static site generator
pub struct Generator {
    blog: Blog,
    client: Arc<dyn ContentApi>,
    renderer: TemplateRenderer,
    comments: Option<CommentEmbed>,
}

impl Generator {
    /// Create a new generator reading from `client`
    pub fn new(blog: &Blog, client: Arc<dyn ContentApi>) -> Result<Self> {
        let renderer = TemplateRenderer::new(&blog.config)?;
        let comments = CommentEmbed::from_config(&blog.config.comments);
        if comments.is_none() {
            tracing::debug!("Comment widget disabled");
        }

        Ok(Self {
            blog: blog.clone(),
            client,
            renderer,
            comments,
        })
    }

    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    pub fn client(&self) -> &dyn ContentApi {
        self.client.as_ref()
    }

    /// Generate the entire site, returning the number of article pages
    pub async fn generate(&self) -> Result<usize> {
        self.generate_shell().await?;

        let slugs = self.collect_slugs().await?;
        tracing::info!("Found {} articles", slugs.len());

        let concurrency = self.blog.config.concurrency.max(1);
        let written: Vec<PathBuf> = futures::stream::iter(slugs)
            .map(|slug| async move { self.generate_post(&slug).await })
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;

        Ok(written.len())
    }

    /// Write the assets and listing page, leaving article pages to be
    /// generated on request
    pub async fn generate_shell(&self) -> Result<()> {
        fs::create_dir_all(&self.blog.public_dir).await?;
        self.write_assets().await?;
        self.generate_index().await
    }

    /// Write the first listing page
    pub async fn generate_index(&self) -> Result<()> {
        let config = &self.blog.config;
        let page = fetch_listing(self.client.as_ref(), &config.api, config.per_page)
            .await
            .context("Failed to fetch the listing page")?;

        let html = self.renderer.render_listing(&page)?;
        let output_path = self.blog.public_dir.join("index.html");
        write_file(&output_path, html).await?;
        tracing::info!("Generated listing with {} articles", page.results.len());

        Ok(())
    }

    /// Every article uid known to the content API, across all result pages
    pub async fn collect_slugs(&self) -> Result<Vec<String>> {
        let doc_type = &self.blog.config.api.document_type;
        let options = QueryOptions::new().page_size(SLUG_PAGE_SIZE);
        let mut response = self
            .client
            .query(&[Predicate::document_type(doc_type)], &options)
            .await
            .context("Failed to list articles")?;

        let mut slugs = Vec::new();
        loop {
            for doc in &response.results {
                match doc.uid.as_deref() {
                    Some(uid) if is_safe_slug(uid) => slugs.push(uid.to_string()),
                    other => tracing::warn!("Skipping document {} with uid {:?}", doc.id, other),
                }
            }
            match response.next_page.take() {
                Some(cursor) => response = self.client.fetch_page(&cursor).await?,
                None => break,
            }
        }

        Ok(slugs)
    }

    /// Render one article, in preview mode when `reference` is given
    pub async fn render_post(&self, slug: &str, reference: Option<&str>) -> Result<String> {
        let config = &self.blog.config;
        let article = load_article(
            self.client.as_ref(),
            &config.api.document_type,
            slug,
            reference,
            &config.tz(),
        )
        .await?;

        self.renderer.render_article(&article, self.comments.as_ref())
    }

    /// Render and write one published article page
    pub async fn generate_post(&self, slug: &str) -> Result<PathBuf> {
        if !is_safe_slug(slug) {
            anyhow::bail!("Refusing to generate unsafe slug {:?}", slug);
        }

        let html = self
            .render_post(slug, None)
            .await
            .with_context(|| format!("Failed to generate post {:?}", slug))?;

        let output_path = self.post_output_path(slug);
        write_file(&output_path, html).await?;
        tracing::debug!("Generated post: {:?}", output_path);

        Ok(output_path)
    }

    /// Loading page for a slug still being generated
    pub fn render_fallback(&self) -> Result<String> {
        self.renderer.render_fallback()
    }

    /// Where a slug's page is written
    pub fn post_output_path(&self, slug: &str) -> PathBuf {
        self.blog
            .public_dir
            .join(post_path(slug))
            .join("index.html")
    }

    async fn write_assets(&self) -> Result<()> {
        let public_dir = &self.blog.public_dir;
        write_file(&public_dir.join("css/style.css"), STYLESHEET).await?;
        write_file(&public_dir.join("js/load-more.js"), LOAD_MORE_SCRIPT).await?;
        Ok(())
    }
}

async fn write_file(path: &std::path::Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {:?}", path))
}
