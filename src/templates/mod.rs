//! Built-in blog templates using the Tera template engine
//!
//! The listing, detail and loading views are embedded in the binary. View
//! policy lives here: preview pages drop the navigation block and the
//! comment widget, whatever the assembled data carries.

use anyhow::Result;
use chrono::Locale;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::assemble::{ArticlePage, AssembledArticle};
use crate::comments::CommentEmbed;
use crate::config::SiteConfig;
use crate::content::RichTextNode;
use crate::content::rich_text;
use crate::helpers::{
    display_date, edited_date, full_url_for, html_escape, parse_timestamp, post_path, truncate,
    url_for,
};

/// Stylesheet shipped with the templates
pub const STYLESHEET: &str = include_str!("site/style.css");

/// Client-side "load more" script
pub const LOAD_MORE_SCRIPT: &str = include_str!("site/load-more.js");

/// Site-wide values available to every template as `site`
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub root: String,
    pub timezone: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            root: url_for(config, ""),
            timezone: config.tz().name().to_string(),
        }
    }
}

/// Longest meta description, in characters
const DESCRIPTION_LENGTH: usize = 160;

/// Template renderer with the embedded blog views
pub struct TemplateRenderer {
    tera: Tera,
    site: SiteData,
    config: SiteConfig,
}

impl TemplateRenderer {
    /// Create a new renderer for a site
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        // Escaping is explicit through the `html` filter; rendered rich text
        // and the comment container are emitted as-is
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("fallback.html", include_str!("site/fallback.html")),
        ])?;

        let tz = config.tz();
        let locale = config.locale();
        tera.register_filter(
            "listing_date",
            move |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                listing_date_filter(value, tz)
            },
        );
        tera.register_filter(
            "edited_date",
            move |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                edited_date_filter(value, tz, locale)
            },
        );
        tera.register_filter("rich_text", rich_text_filter);
        tera.register_filter("html", html_filter);

        Ok(Self {
            tera,
            site: SiteData::from_config(config),
            config: config.clone(),
        })
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Listing view; the "load more" button appears only with a cursor
    pub fn render_listing(&self, page: &ArticlePage) -> Result<String> {
        let mut context = self.base_context();
        context.insert("articles", &page.results);
        context.insert("next_page", &page.next_page_cursor);
        self.render("index.html", &context)
    }

    /// Detail view, with the comment widget mounted when given and not previewing
    pub fn render_article(
        &self,
        article: &AssembledArticle,
        comments: Option<&CommentEmbed>,
    ) -> Result<String> {
        let preview = article.is_preview;
        let comments = comments.filter(|_| !preview);

        let detail = &article.detail;
        let description = detail
            .content_blocks
            .first()
            .map(|block| truncate(&rich_text::as_text(&block.body), DESCRIPTION_LENGTH, None))
            .unwrap_or_default();

        let mut context = self.base_context();
        context.insert("detail", detail);
        context.insert("description", &description);
        context.insert(
            "canonical_url",
            &full_url_for(&self.config, &post_path(&detail.uid)),
        );
        context.insert("is_preview", &preview);
        context.insert(
            "neighbors",
            &if preview { None } else { article.neighbors.as_ref() },
        );
        context.insert(
            "comments_container",
            &comments.map(|_| CommentEmbed::container()),
        );

        let html = self.render("post.html", &context)?;
        Ok(match comments {
            Some(embed) => embed.mount(&html),
            None => html,
        })
    }

    /// Loading state for a slug that is still being generated
    pub fn render_fallback(&self) -> Result<String> {
        self.render("fallback.html", &self.base_context())
    }
}

/// Tera filter: lower-case `dd MMM yyyy` from a timestamp string
fn listing_date_filter(value: &tera::Value, tz: Tz) -> tera::Result<tera::Value> {
    let formatted = value
        .as_str()
        .and_then(parse_timestamp)
        .map(|d| display_date(&d, &tz))
        .unwrap_or_default();
    Ok(tera::Value::String(formatted))
}

/// Tera filter: localized `dd MMM yyyy', às' HH:mm` from a timestamp string
fn edited_date_filter(value: &tera::Value, tz: Tz, locale: Locale) -> tera::Result<tera::Value> {
    let formatted = value
        .as_str()
        .and_then(parse_timestamp)
        .map(|d| edited_date(&d, &tz, locale))
        .unwrap_or_default();
    Ok(tera::Value::String(formatted))
}

/// Tera filter: escape HTML special characters
fn html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = match value {
        tera::Value::Null => String::new(),
        tera::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(tera::Value::String(html_escape(&s)))
}

/// Tera filter: rich-text nodes to HTML
fn rich_text_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let nodes: Vec<RichTextNode> = serde_json::from_value(value.clone())
        .map_err(|e| tera::Error::msg(format!("rich_text: {}", e)))?;
    Ok(tera::Value::String(rich_text::as_html(&nodes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{assemble_detail, assemble_summary_page};
    use crate::config::CommentsConfig;
    use crate::content::{ContentDocument, RawBlock, RawFields};
    use crate::comments::CONTAINER_ID;
    use chrono::Utc;

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new(&SiteConfig::default()).unwrap()
    }

    fn doc(uid: &str, title: &str) -> ContentDocument {
        ContentDocument {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: parse_timestamp("2021-03-15T10:00:00Z"),
            data: RawFields {
                title: Some(title.to_string()),
                subtitle: Some("Sub & title".to_string()),
                author: Some("Joseph Oliveira".to_string()),
                content: vec![RawBlock {
                    heading: Some("Proin et varius".to_string()),
                    body: vec![RichTextNode::paragraph("Lorem ipsum")],
                }],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn embed() -> CommentEmbed {
        CommentEmbed::from_config(&CommentsConfig {
            repo: "someone/comments".to_string(),
            ..CommentsConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_listing_single_article_without_cursor() {
        let page = assemble_summary_page(&[doc("a", "Only")], None);
        let html = renderer().render_listing(&page).unwrap();
        assert_eq!(html.matches(r#"class="article""#).count(), 1);
        assert!(html.contains(r#"href="/post/a""#));
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains("Sub &amp; title"));
        assert!(!html.contains("load-more"));
    }

    #[test]
    fn test_listing_with_cursor_shows_button() {
        let page = assemble_summary_page(
            &[doc("a", "First")],
            Some("https://api.test/search?page=2".to_string()),
        );
        let html = renderer().render_listing(&page).unwrap();
        assert!(html.contains(r#"id="load-more""#));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains("js/load-more.js"));
    }

    #[test]
    fn test_article_with_neighbors_and_comments() {
        let older = doc("a", "Older post");
        let current = doc("b", "Current");
        let article = assemble_detail(&current, Some(&older), None, false, &Utc);
        let html = renderer().render_article(&article, Some(&embed())).unwrap();

        assert!(html.contains("<h1>Current</h1>"));
        assert!(html.contains("<p>Lorem ipsum</p>"));
        assert!(html.contains("Older post"));
        assert!(html.contains(r#"href="/post/a">Post Anterior"#));
        assert!(!html.contains("Próximo post"));
        assert!(html.contains(CONTAINER_ID));
        assert_eq!(html.matches("<script").count(), 1);
        assert!(!html.contains("editado em"));
    }

    #[test]
    fn test_article_without_neighbors_has_no_nav() {
        let article = assemble_detail(&doc("a", "Only"), None, None, false, &Utc);
        let html = renderer().render_article(&article, None).unwrap();
        assert!(!html.contains(r#"class="navigation""#));
        assert!(!html.contains(CONTAINER_ID));
    }

    #[test]
    fn test_preview_hides_navigation_and_comments() {
        let older = doc("a", "Older post");
        let article = assemble_detail(&doc("b", "Draft"), Some(&older), None, true, &Utc);
        assert!(article.neighbors.is_some());

        let html = renderer().render_article(&article, Some(&embed())).unwrap();
        assert!(!html.contains(r#"class="navigation""#));
        assert!(!html.contains(CONTAINER_ID));
        assert!(!html.contains("<script"));
        assert!(html.contains("Sair do modo Preview"));
    }

    #[test]
    fn test_edited_annotation() {
        let mut current = doc("a", "Edited");
        current.last_publication_date = parse_timestamp("2021-03-15T10:00:00Z");
        let article = assemble_detail(&current, None, None, false, &Utc);
        let html = renderer().render_article(&article, None).unwrap();
        assert!(html.contains("* editado em 15 mar 2021, às 10:00"));
    }

    #[test]
    fn test_article_head_meta() {
        let article = assemble_detail(&doc("hello", "Hello"), None, None, false, &Utc);
        let html = renderer().render_article(&article, None).unwrap();
        assert!(html.contains(r#"<link rel="canonical" href="http://example.com/post/hello">"#));
        assert!(html.contains(r#"<meta name="description" content="Lorem ipsum">"#));
    }

    #[test]
    fn test_fallback() {
        let html = renderer().render_fallback().unwrap();
        assert!(html.contains("Carregando..."));
    }
}
