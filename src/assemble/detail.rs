//! Article detail assembly and neighbor resolution

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::content::rich_text::{self, RichTextNode};
use crate::content::{
    ContentApi, ContentDocument, Predicate, QueryOptions, ORDER_NEWEST_FIRST, ORDER_OLDEST_FIRST,
};
use crate::error::Result;
use crate::helpers::{count_words, display_date, reading_time};

/// A heading and its rich-text body
///
/// The heading doubles as the block's identity in the view, so two blocks
/// with the same heading are indistinguishable there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextNode>,
}

/// A fully assembled article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub uid: String,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    /// `first_publication_date` as lower-case `dd MMM yyyy`
    pub display_date: String,
    /// Formatted at render time
    pub last_publication_date: Option<DateTime<Utc>>,
    pub content_blocks: Vec<ContentBlock>,
    pub reading_time: usize,
}

/// Title and slug of an adjacent article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborLink {
    pub title: String,
    pub slug: String,
}

impl From<&ContentDocument> for NeighborLink {
    fn from(doc: &ContentDocument) -> Self {
        Self {
            title: doc.data.title.clone().unwrap_or_default(),
            slug: doc.uid.clone().unwrap_or_default(),
        }
    }
}

/// Adjacent articles by first publication date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbors {
    /// Older article
    pub previous: Option<NeighborLink>,
    /// Newer article
    pub next: Option<NeighborLink>,
}

/// Detail plus navigation, ready for the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledArticle {
    pub detail: ArticleDetail,
    /// `None` only when neither neighbor exists
    pub neighbors: Option<Neighbors>,
    pub is_preview: bool,
}

/// Assemble an article and its navigation
///
/// Neighbor data is always carried through, even in preview mode; hiding it
/// is up to the view.
pub fn assemble_detail<Tz: TimeZone>(
    document: &ContentDocument,
    previous: Option<&ContentDocument>,
    next: Option<&ContentDocument>,
    is_preview: bool,
    tz: &Tz,
) -> AssembledArticle
where
    Tz::Offset: std::fmt::Display,
{
    let data = &document.data;

    let content_blocks: Vec<ContentBlock> = data
        .content
        .iter()
        .map(|block| ContentBlock {
            heading: block.heading.clone().unwrap_or_default(),
            body: block.body.clone(),
        })
        .collect();

    let words: usize = content_blocks
        .iter()
        .map(|b| count_words(&b.heading) + count_words(&rich_text::as_text(&b.body)))
        .sum();

    let detail = ArticleDetail {
        uid: document.uid.clone().unwrap_or_default(),
        title: data.title.clone().unwrap_or_default(),
        banner_url: data.banner.url.clone().unwrap_or_default(),
        author: data.author.clone().unwrap_or_default(),
        first_publication_date: document.first_publication_date,
        display_date: document
            .first_publication_date
            .map(|d| display_date(&d, tz))
            .unwrap_or_default(),
        last_publication_date: document.last_publication_date,
        content_blocks,
        reading_time: reading_time(words),
    };

    let neighbors = if previous.is_none() && next.is_none() {
        None
    } else {
        Some(Neighbors {
            previous: previous.map(NeighborLink::from),
            next: next.map(NeighborLink::from),
        })
    };

    AssembledArticle {
        detail,
        neighbors,
        is_preview,
    }
}

/// Find the nearest older and newer articles around `document`
pub async fn resolve_neighbors<C: ContentApi + ?Sized>(
    client: &C,
    doc_type: &str,
    document: &ContentDocument,
) -> Result<(Option<ContentDocument>, Option<ContentDocument>)> {
    let predicates = [Predicate::document_type(doc_type)];
    let older = QueryOptions::new()
        .after(document.id.clone())
        .orderings(ORDER_NEWEST_FIRST)
        .page_size(1);
    let newer = QueryOptions::new()
        .after(document.id.clone())
        .orderings(ORDER_OLDEST_FIRST)
        .page_size(1);

    let (older, newer) = futures::try_join!(
        client.query(&predicates, &older),
        client.query(&predicates, &newer)
    )?;

    let pick = |results: Vec<ContentDocument>| results.into_iter().find(|d| d.id != document.id);
    Ok((pick(older.results), pick(newer.results)))
}

/// Fetch, resolve neighbors for, and assemble one article
///
/// With a preview `reference` the draft revision is loaded and the result
/// is flagged as a preview. Errors propagate: a failed fetch fails the
/// whole generation unit.
pub async fn load_article<C, Tz>(
    client: &C,
    doc_type: &str,
    slug: &str,
    reference: Option<&str>,
    tz: &Tz,
) -> Result<AssembledArticle>
where
    C: ContentApi + ?Sized,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut options = QueryOptions::new();
    if let Some(reference) = reference {
        options = options.reference(reference);
    }

    let document = client.get_by_uid(doc_type, slug, &options).await?;
    let (previous, next) = resolve_neighbors(client, doc_type, &document).await?;

    Ok(assemble_detail(
        &document,
        previous.as_ref(),
        next.as_ref(),
        reference.is_some(),
        tz,
    ))
}
