//! Listing assembly

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::content::{ContentApi, ContentDocument, Predicate, QueryOptions, QueryResponse};
use crate::error::Result;

/// One entry of the article listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Left unformatted; the listing view formats it at render time
    pub publication_date: Option<DateTime<Utc>>,
}

impl From<&ContentDocument> for ArticleSummary {
    fn from(doc: &ContentDocument) -> Self {
        Self {
            uid: doc.uid.clone().unwrap_or_default(),
            title: doc.data.title.clone().unwrap_or_default(),
            subtitle: doc.data.subtitle.clone().unwrap_or_default(),
            author: doc.data.author.clone().unwrap_or_default(),
            publication_date: doc.first_publication_date,
        }
    }
}

/// One page of the listing plus the cursor to the next one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub results: Vec<ArticleSummary>,
    /// `None` iff there are no further pages
    pub next_page_cursor: Option<String>,
}

impl From<QueryResponse> for ArticlePage {
    fn from(response: QueryResponse) -> Self {
        assemble_summary_page(&response.results, response.next_page)
    }
}

/// Map a page of documents to summaries, preserving API order
///
/// Documents are expected to be pre-filtered to the article type.
pub fn assemble_summary_page(
    documents: &[ContentDocument],
    next_page_cursor: Option<String>,
) -> ArticlePage {
    ArticlePage {
        results: documents.iter().map(ArticleSummary::from).collect(),
        next_page_cursor,
    }
}

/// Fetch and assemble the first listing page
pub async fn fetch_listing<C: ContentApi + ?Sized>(
    client: &C,
    api: &ApiConfig,
    per_page: u32,
) -> Result<ArticlePage> {
    let options = QueryOptions::new()
        .fetch(api.fetch_fields())
        .page_size(per_page);
    let response = client
        .query(&[Predicate::document_type(&api.document_type)], &options)
        .await?;
    tracing::debug!(
        "Listing page has {} articles (more: {})",
        response.results.len(),
        response.next_page.is_some()
    );
    Ok(response.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{MemoryContent, RawFields};
    use crate::helpers::parse_timestamp;

    fn doc(uid: &str, title: &str) -> ContentDocument {
        ContentDocument {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: parse_timestamp("2021-03-15T10:00:00Z"),
            data: RawFields {
                title: Some(title.to_string()),
                subtitle: Some(format!("{} subtitle", title)),
                author: Some("Joseph Oliveira".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_page_keeps_cursor() {
        let page = assemble_summary_page(&[], Some("https://api/next".to_string()));
        assert!(page.results.is_empty());
        assert_eq!(page.next_page_cursor.as_deref(), Some("https://api/next"));
    }

    #[test]
    fn test_preserves_length_and_order() {
        let docs = vec![doc("c", "Third"), doc("a", "First"), doc("b", "Second")];
        let page = assemble_summary_page(&docs, None);
        assert_eq!(page.results.len(), docs.len());
        let uids: Vec<&str> = page.results.iter().map(|s| s.uid.as_str()).collect();
        assert_eq!(uids, vec!["c", "a", "b"]);
        assert_eq!(page.results[0].title, "Third");
        assert_eq!(page.results[0].subtitle, "Third subtitle");
        assert_eq!(page.results[0].author, "Joseph Oliveira");
        assert_eq!(
            page.results[0].publication_date,
            parse_timestamp("2021-03-15T10:00:00Z")
        );
    }

    #[test]
    fn test_missing_fields_are_blank() {
        let bare = ContentDocument {
            id: "x".to_string(),
            ..Default::default()
        };
        let page = assemble_summary_page(&[bare], None);
        let summary = &page.results[0];
        assert_eq!(summary.uid, "");
        assert_eq!(summary.subtitle, "");
        assert_eq!(summary.publication_date, None);
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let client = MemoryContent::new(vec![doc("a", "First"), doc("b", "Second")]);
        let page = fetch_listing(&client, &ApiConfig::default(), 1).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].uid, "a");
        assert!(page.next_page_cursor.is_some());
    }
}
