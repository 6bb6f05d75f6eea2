//! "Load more" accumulation over listing cursors

use super::{ArticlePage, ArticleSummary};
use crate::content::ContentApi;
use crate::error::Result;

/// The growing listing and the cursor to its next page
///
/// A load claims the current cursor first. While a load is in flight no
/// second load starts, and a completion whose cursor is not the claimed one
/// is discarded, so late or repeated responses never double-append.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    articles: Vec<ArticleSummary>,
    cursor: Option<String>,
    in_flight: Option<String>,
}

impl Feed {
    /// Start from the first listing page
    pub fn new(page: ArticlePage) -> Self {
        Self {
            articles: page.results,
            cursor: page.next_page_cursor,
            in_flight: None,
        }
    }

    pub fn articles(&self) -> &[ArticleSummary] {
        &self.articles
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether the "load more" affordance should be shown
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Claim the current cursor; `None` when exhausted or already loading
    pub fn begin_load(&mut self) -> Option<String> {
        if self.in_flight.is_some() {
            return None;
        }
        let cursor = self.cursor.clone()?;
        self.in_flight = Some(cursor.clone());
        Some(cursor)
    }

    /// Append a fetched page; returns `false` if `cursor` was not the claimed one
    pub fn complete_load(&mut self, cursor: &str, page: ArticlePage) -> bool {
        if self.in_flight.as_deref() != Some(cursor) {
            tracing::debug!("Discarding stale page for cursor {}", cursor);
            return false;
        }
        self.in_flight = None;
        self.articles.extend(page.results);
        self.cursor = page.next_page_cursor;
        true
    }

    /// Release a claim after a failed fetch so the load can be retried
    pub fn abort_load(&mut self, cursor: &str) {
        if self.in_flight.as_deref() == Some(cursor) {
            self.in_flight = None;
        }
    }

    /// Fetch the next page and append it, returning how many articles were added
    pub async fn load_more<C: ContentApi + ?Sized>(&mut self, client: &C) -> Result<usize> {
        let Some(cursor) = self.begin_load() else {
            return Ok(0);
        };

        match client.fetch_page(&cursor).await {
            Ok(response) => {
                let page = ArticlePage::from(response);
                let added = page.results.len();
                self.complete_load(&cursor, page);
                Ok(added)
            }
            Err(e) => {
                tracing::warn!("Failed to load more articles: {}", e);
                self.abort_load(&cursor);
                Err(e)
            }
        }
    }

    /// Follow cursors until the listing is exhausted
    pub async fn load_all<C: ContentApi + ?Sized>(&mut self, client: &C) -> Result<usize> {
        let mut added = 0;
        while self.has_more() {
            added += self.load_more(client).await?;
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{assemble_summary_page, fetch_listing};
    use crate::config::ApiConfig;
    use crate::content::{ContentDocument, MemoryContent, Predicate, QueryOptions, QueryResponse};
    use crate::error::Error;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves fixed responses per cursor
    #[derive(Default)]
    struct CannedPages {
        pages: Mutex<HashMap<String, QueryResponse>>,
    }

    impl CannedPages {
        fn insert(&self, cursor: &str, response: QueryResponse) {
            self.pages.lock().unwrap().insert(cursor.to_string(), response);
        }
    }

    #[async_trait]
    impl ContentApi for CannedPages {
        async fn query(&self, _: &[Predicate], _: &QueryOptions) -> Result<QueryResponse> {
            Ok(QueryResponse::default())
        }

        async fn get_by_uid(
            &self,
            doc_type: &str,
            uid: &str,
            _: &QueryOptions,
        ) -> Result<ContentDocument> {
            Err(Error::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
        }

        async fn get_single(&self, doc_type: &str, _: &str) -> Result<ContentDocument> {
            self.get_by_uid(doc_type, "<single>", &QueryOptions::new()).await
        }

        async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse> {
            self.pages
                .lock()
                .unwrap()
                .get(cursor)
                .cloned()
                .ok_or_else(|| Error::Status {
                    status: 404,
                    url: cursor.to_string(),
                })
        }
    }

    fn docs(uids: &[&str]) -> Vec<ContentDocument> {
        uids.iter()
            .map(|uid| ContentDocument {
                id: uid.to_string(),
                uid: Some(uid.to_string()),
                doc_type: "posts".to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn response(uids: &[&str], next: Option<&str>) -> QueryResponse {
        QueryResponse {
            results: docs(uids),
            next_page: next.map(str::to_string),
            ..Default::default()
        }
    }

    fn uids(feed: &Feed) -> Vec<&str> {
        feed.articles().iter().map(|a| a.uid.as_str()).collect()
    }

    const C1: &str = "https://api.test/search?page=2";
    const C2: &str = "https://api.test/search?page=3";

    #[tokio::test]
    async fn test_load_more_concatenates_pages() {
        let client = CannedPages::default();
        client.insert(C1, response(&["b", "c"], Some(C2)));
        client.insert(C2, response(&["d"], None));

        let mut feed = Feed::new(assemble_summary_page(&docs(&["a"]), Some(C1.to_string())));
        assert!(feed.has_more());

        assert_eq!(feed.load_more(&client).await.unwrap(), 2);
        assert_eq!(feed.cursor(), Some(C2));
        assert_eq!(feed.load_more(&client).await.unwrap(), 1);

        assert_eq!(uids(&feed), vec!["a", "b", "c", "d"]);
        assert_eq!(feed.cursor(), None);
        assert!(!feed.has_more());
        assert_eq!(feed.load_more(&client).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_load_all() {
        let client = CannedPages::default();
        client.insert(C1, response(&["b"], Some(C2)));
        client.insert(C2, response(&["c"], None));

        let mut feed = Feed::new(assemble_summary_page(&docs(&["a"]), Some(C1.to_string())));
        assert_eq!(feed.load_all(&client).await.unwrap(), 2);
        assert_eq!(uids(&feed), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_second_load_while_in_flight_is_refused() {
        let mut feed = Feed::new(assemble_summary_page(&docs(&["a"]), Some(C1.to_string())));
        assert_eq!(feed.begin_load().as_deref(), Some(C1));
        assert!(feed.is_loading());
        assert_eq!(feed.begin_load(), None);
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut feed = Feed::new(assemble_summary_page(&docs(&["a"]), Some(C1.to_string())));
        let cursor = feed.begin_load().unwrap();
        assert!(feed.complete_load(
            &cursor,
            assemble_summary_page(&docs(&["b"]), Some(C2.to_string()))
        ));

        // A duplicate response for the already-consumed cursor arrives late
        assert!(!feed.complete_load(&cursor, assemble_summary_page(&docs(&["b"]), None)));
        assert_eq!(uids(&feed), vec!["a", "b"]);
        assert_eq!(feed.cursor(), Some(C2));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_cursor_for_retry() {
        let client = CannedPages::default();
        let mut feed = Feed::new(assemble_summary_page(&docs(&["a"]), Some(C1.to_string())));

        assert!(feed.load_more(&client).await.is_err());
        assert_eq!(feed.cursor(), Some(C1));
        assert!(!feed.is_loading());

        client.insert(C1, response(&["b"], None));
        assert_eq!(feed.load_more(&client).await.unwrap(), 1);
        assert_eq!(uids(&feed), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_load_all_from_memory_store() {
        let client = MemoryContent::new(docs(&["a", "b", "c"]));
        let page = fetch_listing(&client, &ApiConfig::default(), 1).await.unwrap();

        let mut feed = Feed::new(page);
        assert_eq!(uids(&feed), vec!["a"]);
        assert_eq!(feed.load_all(&client).await.unwrap(), 2);
        assert_eq!(uids(&feed), vec!["a", "b", "c"]);
        assert!(!feed.has_more());
    }

    #[test]
    fn test_single_article_without_cursor() {
        let feed = Feed::new(assemble_summary_page(&docs(&["a"]), None));
        assert_eq!(feed.articles().len(), 1);
        assert!(!feed.has_more());
    }
}
