//! In-memory [`ContentApi`] backed by a fixed document set
//!
//! Used for offline builds from a JSON fixture file and in tests. Query
//! semantics follow the remote API closely enough for the assemblers:
//! type/uid predicates, publication-date orderings, `after` anchors and
//! paging through `next_page` cursors.
//!
//! A cursor is the search URL of its page, carrying the whole query in its
//! parameters. Nothing is kept between calls; any store holding the same
//! documents can answer any cursor.

use async_trait::async_trait;
use std::collections::HashMap;
use url::Url;

use super::{ContentApi, ContentDocument, Predicate, QueryOptions, QueryResponse};
use crate::error::{Error, Result};

/// Page size used when a query does not set one
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Cursor base when none is configured
pub const DEFAULT_CURSOR_BASE: &str = "memory://fixtures";

/// Route of the search endpoint below the cursor base
pub const SEARCH_PATH: &str = "/documents/search";

/// Resolves root-relative cursors before reading their parameters
const CURSOR_ORIGIN: &str = "memory://fixtures/";

/// Query parameter prefix of an `at` predicate
const PREDICATE_PREFIX: &str = "at.";

pub struct MemoryContent {
    documents: Vec<ContentDocument>,
    previews: HashMap<String, Vec<ContentDocument>>,
    cursor_base: String,
}

impl MemoryContent {
    pub fn new(documents: Vec<ContentDocument>) -> Self {
        Self {
            documents,
            previews: HashMap::new(),
            cursor_base: DEFAULT_CURSOR_BASE.to_string(),
        }
    }

    /// Parse a fixture: either a bare document array or a search response
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let documents: Vec<ContentDocument> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            serde_json::from_value::<QueryResponse>(value)?.results
        };
        Ok(Self::new(documents))
    }

    /// Draft revisions visible only when querying with `reference`
    pub fn with_preview(mut self, reference: &str, documents: Vec<ContentDocument>) -> Self {
        self.previews.insert(reference.to_string(), documents);
        self
    }

    /// Issue cursors below `base`, e.g. `/api` for pages the server answers
    pub fn with_cursor_base(mut self, base: impl Into<String>) -> Self {
        self.cursor_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Documents visible at `reference`; drafts replace published revisions by id
    fn visible(&self, reference: Option<&str>) -> Vec<ContentDocument> {
        let drafts = reference.and_then(|r| self.previews.get(r));
        let Some(drafts) = drafts else {
            return self.documents.clone();
        };

        let mut docs: Vec<ContentDocument> = self
            .documents
            .iter()
            .map(|d| drafts.iter().find(|p| p.id == d.id).unwrap_or(d).clone())
            .collect();
        for draft in drafts {
            if !docs.iter().any(|d| d.id == draft.id) {
                docs.push(draft.clone());
            }
        }
        docs
    }

    /// Run a query and cut out one page of its results
    fn page(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
        page: usize,
    ) -> QueryResponse {
        let mut docs: Vec<ContentDocument> = self
            .visible(options.reference.as_deref())
            .into_iter()
            .filter(|d| predicates.iter().all(|p| matches(d, p)))
            .collect();

        if let Some(orderings) = &options.orderings {
            if orderings.contains("first_publication_date") {
                docs.sort_by(|a, b| a.first_publication_date.cmp(&b.first_publication_date));
                if orderings.contains("desc") {
                    docs.reverse();
                }
            }
        }

        if let Some(after) = &options.after {
            if let Some(pos) = docs.iter().position(|d| &d.id == after) {
                docs.drain(..=pos);
            }
        }

        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1) as usize;
        let total = docs.len();
        let total_pages = total.div_ceil(page_size).max(1);
        let results = docs
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        QueryResponse {
            page: page as u32,
            total_pages: total_pages as u32,
            total_results_size: total as u32,
            results,
            next_page: (page < total_pages).then(|| self.cursor(predicates, options, page + 1)),
        }
    }

    /// Search URL of `page` for a query
    fn cursor(&self, predicates: &[Predicate], options: &QueryOptions, page: usize) -> String {
        let mut params = url::form_urlencoded::Serializer::new(String::new());
        for predicate in predicates {
            params.append_pair(
                &format!("{}{}", PREDICATE_PREFIX, predicate.path),
                &predicate.value,
            );
        }
        if !options.fetch.is_empty() {
            params.append_pair("fetch", &options.fetch.join(","));
        }
        if let Some(size) = options.page_size {
            params.append_pair("pageSize", &size.to_string());
        }
        if let Some(after) = &options.after {
            params.append_pair("after", after);
        }
        if let Some(orderings) = &options.orderings {
            params.append_pair("orderings", orderings);
        }
        if let Some(reference) = &options.reference {
            params.append_pair("ref", reference);
        }
        params.append_pair("page", &page.to_string());

        format!("{}{}?{}", self.cursor_base, SEARCH_PATH, params.finish())
    }

    fn not_found(doc_type: &str, uid: &str) -> Error {
        Error::NotFound {
            doc_type: doc_type.to_string(),
            uid: uid.to_string(),
        }
    }
}

/// Recover the query and page number from a cursor
fn parse_cursor(cursor: &str) -> Result<(Vec<Predicate>, QueryOptions, usize)> {
    let url = Url::parse(CURSOR_ORIGIN)
        .and_then(|origin| origin.join(cursor))
        .map_err(|source| Error::InvalidCursor {
            cursor: cursor.to_string(),
            source,
        })?;
    let rejected = |status: u16| Error::Status {
        status,
        url: cursor.to_string(),
    };
    if !url.path().ends_with(SEARCH_PATH) {
        return Err(rejected(404));
    }

    let mut predicates = Vec::new();
    let mut options = QueryOptions::new();
    let mut page = 1;
    for (key, value) in url.query_pairs() {
        let value = value.into_owned();
        match key.as_ref() {
            "fetch" => options.fetch = value.split(',').map(str::to_string).collect(),
            "pageSize" => options.page_size = Some(value.parse().map_err(|_| rejected(400))?),
            "after" => options.after = Some(value),
            "orderings" => options.orderings = Some(value),
            "ref" => options.reference = Some(value),
            "page" => page = value.parse().map_err(|_| rejected(400))?,
            key => match key.strip_prefix(PREDICATE_PREFIX) {
                Some(path) => predicates.push(Predicate {
                    path: path.to_string(),
                    value,
                }),
                None => return Err(rejected(400)),
            },
        }
    }
    if page == 0 {
        return Err(rejected(400));
    }

    Ok((predicates, options, page))
}

fn field(doc: &ContentDocument, path: &str) -> Option<String> {
    match path {
        "document.type" => Some(doc.doc_type.clone()),
        "document.id" => Some(doc.id.clone()),
        _ => {
            let doc_type = path.strip_prefix("my.")?.strip_suffix(".uid")?;
            if doc_type == doc.doc_type {
                doc.uid.clone()
            } else {
                None
            }
        }
    }
}

fn matches(doc: &ContentDocument, predicate: &Predicate) -> bool {
    field(doc, &predicate.path).as_deref() == Some(predicate.value.as_str())
}

#[async_trait]
impl ContentApi for MemoryContent {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse> {
        Ok(self.page(predicates, options, 1))
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<ContentDocument> {
        let response = self.query(&[Predicate::uid(doc_type, uid)], options).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(doc_type, uid))
    }

    async fn get_single(&self, doc_type: &str, reference: &str) -> Result<ContentDocument> {
        let drafts = self.previews.get(reference).cloned().unwrap_or_default();
        drafts
            .into_iter()
            .find(|d| d.doc_type == doc_type)
            .ok_or_else(|| Self::not_found(doc_type, "<single>"))
    }

    async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse> {
        let (predicates, options, page) = parse_cursor(cursor)?;
        Ok(self.page(&predicates, &options, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ORDER_NEWEST_FIRST, ORDER_OLDEST_FIRST};
    use crate::helpers::parse_timestamp;

    fn doc(id: &str, date: &str) -> ContentDocument {
        ContentDocument {
            id: id.to_string(),
            uid: Some(id.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: parse_timestamp(date),
            ..Default::default()
        }
    }

    fn store() -> MemoryContent {
        MemoryContent::new(vec![
            doc("b", "2021-02-01T00:00:00Z"),
            doc("a", "2021-01-01T00:00:00Z"),
            doc("c", "2021-03-01T00:00:00Z"),
        ])
    }

    fn uids(response: &QueryResponse) -> Vec<&str> {
        response
            .results
            .iter()
            .filter_map(|d| d.uid.as_deref())
            .collect()
    }

    #[tokio::test]
    async fn test_paging_through_cursors() {
        let store = store();
        let options = QueryOptions::new().page_size(2).orderings(ORDER_NEWEST_FIRST);
        let first = store
            .query(&[Predicate::document_type("posts")], &options)
            .await
            .unwrap();
        assert_eq!(uids(&first), vec!["c", "b"]);
        let cursor = first.next_page.clone().unwrap();

        let second = store.fetch_page(&cursor).await.unwrap();
        assert_eq!(uids(&second), vec!["a"]);
        assert_eq!(second.next_page, None);
    }

    #[tokio::test]
    async fn test_after_anchor() {
        let store = store();
        let older = store
            .query(
                &[Predicate::document_type("posts")],
                &QueryOptions::new().after("b").orderings(ORDER_NEWEST_FIRST).page_size(1),
            )
            .await
            .unwrap();
        assert_eq!(uids(&older), vec!["a"]);

        let newer = store
            .query(
                &[Predicate::document_type("posts")],
                &QueryOptions::new().after("c").orderings(ORDER_OLDEST_FIRST).page_size(1),
            )
            .await
            .unwrap();
        assert!(newer.results.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_uid_and_previews() {
        let mut draft = doc("b", "2021-02-01T00:00:00Z");
        draft.data.title = Some("Draft title".to_string());
        let store = store().with_preview("preview-ref", vec![draft]);

        let published = store
            .get_by_uid("posts", "b", &QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(published.data.title, None);

        let previewed = store
            .get_by_uid("posts", "b", &QueryOptions::new().reference("preview-ref"))
            .await
            .unwrap();
        assert_eq!(previewed.data.title.as_deref(), Some("Draft title"));

        let single = store.get_single("posts", "preview-ref").await.unwrap();
        assert_eq!(single.uid.as_deref(), Some("b"));

        let missing = store.get_by_uid("posts", "zzz", &QueryOptions::new()).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_cursors_need_no_stored_state() {
        let drafts = || vec![doc("d", "2021-04-01T00:00:00Z")];
        let options = QueryOptions::new()
            .fetch(vec!["posts.title".to_string()])
            .page_size(1)
            .orderings(ORDER_NEWEST_FIRST)
            .reference("draft-ref");
        let first = store()
            .with_preview("draft-ref", drafts())
            .query(&[Predicate::document_type("posts")], &options)
            .await
            .unwrap();
        assert_eq!(uids(&first), vec!["d"]);
        let cursor = first.next_page.clone().unwrap();

        // A different store over the same documents answers the cursor
        let other = store().with_preview("draft-ref", drafts());
        let second = other.fetch_page(&cursor).await.unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(uids(&second), vec!["c"]);

        // Repeating a cursor yields the same page
        let again = other.fetch_page(&cursor).await.unwrap();
        assert_eq!(again, second);
    }

    #[tokio::test]
    async fn test_relative_cursor_base() {
        let store = store().with_cursor_base("/blog/api/");
        let options = QueryOptions::new().page_size(1).orderings(ORDER_NEWEST_FIRST);
        let first = store
            .query(&[Predicate::document_type("posts")], &options)
            .await
            .unwrap();
        let cursor = first.next_page.clone().unwrap();
        assert!(cursor.starts_with("/blog/api/documents/search?"));

        let second = store.fetch_page(&cursor).await.unwrap();
        assert_eq!(uids(&second), vec!["b"]);
        let third = store.fetch_page(second.next_page.as_deref().unwrap()).await.unwrap();
        assert_eq!(uids(&third), vec!["a"]);
        assert_eq!(third.next_page, None);
    }

    #[tokio::test]
    async fn test_malformed_cursors() {
        let store = store();
        let wrong_path = store.fetch_page("memory://fixtures/other?page=2").await;
        assert!(matches!(wrong_path, Err(Error::Status { status: 404, .. })));
        let bad_page = store
            .fetch_page("memory://fixtures/documents/search?page=two")
            .await;
        assert!(matches!(bad_page, Err(Error::Status { status: 400, .. })));
        let unknown = store
            .fetch_page("memory://fixtures/documents/search?query=1&page=2")
            .await;
        assert!(matches!(unknown, Err(Error::Status { status: 400, .. })));
    }

    #[test]
    fn test_from_json_accepts_both_shapes() {
        let bare = MemoryContent::from_json(r#"[{"id": "a", "type": "posts"}]"#).unwrap();
        assert_eq!(bare.documents.len(), 1);
        let response =
            MemoryContent::from_json(r#"{"results": [{"id": "a"}, {"id": "b"}], "next_page": null}"#)
                .unwrap();
        assert_eq!(response.documents.len(), 2);
    }
}
