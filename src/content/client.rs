//! The content API seam
//!
//! Everything that reads articles goes through [`ContentApi`]. Callers
//! construct one client and pass it in explicitly.

use async_trait::async_trait;

use super::{ContentDocument, QueryResponse};
use crate::error::Result;

/// Ordering that walks towards older articles
pub const ORDER_NEWEST_FIRST: &str = "[document.first_publication_date desc]";

/// Ordering that walks towards newer articles
pub const ORDER_OLDEST_FIRST: &str = "[document.first_publication_date]";

/// An `at(path, value)` query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub path: String,
    pub value: String,
}

impl Predicate {
    /// Match documents of a custom type
    pub fn document_type(doc_type: &str) -> Self {
        Predicate {
            path: "document.type".to_string(),
            value: doc_type.to_string(),
        }
    }

    /// Match a document by its uid
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Predicate {
            path: format!("my.{}.uid", doc_type),
            value: uid.to_string(),
        }
    }

    /// Query-language form, e.g. `[at(document.type, "posts")]`
    pub fn to_query(&self) -> String {
        format!("[at({}, {})]", self.path, quote(&self.value))
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render a predicate list as the `q` parameter
pub fn predicates_query(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(Predicate::to_query).collect();
    format!("[{}]", inner)
}

/// Paging and projection options for [`ContentApi::query`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Restrict returned `data` to these fields, e.g. `posts.title`
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    /// Start after this document id in the given ordering
    pub after: Option<String>,
    pub orderings: Option<String>,
    /// Content release / preview ref; defaults to the master ref
    pub reference: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch(mut self, fields: Vec<String>) -> Self {
        self.fetch = fields;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn orderings(mut self, orderings: impl Into<String>) -> Self {
        self.orderings = Some(orderings.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Read access to the headless content API
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Run a search query
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions)
        -> Result<QueryResponse>;

    /// Fetch one document of `doc_type` by uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<ContentDocument>;

    /// Fetch the first document of `doc_type` at a given ref (preview)
    async fn get_single(&self, doc_type: &str, reference: &str) -> Result<ContentDocument>;

    /// Follow a `next_page` cursor
    async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates_query() {
        let q = predicates_query(&[Predicate::document_type("posts")]);
        assert_eq!(q, r#"[[at(document.type, "posts")]]"#);
    }

    #[test]
    fn test_uid_predicate_quotes_value() {
        assert_eq!(
            Predicate::uid("posts", "hello").to_query(),
            r#"[at(my.posts.uid, "hello")]"#
        );
        assert_eq!(
            Predicate::uid("posts", "b\"c").to_query(),
            r#"[at(my.posts.uid, "b\"c")]"#
        );
    }

    #[test]
    fn test_query_options_builder() {
        let options = QueryOptions::new()
            .page_size(1)
            .after("abc")
            .orderings(ORDER_NEWEST_FIRST);
        assert_eq!(options.page_size, Some(1));
        assert_eq!(options.after.as_deref(), Some("abc"));
        assert_eq!(options.orderings.as_deref(), Some(ORDER_NEWEST_FIRST));
        assert!(options.fetch.is_empty());
    }
}
