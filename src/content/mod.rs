//! Content module - the headless content API and the documents it returns

mod client;
mod document;
mod memory;
mod prismic;
pub mod rich_text;

pub use client::{ContentApi, Predicate, QueryOptions, ORDER_NEWEST_FIRST, ORDER_OLDEST_FIRST};
pub use document::{ContentDocument, Image, QueryResponse, RawBlock, RawFields};
pub use memory::{MemoryContent, SEARCH_PATH};
pub use prismic::PrismicClient;
pub use rich_text::{RichTextNode, Span};
