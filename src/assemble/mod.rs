//! Assemblers - turn raw content documents into view-ready data

mod detail;
mod feed;
mod summary;

pub use detail::{
    assemble_detail, load_article, resolve_neighbors, ArticleDetail, AssembledArticle,
    ContentBlock, NeighborLink, Neighbors,
};
pub use feed::Feed;
pub use summary::{assemble_summary_page, fetch_listing, ArticlePage, ArticleSummary};
