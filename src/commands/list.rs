//! List articles from the content API

use anyhow::Result;

use crate::assemble::{fetch_listing, Feed};
use crate::helpers::display_date;
use crate::Blog;

/// Print the listing; with `all`, keep following cursors until exhausted
pub async fn run(blog: &Blog, all: bool) -> Result<()> {
    let client = blog.client()?;
    let page = fetch_listing(client.as_ref(), &blog.config.api, blog.config.per_page).await?;

    let mut feed = Feed::new(page);
    if all {
        feed.load_all(client.as_ref()).await?;
    }

    let tz = blog.config.tz();
    println!("Articles ({}):", feed.articles().len());
    for article in feed.articles() {
        let date = article
            .publication_date
            .map(|d| display_date(&d, &tz))
            .unwrap_or_else(|| "unpublished".to_string());
        println!("  {} - {} [{}]", date, article.title, article.uid);
    }
    if feed.has_more() {
        println!("  ... more available (use --all)");
    }

    Ok(())
}
