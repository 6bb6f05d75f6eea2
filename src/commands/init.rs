//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::Blog;

/// Default configuration written by `init`
const CONFIG_TEMPLATE: &str = r#"# Site
title: Spacetraveling
url: http://example.com
root: /
public_dir: public

# Date / Time
## IANA name, empty for UTC
timezone: ''
## Locale of the "edited" annotation
date_locale: pt_BR

# Listing page size
per_page: 1

# Concurrent article generation
concurrency: 4

# Content API
## PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these
api:
  endpoint: ''
  access_token:
  ## Remove to read from the endpoint above
  fixtures: content.json
  document_type: posts
  listing_fields: [title, subtitle, author]

# Comment widget
comments:
  enable: true
  src: https://utteranc.es/client.js
  repo: ''
  issue_term: url
  theme: photon-dark
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S+0000").to_string();
    let sample = serde_json::json!([{
        "id": "hello-world",
        "uid": "hello-world",
        "type": "posts",
        "first_publication_date": now,
        "last_publication_date": null,
        "data": {
            "title": "Hello World",
            "subtitle": "Your very first post",
            "author": "Spacetraveling",
            "banner": {},
            "content": [{
                "heading": "Quick Start",
                "body": [
                    { "type": "paragraph", "text": "Point api.endpoint at your content repository and run generate.", "spans": [] }
                ]
            }]
        }
    }]);
    fs::write(
        target_dir.join("content.json"),
        serde_json::to_string_pretty(&sample)?,
    )?;

    Ok(())
}

/// Run the init command for an existing blog directory
pub fn run(blog: &Blog) -> Result<()> {
    init_site(&blog.base_dir)
}
