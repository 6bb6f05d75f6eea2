//! Third-party comment widget embed
//!
//! The detail view renders an empty container; mounting places the widget's
//! script tag inside it. Mounting checks for an already injected script so a
//! page processed twice still carries exactly one widget.

use crate::config::CommentsConfig;
use crate::helpers::html_escape;

/// DOM id of the container the widget owns
pub const CONTAINER_ID: &str = "inject-comments-for-uterances";

/// Marker attribute identifying an injected script
const MARKER: &str = "data-comment-embed";

#[derive(Debug, Clone)]
pub struct CommentEmbed {
    src: String,
    repo: String,
    issue_term: String,
    theme: String,
}

impl CommentEmbed {
    /// Build from config; `None` when comments are disabled or no repo is set
    pub fn from_config(config: &CommentsConfig) -> Option<Self> {
        if !config.enable || config.repo.trim().is_empty() {
            return None;
        }
        Some(Self {
            src: config.src.clone(),
            repo: config.repo.clone(),
            issue_term: config.issue_term.clone(),
            theme: config.theme.clone(),
        })
    }

    /// The empty container the view renders
    pub fn container() -> String {
        format!(r#"<div id="{}"></div>"#, CONTAINER_ID)
    }

    /// The widget's script tag
    pub fn script_tag(&self) -> String {
        format!(
            r#"<script {} src="{}" repo="{}" issue-term="{}" theme="{}" crossorigin="anonymous" async></script>"#,
            MARKER,
            html_escape(&self.src),
            html_escape(&self.repo),
            html_escape(&self.issue_term),
            html_escape(&self.theme),
        )
    }

    /// Whether `html` already carries the widget script
    pub fn is_mounted(html: &str) -> bool {
        container_body(html).is_some_and(|(start, end)| html[start..end].contains(MARKER))
    }

    /// Inject the script into the container, at most once
    ///
    /// Pages without a container (e.g. previews) are returned unchanged.
    pub fn mount(&self, html: &str) -> String {
        match container_body(html) {
            Some((start, end)) if !html[start..end].contains(MARKER) => {
                let mut out = String::with_capacity(html.len() + 256);
                out.push_str(&html[..end]);
                out.push_str(&self.script_tag());
                out.push_str(&html[end..]);
                out
            }
            _ => html.to_string(),
        }
    }
}

/// Byte range between the container's opening tag and its closing `</div>`
///
/// The last container wins; the view renders it after the article body.
fn container_body(html: &str) -> Option<(usize, usize)> {
    let open = format!(r#"<div id="{}">"#, CONTAINER_ID);
    let start = html.rfind(&open)? + open.len();
    let end = start + html[start..].find("</div>")?;
    Some((start, end))
}
