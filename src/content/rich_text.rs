//! Rich-text nodes and their HTML rendering
//!
//! Article bodies arrive as a flat list of block nodes. Each node carries its
//! plain text plus a list of character-offset spans (bold, italic, links).
//! Consecutive list items are grouped into a single `<ul>` / `<ol>`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::helpers::html_escape;

/// A block of rich text (paragraph, heading, list item, image, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Any other node attributes (image url, alt, oembed, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inline formatting over `text[start..end]`, counted in characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RichTextNode {
    /// Plain paragraph node
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// Render a list of rich-text nodes to HTML
pub fn as_html(nodes: &[RichTextNode]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for node in nodes {
        let list_tag = match node.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        html.push_str(&render_node(node));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

/// Plain text of all nodes, one node per line
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .map(|n| n.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_node(node: &RichTextNode) -> String {
    let inner = || render_spans(&node.text, &node.spans);

    match node.kind.as_str() {
        kind @ ("heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6") => {
            let level = &kind["heading".len()..];
            format!("<h{level}>{}</h{level}>", inner())
        }
        "paragraph" => format!("<p>{}</p>", inner()),
        "preformatted" => format!("<pre>{}</pre>", inner()),
        "list-item" | "o-list-item" => format!("<li>{}</li>", inner()),
        "image" => {
            let url = node.extra_str("url").unwrap_or("");
            let alt = node.extra_str("alt").unwrap_or("");
            format!(
                r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                html_escape(url),
                html_escape(alt)
            )
        }
        "embed" => {
            let oembed = node.extra.get("oembed");
            let url = oembed
                .and_then(|o| o.get("embed_url"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let body = oembed
                .and_then(|o| o.get("html"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            format!(r#"<div data-oembed="{}">{}</div>"#, html_escape(url), body)
        }
        other => {
            tracing::debug!("Rendering unknown rich-text node {:?} as paragraph", other);
            format!("<p>{}</p>", inner())
        }
    }
}

/// Apply spans to `text`, keeping tags properly nested
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::new();
    let mut stack: Vec<&Span> = Vec::new();
    let mut next = 0;

    for i in 0..=len {
        // Close everything ending here, reopening spans that continue
        if stack.iter().any(|s| s.end.min(len) == i) {
            let mut reopen = Vec::new();
            while let Some(span) = stack.pop() {
                out.push_str(close_tag(span));
                if span.end.min(len) != i {
                    reopen.push(span);
                }
                if !stack.iter().any(|s| s.end.min(len) == i) {
                    break;
                }
            }
            for span in reopen.into_iter().rev() {
                out.push_str(&open_tag(span));
                stack.push(span);
            }
        }

        while next < spans.len() && spans[next].start == i {
            out.push_str(&open_tag(spans[next]));
            stack.push(spans[next]);
            next += 1;
        }

        if i < len {
            match chars[i] {
                '\n' => out.push_str("<br />"),
                c => out.push_str(&html_escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let data = span.data.as_ref();
            let url = data
                .and_then(|d| d.get("url"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let target = data
                .and_then(|d| d.get("target"))
                .and_then(|v| v.as_str())
                .map(|t| format!(r#" target="{}" rel="noopener""#, html_escape(t)))
                .unwrap_or_default();
            format!(r#"<a href="{}"{}>"#, html_escape(url), target)
        }
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.get("label"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        _ => String::new(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        "label" => "</span>",
        _ => "",
    }
}
