//! Preview server
//!
//! Serves the public directory. Article routes fall back to on-demand
//! generation for slugs that have not been generated yet, and render drafts
//! when a preview ref is supplied.

use anyhow::Result;
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::SEARCH_PATH;
use crate::error::Error;
use crate::generator::Generator;
use crate::helpers::{is_safe_slug, post_path, url_for};

/// Where fixture-backed sites answer their listing cursors
pub const FIXTURE_API_ROOT: &str = "api";

/// Server state
pub struct ServerState {
    generator: Generator,
    /// Slugs currently being generated on demand
    pending: Mutex<HashSet<String>>,
}

impl ServerState {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            pending: Mutex::new(HashSet::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewEntry {
    token: String,
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = state.generator.blog().public_dir.clone();

    Router::new()
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .route(
            &format!("/{}{}", FIXTURE_API_ROOT, SEARCH_PATH),
            get(search_page_handler),
        )
        .route("/api/preview", get(enter_preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(generator: Generator, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(generator));
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Article page: static file, on-demand generation, or preview render
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    Query(params): Query<PreviewParams>,
) -> Response {
    if !is_safe_slug(&slug) {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let generator = &state.generator;

    if let Some(reference) = params.reference.filter(|r| !r.is_empty()) {
        return match generator.render_post(&slug, Some(&reference)).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => error_response(&slug, e),
        };
    }

    let output_path = generator.post_output_path(&slug);
    if let Ok(html) = tokio::fs::read_to_string(&output_path).await {
        return Html(html).into_response();
    }

    // Another request is already generating this slug
    if !state.pending.lock().await.insert(slug.clone()) {
        return match generator.render_fallback() {
            Ok(html) => Html(html).into_response(),
            Err(e) => error_response(&slug, e),
        };
    }

    tracing::info!("Generating {:?} on demand", slug);
    let result = generator.generate_post(&slug).await;
    state.pending.lock().await.remove(&slug);

    let html = match result {
        Ok(path) => tokio::fs::read_to_string(&path).await.map_err(Into::into),
        Err(e) => Err(e),
    };
    match html {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(&slug, e),
    }
}

/// Answer a listing cursor issued by the offline content store
async fn search_page_handler(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
) -> Response {
    let config = &state.generator.blog().config;
    let cursor = format!(
        "{}{}?{}",
        url_for(config, FIXTURE_API_ROOT),
        SEARCH_PATH,
        query.unwrap_or_default()
    );

    match state.generator.client().fetch_page(&cursor).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => error_response(&cursor, e.into()),
    }
}

/// Resolve a preview token to its document and open it in preview mode
async fn enter_preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(entry): Query<PreviewEntry>,
) -> Response {
    let blog = state.generator.blog();

    match state
        .generator
        .client()
        .get_single(&blog.config.api.document_type, &entry.token)
        .await
    {
        Ok(doc) => {
            let slug = doc.uid.unwrap_or_default();
            let token: String = url::form_urlencoded::byte_serialize(entry.token.as_bytes()).collect();
            let target = format!("{}?ref={}", url_for(&blog.config, &post_path(&slug)), token);
            Redirect::temporary(&target).into_response()
        }
        Err(e) => error_response("<preview>", e.into()),
    }
}

/// Leave preview mode
async fn exit_preview_handler(State(state): State<Arc<ServerState>>) -> Redirect {
    Redirect::temporary(&url_for(&state.generator.blog().config, ""))
}

fn error_response(target: &str, error: anyhow::Error) -> Response {
    match error.downcast_ref::<Error>() {
        Some(Error::NotFound { .. }) => {
            tracing::debug!("No article for {:?}", target);
            return (StatusCode::NOT_FOUND, "Not found").into_response();
        }
        Some(Error::InvalidCursor { .. }) | Some(Error::Status { status: 400, .. }) => {
            tracing::debug!("Rejected cursor {:?}", target);
            return (StatusCode::BAD_REQUEST, "Bad cursor").into_response();
        }
        _ => {}
    }
    tracing::error!("Failed to render {:?}: {:#}", target, error);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
