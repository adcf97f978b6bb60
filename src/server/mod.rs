//! Preview server
//!
//! Serves the generated site and renders pages live when a preview token is
//! present or a post has not been generated yet.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::normalize::is_valid_uid;
use crate::error::BlogError;
use crate::generator::Generator;
use crate::preview::{active_token, preview_query};
use crate::repository::ContentRepository;
use crate::templates::{is_remote_cursor, load_more_url, POSTS_ROUTE};
use crate::Blog;

/// Server state
struct ServerState {
    public_dir: PathBuf,
    generator: Generator,
    repository: Arc<dyn ContentRepository>,
}

#[derive(Debug, Default, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    uid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CursorParams {
    cursor: String,
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let app = router(server_state(blog)?);

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

fn server_state(blog: &Blog) -> Result<Arc<ServerState>> {
    Ok(Arc::new(ServerState {
        public_dir: blog.public_dir.clone(),
        generator: Generator::new(blog)?,
        repository: blog.repository(),
    }))
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/post/:uid/", get(post_handler))
        .route(POSTS_ROUTE, get(posts_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Index page; rendered live from the draft revision in preview mode
async fn index_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PreviewParams>,
    request: Request<Body>,
) -> Response {
    let Some(token) = active_token(params.token.as_deref()) else {
        return fallback_handler(State(state), request).await;
    };

    let rendered = match state.generator.initial_state(Some(token)).await {
        Ok(initial) => state.generator.render_index(&initial, Some(token)),
        Err(e) => Err(e),
    };
    page_response(rendered)
}

/// Post page; generated file when available, live render otherwise
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
    Query(params): Query<PreviewParams>,
) -> Response {
    if !is_valid_uid(&uid) {
        tracing::debug!(uid = %uid, "Rejecting malformed post uid");
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let token = active_token(params.token.as_deref());

    if token.is_none() {
        let file = state.public_dir.join("post").join(&uid).join("index.html");
        if let Ok(content) = tokio::fs::read_to_string(&file).await {
            return Html(content).into_response();
        }
        tracing::debug!(uid = %uid, "No generated page, rendering live");
    }

    page_response(state.generator.render_post(&uid, token).await)
}

/// Next index page behind a cursor the browser cannot fetch itself
///
/// Answers in the repository's own `{results, next_page}` shape, with
/// `next_page` rewritten to the URL the "load more" button should fetch next.
async fn posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<CursorParams>,
) -> Response {
    if is_remote_cursor(&params.cursor) {
        return (StatusCode::BAD_REQUEST, "Cursor must be fetched directly").into_response();
    }

    match state.repository.follow(&params.cursor).await {
        Ok(mut page) => {
            page.next_page = page.next_page.as_deref().map(load_more_url);
            Json(page).into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to load next index page: {}", e);
            (StatusCode::BAD_GATEWAY, "Could not load posts").into_response()
        }
    }
}

/// Enter preview mode for a document (or the index when no uid is given)
async fn preview_handler(Query(params): Query<PreviewParams>) -> Response {
    let Some(token) = active_token(params.token.as_deref()) else {
        return (StatusCode::BAD_REQUEST, "Missing preview token").into_response();
    };

    Redirect::temporary(&preview_location(params.uid.as_deref(), token)).into_response()
}

/// Leave preview mode: back to the published index
async fn exit_preview_handler() -> Redirect {
    Redirect::temporary("/")
}

fn preview_location(uid: Option<&str>, token: &str) -> String {
    let query = preview_query(Some(token));
    match uid {
        Some(uid) if !uid.is_empty() => format!(
            "/post/{}/{}",
            utf8_percent_encode(uid, NON_ALPHANUMERIC),
            query
        ),
        _ => format!("/{}", query),
    }
}


fn page_response(rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Page render failed: {:#}", e);
            let status = match e.downcast_ref::<BlogError>() {
                Some(BlogError::FetchFailed(_)) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, "Could not render page").into_response()
        }
    }
}

/// Fallback handler that serves generated files
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
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
