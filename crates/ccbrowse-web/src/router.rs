//! Web router using Axum

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ccbrowse_core::models::{FavoriteResponse, SessionId, SessionsResponse, TranscriptResponse};
use ccbrowse_core::preferences::DEFAULT_SESSION_LIMIT;
use ccbrowse_core::store::escape_html;
use ccbrowse_core::{LocalSessionStore, SessionSource};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::error::ApiError;

type AppState = Arc<LocalSessionStore>;

/// Create the web router
pub fn create_router(store: Arc<LocalSessionStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/sessions", get(sessions_handler))
        .route(
            "/api/sessions/{id}",
            get(session_detail_handler).delete(delete_handler),
        )
        .route("/api/sessions/{id}/html", get(session_html_handler))
        .route("/api/sessions/{id}/favorite", post(favorite_handler))
        .layer(cors)
        .with_state(store)
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

/// Server-rendered session index linking to each HTML view
async fn index_handler(State(store): State<AppState>) -> Result<Html<String>, ApiError> {
    let sessions = store.list_sessions(DEFAULT_SESSION_LIMIT).await?;

    let mut html = String::from(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><title>ccbrowse</title></head><body><h1>Sessions</h1><ul>",
    );
    for session in &sessions {
        html.push_str(&format!(
            "<li><a href=\"/api/sessions/{}/html\">{}</a> <small>{}</small></li>",
            escape_html(session.id.as_str()),
            escape_html(session.title()),
            escape_html(&session.project)
        ));
    }
    html.push_str("</ul></body></html>");
    Ok(Html(html))
}

async fn health_handler(State(store): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "projectsDir": store.projects_dir().display().to_string(),
    }))
}

async fn sessions_handler(
    State(store): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_SESSION_LIMIT);
    let sessions = store.list_sessions(limit).await?;
    debug!(count = sessions.len(), limit, "Serving session list");
    Ok(Json(SessionsResponse { sessions }))
}

async fn session_detail_handler(
    State(store): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let transcript = store.transcript(&SessionId::new(id)).await?;
    Ok(Json(transcript))
}

async fn session_html_handler(State(store): State<AppState>, Path(id): Path<String>) -> Response {
    match store.session_html(&SessionId::new(id)).await {
        Ok(html) => Html(html).into_response(),
        Err(e) if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            Html("<html><body>Session not found</body></html>".to_string()),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<html><body>Error: {}</body></html>",
                escape_html(&e.to_string())
            )),
        )
            .into_response(),
    }
}

async fn delete_handler(
    State(store): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    store.delete_session(&SessionId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn favorite_handler(
    State(store): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let is_favorite = store.toggle_favorite(&SessionId::new(id)).await?;
    Ok(Json(FavoriteResponse { is_favorite }))
}
