use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use engine::{MatchMode, SearchEngine, SearchHit, SearchOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    10
}

#[derive(Deserialize)]
pub struct DocParams {
    pub id: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub search_timeout: Duration,
}

/// Load the engine once and wire the routes. A missing index artifact fails
/// startup rather than serving from partial indices.
pub fn build_app<P, Q>(
    index_dir: P,
    products_path: Q,
    mode: MatchMode,
    search_timeout: Duration,
) -> Result<Router>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let engine = SearchEngine::load(index_dir, products_path, mode)?;
    let state = AppState {
        engine: Arc::new(engine),
        search_timeout,
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc", get(doc_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let engine = state.engine.clone();
    let query = params.q.clone();
    // Ranking is CPU-bound; run it off the async executor under a deadline.
    let task =
        tokio::task::spawn_blocking(move || engine.search_with(&query, &SearchOptions::default()));
    let hits = match tokio::time::timeout(state.search_timeout, task).await {
        Ok(Ok(hits)) => hits,
        Ok(Err(_)) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "search task failed".into(),
            ))
        }
        Err(_) => {
            return Err((
                StatusCode::GATEWAY_TIMEOUT,
                "search deadline exceeded".into(),
            ))
        }
    };

    let total_hits = hits.len();
    let k = params.k.clamp(1, 100);
    let results: Vec<SearchHit> = hits.into_iter().take(k).collect();
    let took_s = start.elapsed().as_secs_f64();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s,
        total_hits,
        results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Query(params): Query<DocParams>,
) -> Json<serde_json::Value> {
    match state.engine.product(&params.id) {
        Some(product) => Json(serde_json::json!(product)),
        None => Json(serde_json::json!({ "error": "not found" })),
    }
}
