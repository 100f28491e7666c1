// src/api.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::pipeline::Pipeline;
use crate::status::{validate_search_id, SearchState, StatusStore};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    fn store(&self) -> &Arc<dyn StatusStore> {
        self.pipeline.store()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/searches", post(start_search))
        .route("/searches/{id}", get(search_status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct StartReq {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StartResp {
    id: String,
    status: SearchState,
}

#[derive(Debug, Serialize)]
struct ErrorResp {
    error: String,
}

fn error(code: StatusCode, msg: impl Into<String>) -> Response {
    (code, Json(ErrorResp { error: msg.into() })).into_response()
}

/// `search-<unix millis>-<n>`; unique within the process.
fn generate_id() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let n = SEQ.fetch_add(1, Ordering::Relaxed);
    format!("search-{}-{n}", Utc::now().timestamp_millis())
}

async fn start_search(State(state): State<AppState>, Json(body): Json<StartReq>) -> Response {
    let id = body.id.unwrap_or_else(generate_id);
    if let Err(e) = validate_search_id(&id) {
        return error(StatusCode::BAD_REQUEST, e.to_string());
    }

    match state.store().create_if_absent(&id, &body.keywords).await {
        Ok(true) => {}
        Ok(false) => return error(StatusCode::CONFLICT, format!("search {id} already exists")),
        Err(e) => {
            tracing::warn!(search_id = %id, error = ?e, "creating status record failed");
            return error(StatusCode::INTERNAL_SERVER_ERROR, "status store unavailable");
        }
    }

    let pipeline = state.pipeline.clone();
    let run_id = id.clone();
    tokio::spawn(async move {
        // failures already land in the status record
        if let Err(e) = pipeline.run(&run_id, body.keywords.as_slice()).await {
            tracing::debug!(search_id = %run_id, error = ?e, "background search ended with error");
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(StartResp {
            id,
            status: SearchState::Initializing,
        }),
    )
        .into_response()
}

async fn search_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if validate_search_id(&id).is_err() {
        return error(StatusCode::NOT_FOUND, format!("no search {id}"));
    }
    match state.store().get(&id).await {
        Ok(Some(status)) => Json(status).into_response(),
        Ok(None) => error(StatusCode::NOT_FOUND, format!("no search {id}")),
        Err(e) => {
            tracing::warn!(search_id = %id, error = ?e, "reading status record failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, "status store unavailable")
        }
    }
}
