//! Migration control endpoints.
//!
//! Every endpoint answers `{code, msg, data?}`: code 0 on success, 400 for
//! benign no-ops (already running, not running), 5 for server faults.


use std::time::Duration;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use switchover_core::ControlOutcome;
use switchover_types::{ApiResponse, StartBatchRequest, StartIncrRequest};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/src_only", post(src_only))
        .route("/src_first", post(src_first))
        .route("/dst_first", post(dst_first))
        .route("/dst_only", post(dst_only))
        .route("/full/start", post(start_full))
        .route("/full/stop", post(stop_full))
        .route("/full/batch/start", post(start_full_batch))
        .route("/full/batch/stop", post(stop_full_batch))
        .route("/incr/start", post(start_incr))
        .route("/incr/stop", post(stop_incr))
        .route("/status", get(status))
}

fn respond(outcome: ControlOutcome, done: &str, benign: &str) -> Json<ApiResponse> {
    Json(match outcome {
        ControlOutcome::Ok => ApiResponse::ok(done),
        ControlOutcome::AlreadyRunning | ControlOutcome::NotRunning => ApiResponse::benign(benign),
    })
}

async fn src_only(State(state): State<AppState>) -> Json<ApiResponse> {
    state.scheduler().src_only().await;
    Json(ApiResponse::ok("OK"))
}

async fn src_first(State(state): State<AppState>) -> Json<ApiResponse> {
    state.scheduler().src_first().await;
    Json(ApiResponse::ok("OK"))
}

async fn dst_first(State(state): State<AppState>) -> Json<ApiResponse> {
    state.scheduler().dst_first().await;
    Json(ApiResponse::ok("OK"))
}

async fn dst_only(State(state): State<AppState>) -> Json<ApiResponse> {
    state.scheduler().dst_only().await;
    Json(ApiResponse::ok("OK"))
}

async fn start_full(State(state): State<AppState>) -> Json<ApiResponse> {
    respond(
        state.scheduler().start_full_validation().await,
        "full validation started",
        "full validation already running",
    )
}

async fn stop_full(State(state): State<AppState>) -> Json<ApiResponse> {
    respond(
        state.scheduler().stop_full_validation().await,
        "full validation stopped",
        "full validation not running",
    )
}

async fn start_full_batch(
    State(state): State<AppState>,
    Json(req): Json<StartBatchRequest>,
) -> Json<ApiResponse> {
    respond(
        state.scheduler().start_full_validation_batch(req.limit).await,
        "batched full validation started",
        "full validation already running",
    )
}

async fn stop_full_batch(State(state): State<AppState>) -> Json<ApiResponse> {
    respond(
        state.scheduler().stop_full_validation_batch().await,
        "batched full validation stopped",
        "full validation not running",
    )
}

async fn start_incr(
    State(state): State<AppState>,
    Json(req): Json<StartIncrRequest>,
) -> Json<ApiResponse> {
    let interval = Duration::from_millis(req.interval.max(0) as u64);
    respond(
        state.scheduler().start_incremental_validation(req.utime, interval).await,
        "incremental validation started",
        "incremental validation already running",
    )
}

async fn stop_incr(State(state): State<AppState>) -> Json<ApiResponse> {
    respond(
        state.scheduler().stop_incremental_validation().await,
        "incremental validation stopped",
        "incremental validation not running",
    )
}

async fn status(State(state): State<AppState>) -> Json<ApiResponse> {
    let status = state.scheduler().status().await;
    match serde_json::to_value(status) {
        Ok(data) => Json(ApiResponse::ok_with_data("OK", data)),
        Err(err) => Json(ApiResponse::system_error(format!("status unavailable: {err}"))),
    }
}
