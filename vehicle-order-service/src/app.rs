use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use common_http_errors::{ApiError, ApiResult};

use crate::catalog::{catalog, Catalog};
use crate::order::OrderInput;
use crate::pipeline::{OrderPipeline, SubmitOutcome};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<OrderPipeline>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub status: String,
    pub order_id: String,
}

pub async fn health() -> &'static str { "ok" }

async fn get_catalog() -> Json<Catalog> { Json(catalog()) }

pub async fn submit_order(
    State(state): State<AppState>,
    Json(input): Json<OrderInput>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let outcome = state.pipeline.submit(&input).await;
    let status = outcome.status_message();
    match outcome {
        SubmitOutcome::Accepted { order_id, .. } => Ok((StatusCode::ACCEPTED, Json(SubmitResponse { status, order_id }))),
        SubmitOutcome::Invalid(_) => Err(ApiError::BadRequest { code: "validation_failed", message: Some(status) }),
        SubmitOutcome::PublishFailed { .. } => Err(ApiError::BadGateway { code: "publish_failed", message: Some(status) }),
        SubmitOutcome::Busy => Err(ApiError::Conflict { code: "submission_in_flight", message: Some(status) }),
    }
}

async fn metrics(State(state): State<AppState>) -> ApiResult<String> {
    state.pipeline.metrics().render().map_err(ApiError::internal)
}

pub fn build_router(state: AppState) -> Router {
    let allowed_origins = [
        "http://localhost:3000",
        "http://localhost:3001",
        "http://localhost:5173",
    ];
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()).collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(health))
        .route("/catalog", get(get_catalog))
        .route("/orders", post(submit_order))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(cors)
}
