use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::AppState;
use crate::db::models::api::{ApiResponse, ResponseMeta};

pub async fn list_lead_sources(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sources = state.lead_sources.all().to_vec();
    let meta = ResponseMeta {
        total_count: Some(sources.len() as i64),
        ..Default::default()
    };
    let response =
        ApiResponse::success_with_meta(sources, "Lead sources retrieved successfully", meta);
    (StatusCode::OK, Json(response)).into_response()
}
