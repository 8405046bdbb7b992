use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use crate::db::enums::CampaignStatus;
use crate::db::models::api::ApiResponse;
use crate::db::models::user::AuthUser;
use crate::routes::with_store;
use crate::services::context::RequestContext;
use crate::services::kpi_service::{KpiQuery, KpiService};

#[derive(Deserialize)]
pub struct CampaignCardsQuery {
    pub status: Option<CampaignStatus>,
}

pub async fn get_kpis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KpiQuery>,
    user: AuthUser,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    match with_store(&state, move |store| KpiService::compute(store, &ctx, &query)).await {
        Ok(summary) => {
            let response = ApiResponse::success(summary, "KPIs computed successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn team_performance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KpiQuery>,
    user: AuthUser,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    match with_store(&state, move |store| {
        KpiService::team_performance(store, &ctx, &query)
    })
    .await
    {
        Ok(rows) => {
            let response = ApiResponse::success(rows, "Team performance computed successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn campaign_cards(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CampaignCardsQuery>,
    user: AuthUser,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    match with_store(&state, move |store| {
        KpiService::campaign_cards(store, &ctx, params.status)
    })
    .await
    {
        Ok(cards) => {
            let response = ApiResponse::success(cards, "Campaign KPIs computed successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
