use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::activity::{self, ActivityEvent, ActivityKind};
use crate::db::enums::CampaignStatus;
use crate::db::models::api::{ActionResponse, ApiResponse, ResponseMeta};
use crate::db::models::campaign::Campaign;
use crate::db::models::user::AuthUser;
use crate::routes::with_store;
use crate::services::campaigns_service::CampaignsService;
use crate::services::context::RequestContext;
use crate::validation::ValidatedJson;

#[derive(Deserialize)]
pub struct CampaignListQuery {
    pub status: Option<CampaignStatus>,
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub status: CampaignStatus,
}

#[derive(Deserialize, Validate)]
pub struct AssignUserRequest {
    pub user_id: Uuid,
    #[validate(range(min = 0, max = 10000))]
    pub daily_quota: i32,
}

#[derive(Deserialize)]
pub struct AllocationQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
struct CampaignBody {
    campaign: Campaign,
    changed: bool,
}

pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CampaignListQuery>,
    _user: AuthUser,
) -> impl IntoResponse {
    match with_store(&state, move |store| CampaignsService::list(store, params.status)).await {
        Ok(campaigns) => {
            let meta = ResponseMeta {
                total_count: Some(campaigns.len() as i64),
                ..Default::default()
            };
            let response =
                ApiResponse::success_with_meta(campaigns, "Campaigns retrieved successfully", meta);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    _user: AuthUser,
) -> impl IntoResponse {
    match with_store(&state, move |store| CampaignsService::get(store, campaign_id)).await {
        Ok(campaign) => {
            let response = ApiResponse::success(campaign, "Campaign retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn change_campaign_status(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    user: AuthUser,
    Json(payload): Json<ChangeStatusRequest>,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    let actor = ctx.user_id;
    let status = payload.status;

    match with_store(&state, move |store| {
        CampaignsService::change_status(store, &ctx, campaign_id, status)
    })
    .await
    {
        Ok((campaign, changed)) => {
            if changed {
                activity::publish(
                    &state.activity,
                    ActivityEvent::new(ActivityKind::CampaignStatusChanged, Some(actor))
                        .campaign(campaign_id)
                        .details(serde_json::json!({ "status": status })),
                );
            }
            let message = format!("Campaign is {}", campaign.status.as_str());
            let body = CampaignBody { campaign, changed };
            (StatusCode::OK, Json(ActionResponse::new(true, message, body))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    _user: AuthUser,
) -> impl IntoResponse {
    match with_store(&state, move |store| {
        CampaignsService::list_assignments(store, campaign_id)
    })
    .await
    {
        Ok(assignments) => {
            let response = ApiResponse::success(assignments, "Assignments retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn assign_user(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<AssignUserRequest>,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    let actor = ctx.user_id;

    match with_store(&state, move |store| {
        CampaignsService::assign_user(store, &ctx, campaign_id, payload.user_id, payload.daily_quota)
    })
    .await
    {
        Ok(assignment) => {
            activity::publish(
                &state.activity,
                ActivityEvent::new(ActivityKind::AssignmentChanged, Some(actor))
                    .campaign(campaign_id)
                    .details(serde_json::json!({
                        "user_id": assignment.user_id,
                        "status": assignment.status,
                        "daily_quota": assignment.daily_quota,
                    })),
            );
            let response = ApiResponse::success(assignment, "Assignment saved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn deactivate_assignment(
    State(state): State<Arc<AppState>>,
    Path((campaign_id, user_id)): Path<(Uuid, Uuid)>,
    user: AuthUser,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    let actor = ctx.user_id;

    match with_store(&state, move |store| {
        CampaignsService::deactivate_assignment(store, &ctx, campaign_id, user_id)
    })
    .await
    {
        Ok(assignment) => {
            activity::publish(
                &state.activity,
                ActivityEvent::new(ActivityKind::AssignmentChanged, Some(actor))
                    .campaign(campaign_id)
                    .details(serde_json::json!({
                        "user_id": user_id,
                        "status": assignment.status,
                    })),
            );
            let response = ApiResponse::success(assignment, "Assignment deactivated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn allocation_preview(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    Query(params): Query<AllocationQuery>,
    user: AuthUser,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    let date = params.date.unwrap_or_else(|| state.engine.today());

    match with_store(&state, move |store| {
        CampaignsService::allocation_preview(store, &ctx, campaign_id, date)
    })
    .await
    {
        Ok(plan) => {
            let response = ApiResponse::success(plan, "Allocation computed successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
