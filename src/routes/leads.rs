use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::activity::{self, ActivityEvent, ActivityKind};
use crate::db::enums::{FollowUpStatus, SaleStatus};
use crate::db::models::api::{ActionResponse, ApiResponse, ResponseMeta};
use crate::db::models::lead::Lead;
use crate::db::models::user::AuthUser;
use crate::error::{AppError, AppResult};
use crate::routes::with_store;
use crate::services::context::RequestContext;
use crate::services::export_service::{ExportFormat, ExportService};
use crate::services::lead_generator::{GeneratedAssignment, LeadGenerator};
use crate::services::lead_workflow::{ApprovalAction, LeadWorkflow};
use crate::validation::{OptionalValidatedJson, ValidatedJson};

/// `date` is `YYYY-MM-DD`; omitted means the business "today".
#[derive(Deserialize, Validate, Default, Debug)]
pub struct GenerateLeadsRequest {
    pub date: Option<String>,
}

impl GenerateLeadsRequest {
    pub fn resolve_date(&self, today: NaiveDate) -> AppResult<NaiveDate> {
        match self.date.as_deref() {
            None => Ok(today),
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                AppError::invalid_field(
                    "date",
                    "INVALID_DATE",
                    format!("'{}' is not a valid YYYY-MM-DD date", raw),
                )
            }),
        }
    }
}

#[derive(Serialize)]
struct GenerateLeadsBody {
    count: i32,
    date: NaiveDate,
    campaign_remaining: i32,
    assignments: Vec<GeneratedAssignment>,
}

#[derive(Deserialize, Validate)]
pub struct ApproveLeadRequest {
    pub approved: bool,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct BulkApproveRequest {
    #[validate(length(min = 1))]
    pub lead_ids: Vec<Uuid>,
    pub approved: bool,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct RevokeApprovalRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct ReassignLeadRequest {
    pub user_id: Uuid,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Disposition fields an agent may edit. A blank string clears the field.
#[derive(Deserialize, Validate, Default, Clone, Debug)]
pub struct UpdateLeadRequest {
    #[validate(length(max = 255))]
    pub customer_name: Option<String>,
    #[validate(length(max = 32))]
    pub contact_number: Option<String>,
    #[validate(length(max = 32))]
    pub whatsapp_number: Option<String>,
    #[validate(length(max = 64))]
    pub lead_source: Option<String>,
    pub sale_status: Option<SaleStatus>,
    pub follow_up_status: Option<FollowUpStatus>,
    pub reason_not_closed: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
struct LeadBody {
    lead: Lead,
}

#[derive(Serialize)]
struct UpdatedLeadBody {
    lead: Lead,
    approval_reset: bool,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Deserialize)]
pub struct PendingApprovalQuery {
    pub campaign_id: Option<Uuid>,
}

pub async fn generate_daily_leads(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    user: AuthUser,
    OptionalValidatedJson(payload): OptionalValidatedJson<GenerateLeadsRequest>,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    if let Err(err) = ctx.require_admin() {
        return err.into_response();
    }
    let date = match payload.resolve_date(state.engine.today()) {
        Ok(date) => date,
        Err(err) => return err.into_response(),
    };

    let actor = ctx.user_id;
    match with_store(&state, move |store| {
        LeadGenerator::generate_daily_leads(store, campaign_id, date, Some(actor))
    })
    .await
    {
        Ok(result) => {
            if result.created_count > 0 {
                activity::publish(
                    &state.activity,
                    ActivityEvent::new(ActivityKind::LeadsGenerated, Some(actor))
                        .campaign(campaign_id)
                        .details(serde_json::json!({
                            "date": result.date,
                            "count": result.created_count,
                        })),
                );
            }
            let message = match result.created_count {
                0 => "No lead slots left for this date".to_string(),
                n => format!("Generated {} leads", n),
            };
            let body = GenerateLeadsBody {
                count: result.created_count,
                date: result.date,
                campaign_remaining: result.campaign_remaining,
                assignments: result.assignments,
            };
            (StatusCode::OK, Json(ActionResponse::new(true, message, body))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    user: AuthUser,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    match with_store(&state, move |store| LeadWorkflow::get_lead(store, &ctx, lead_id)).await {
        Ok(lead) => {
            let response = ApiResponse::success(lead, "Lead retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateLeadRequest>,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    let registry = state.lead_sources.clone();
    let actor = ctx.user_id;

    match with_store(&state, move |store| {
        LeadWorkflow::update_lead(store, &ctx, &registry, lead_id, &payload)
    })
    .await
    {
        Ok(outcome) => {
            activity::publish(
                &state.activity,
                ActivityEvent::new(ActivityKind::LeadUpdated, Some(actor))
                    .campaign(outcome.lead.campaign_id)
                    .lead(lead_id)
                    .details(serde_json::json!({
                        "sale_status": outcome.lead.sale_status,
                        "approval_reset": outcome.approval_reset,
                    })),
            );
            let message = if outcome.approval_reset {
                "Lead updated, admin approval cleared"
            } else {
                "Lead updated"
            };
            let body = UpdatedLeadBody {
                lead: outcome.lead,
                approval_reset: outcome.approval_reset,
            };
            (StatusCode::OK, Json(ActionResponse::new(true, message, body))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn admin_approve_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ApproveLeadRequest>,
) -> impl IntoResponse {
    let action = ApprovalAction::from_flag(payload.approved);
    review_lead(state, user, lead_id, action, payload.notes).await
}

pub async fn revoke_approval(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    user: AuthUser,
    OptionalValidatedJson(payload): OptionalValidatedJson<RevokeApprovalRequest>,
) -> impl IntoResponse {
    review_lead(state, user, lead_id, ApprovalAction::Revoke, payload.notes).await
}

async fn review_lead(
    state: Arc<AppState>,
    user: AuthUser,
    lead_id: Uuid,
    action: ApprovalAction,
    notes: Option<String>,
) -> axum::response::Response {
    let ctx = RequestContext::from(&user);
    let actor = ctx.user_id;

    match with_store(&state, move |store| {
        LeadWorkflow::decide(store, &ctx, lead_id, action, notes.as_deref())
    })
    .await
    {
        Ok(outcome) => {
            if outcome.changed {
                let kind = match action {
                    ApprovalAction::Approve => ActivityKind::LeadApproved,
                    ApprovalAction::Reject => ActivityKind::LeadRejected,
                    ApprovalAction::Revoke => ActivityKind::LeadApprovalRevoked,
                };
                activity::publish(
                    &state.activity,
                    ActivityEvent::new(kind, Some(actor))
                        .campaign(outcome.lead.campaign_id)
                        .lead(lead_id),
                );
            }
            let message = outcome.message();
            let body = LeadBody { lead: outcome.lead };
            (StatusCode::OK, Json(ActionResponse::new(true, message, body))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn bulk_approve_leads(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<BulkApproveRequest>,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    let actor = ctx.user_id;
    let max_batch = state.engine.bulk_approval_max_batch;
    let action = ApprovalAction::from_flag(payload.approved);

    match with_store(&state, move |store| {
        LeadWorkflow::bulk_decide(
            store,
            &ctx,
            &payload.lead_ids,
            action,
            payload.notes.as_deref(),
            max_batch,
        )
    })
    .await
    {
        Ok(result) => {
            activity::publish(
                &state.activity,
                ActivityEvent::new(ActivityKind::BulkApproval, Some(actor)).details(
                    serde_json::json!({
                        "action": result.action,
                        "succeeded": result.succeeded,
                        "failed": result.failed,
                    }),
                ),
            );
            let success = result.all_succeeded();
            let message = result.message();
            (StatusCode::OK, Json(ActionResponse::new(success, message, result))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn reassign_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ReassignLeadRequest>,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    let actor = ctx.user_id;
    let target = payload.user_id;

    match with_store(&state, move |store| {
        LeadWorkflow::reassign(store, &ctx, lead_id, target, payload.notes.as_deref())
    })
    .await
    {
        Ok((lead, previous)) => {
            if previous != target {
                activity::publish(
                    &state.activity,
                    ActivityEvent::new(ActivityKind::LeadReassigned, Some(actor))
                        .campaign(lead.campaign_id)
                        .lead(lead_id)
                        .details(serde_json::json!({ "from": previous, "to": target })),
                );
            }
            let message = format!("Lead {} assigned to {}", lead.lead_number, target);
            (StatusCode::OK, Json(ActionResponse::new(true, message, LeadBody { lead }))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn pending_approval(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PendingApprovalQuery>,
    user: AuthUser,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    match with_store(&state, move |store| {
        LeadWorkflow::pending_approval(store, &ctx, params.campaign_id)
    })
    .await
    {
        Ok(leads) => {
            let meta = ResponseMeta {
                total_count: Some(leads.len() as i64),
                ..Default::default()
            };
            let response =
                ApiResponse::success_with_meta(leads, "Pending approvals retrieved successfully", meta);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn export_leads(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    Query(params): Query<ExportQuery>,
    user: AuthUser,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&user);
    let max_days = state.engine.export_max_days;
    let (start_date, end_date) = (params.start_date, params.end_date);

    let rows = match with_store(&state, move |store| {
        ExportService::export_leads(store, &ctx, campaign_id, start_date, end_date, max_days)
    })
    .await
    {
        Ok(rows) => rows,
        Err(err) => return err.into_response(),
    };

    match params.format {
        ExportFormat::Json => {
            let meta = ResponseMeta {
                total_count: Some(rows.len() as i64),
                ..Default::default()
            };
            let response = ApiResponse::success_with_meta(rows, "Leads exported successfully", meta);
            (StatusCode::OK, Json(response)).into_response()
        }
        ExportFormat::Csv => match ExportService::to_csv(&rows) {
            Ok(csv) => {
                let filename = format!(
                    "attachment; filename=\"leads-{}-{}-{}.csv\"",
                    campaign_id, start_date, end_date
                );
                (
                    StatusCode::OK,
                    [
                        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                        (header::CONTENT_DISPOSITION, filename),
                    ],
                    csv,
                )
                    .into_response()
            }
            Err(err) => err.into_response(),
        },
    }
}
