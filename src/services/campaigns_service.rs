use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::enums::{AssignmentStatus, CampaignStatus};
use crate::db::models::api::error_codes;
use crate::db::models::campaign::{Campaign, CampaignAssignment, NewCampaignAssignment};
use crate::db::store::{AllocationStore, CampaignStore, Isolation, UnitOfWork, run_atomic};
use crate::error::{AppError, AppResult};
use crate::services::context::RequestContext;
use crate::services::quota_allocator::{AllocationPlan, QuotaAllocator};
use crate::validation::campaign::validate_daily_quota;

pub struct CampaignsService;

impl CampaignsService {
    pub fn get<S: CampaignStore>(store: &mut S, campaign_id: Uuid) -> AppResult<Campaign> {
        store.find_campaign(campaign_id)?.ok_or_else(campaign_not_found)
    }

    pub fn list<S: CampaignStore>(
        store: &mut S,
        status: Option<CampaignStatus>,
    ) -> AppResult<Vec<Campaign>> {
        store.list_campaigns(status)
    }

    /// Returns the campaign and whether its status actually changed.
    pub fn change_status<S: UnitOfWork + CampaignStore>(
        store: &mut S,
        ctx: &RequestContext,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> AppResult<(Campaign, bool)> {
        ctx.require_admin()?;

        let (campaign, changed) = run_atomic(store, Isolation::ReadCommitted, |s| {
            let campaign = s.find_campaign(campaign_id)?.ok_or_else(campaign_not_found)?;
            if campaign.status == status {
                return Ok((campaign, false));
            }
            if !campaign.status.can_transition_to(status) {
                return Err(AppError::conflict_with_code(
                    format!(
                        "Campaign cannot move from {} to {}",
                        campaign.status.as_str(),
                        status.as_str()
                    ),
                    Some("status".to_string()),
                    error_codes::INVALID_STATUS_TRANSITION,
                ));
            }
            Ok((s.update_campaign_status(campaign_id, status)?, true))
        })?;

        if changed {
            tracing::info!(
                campaign_id = %campaign_id,
                status = status.as_str(),
                admin_id = %ctx.user_id,
                "Campaign status changed"
            );
        }
        Ok((campaign, changed))
    }

    /// Attaches a user to a campaign, or reactivates and re-quotas an existing
    /// assignment.
    pub fn assign_user<S: UnitOfWork + CampaignStore>(
        store: &mut S,
        ctx: &RequestContext,
        campaign_id: Uuid,
        user_id: Uuid,
        daily_quota: i32,
    ) -> AppResult<CampaignAssignment> {
        ctx.require_admin()?;
        validate_daily_quota(daily_quota)?;

        let assignment = run_atomic(store, Isolation::ReadCommitted, |s| {
            let campaign = s.find_campaign(campaign_id)?.ok_or_else(campaign_not_found)?;
            if campaign.status.is_terminal() {
                return Err(AppError::conflict_with_code(
                    format!("Campaign is {}", campaign.status.as_str()),
                    Some("campaign_id".to_string()),
                    error_codes::CAMPAIGN_NOT_ACTIVE,
                ));
            }
            s.upsert_assignment(&NewCampaignAssignment {
                campaign_id,
                user_id,
                status: AssignmentStatus::Active,
                daily_quota,
            })
        })?;

        tracing::info!(
            campaign_id = %campaign_id,
            user_id = %user_id,
            daily_quota,
            "Campaign assignment saved"
        );
        Ok(assignment)
    }

    /// Assignments are deactivated, never deleted, so past leads keep their attribution.
    pub fn deactivate_assignment<S: UnitOfWork + CampaignStore>(
        store: &mut S,
        ctx: &RequestContext,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<CampaignAssignment> {
        ctx.require_admin()?;

        let assignment = run_atomic(store, Isolation::ReadCommitted, |s| {
            s.set_assignment_status(campaign_id, user_id, AssignmentStatus::Inactive)?
                .ok_or_else(|| {
                    AppError::not_found_with_code("assignment", error_codes::ASSIGNMENT_NOT_FOUND)
                })
        })?;

        tracing::info!(campaign_id = %campaign_id, user_id = %user_id, "Campaign assignment deactivated");
        Ok(assignment)
    }

    pub fn list_assignments<S: CampaignStore>(
        store: &mut S,
        campaign_id: Uuid,
    ) -> AppResult<Vec<CampaignAssignment>> {
        Self::get(store, campaign_id)?;
        store.list_assignments(campaign_id, false)
    }

    /// What a generation run would hand out right now. Writes nothing.
    pub fn allocation_preview<S: CampaignStore + AllocationStore>(
        store: &mut S,
        ctx: &RequestContext,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<AllocationPlan> {
        ctx.require_admin()?;
        QuotaAllocator::allocate(store, campaign_id, date)
    }
}

fn campaign_not_found() -> AppError {
    AppError::not_found_with_code("campaign", error_codes::CAMPAIGN_NOT_FOUND)
}
