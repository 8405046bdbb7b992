use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::db::enums::{FollowUpStatus, SaleStatus};
use crate::db::models::api::error_codes;
use crate::db::models::lead::NewLead;
use crate::db::store::{EngineStore, Isolation, LeadStore, run_atomic};
use crate::error::{AppError, AppResult};
use crate::services::quota_allocator::QuotaAllocator;

const LEAD_NUMBER_ATTEMPTS: usize = 5;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GeneratedAssignment {
    pub user_id: Uuid,
    pub count: i32,
    pub lead_numbers: Vec<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GenerationResult {
    pub campaign_id: Uuid,
    pub date: NaiveDate,
    pub created_count: i32,
    /// Campaign slots still open for the day after this run.
    pub campaign_remaining: i32,
    pub assignments: Vec<GeneratedAssignment>,
}

pub struct LeadGenerator;

impl LeadGenerator {
    /// Tops up today's leads for a campaign. The allocation read, the inserts and the
    /// counter bump share one serializable unit of work holding the (campaign, date)
    /// counter lock, so concurrent callers never book the same slot twice and a
    /// repeated call only fills whatever room is left.
    pub fn generate_daily_leads<S: EngineStore>(
        store: &mut S,
        campaign_id: Uuid,
        date: NaiveDate,
        actor: Option<Uuid>,
    ) -> AppResult<GenerationResult> {
        let result = run_atomic(store, Isolation::Serializable, |s| {
            Self::generate_in_unit(s, campaign_id, date, actor)
        })?;

        tracing::info!(
            campaign_id = %campaign_id,
            date = %date,
            created = result.created_count,
            campaign_remaining = result.campaign_remaining,
            "Daily lead generation finished"
        );
        Ok(result)
    }

    fn generate_in_unit<S: EngineStore>(
        s: &mut S,
        campaign_id: Uuid,
        date: NaiveDate,
        actor: Option<Uuid>,
    ) -> AppResult<GenerationResult> {
        let campaign = s.find_campaign(campaign_id)?.ok_or_else(|| {
            AppError::not_found_with_code("campaign", error_codes::CAMPAIGN_NOT_FOUND)
        })?;
        QuotaAllocator::ensure_generation_allowed(&campaign, date)?;

        let counter = s.lock_daily_counter(campaign_id, date)?;
        let plan = QuotaAllocator::allocate(s, campaign_id, date)?;

        if plan.campaign_remaining == 0 {
            tracing::debug!(campaign_id = %campaign_id, date = %date, "Campaign quota already consumed");
            return Ok(GenerationResult {
                campaign_id,
                date,
                created_count: 0,
                campaign_remaining: 0,
                assignments: Vec::new(),
            });
        }
        if !plan.has_eligible_assignees() {
            return Err(AppError::conflict_with_code(
                "No active assignee has quota left for this date",
                Some("campaign_id".to_string()),
                error_codes::NO_ELIGIBLE_ASSIGNEES,
            ));
        }

        let slots = plan.slots();
        let mut taken = HashSet::new();
        let mut seq = counter.generated_count;
        let mut new_leads = Vec::with_capacity(plan.total_slots().max(0) as usize);
        for (user_id, count) in &slots {
            for _ in 0..*count {
                seq += 1;
                let lead_number = mint_lead_number(s, campaign_id, date, seq, &taken)?;
                taken.insert(lead_number.clone());
                new_leads.push(NewLead {
                    lead_number,
                    campaign_id,
                    assigned_to: *user_id,
                    assigned_date: date,
                    sale_status: SaleStatus::Pending,
                    follow_up_status: FollowUpStatus::NotRequired,
                    admin_approved: false,
                    updated_by: actor,
                });
            }
        }

        let inserted = s.insert_leads(&new_leads)?;
        s.record_generated(campaign_id, date, &slots)?;

        let assignments = slots
            .iter()
            .map(|(user_id, count)| GeneratedAssignment {
                user_id: *user_id,
                count: *count,
                lead_numbers: inserted
                    .iter()
                    .filter(|l| l.assigned_to == *user_id)
                    .map(|l| l.lead_number.clone())
                    .collect(),
            })
            .collect();

        let created_count = inserted.len() as i32;
        Ok(GenerationResult {
            campaign_id,
            date,
            created_count,
            campaign_remaining: plan.campaign_remaining - created_count,
            assignments,
        })
    }
}

/// `L<6 hex of campaign id>-<yymmdd>-<seq>`, e.g. `L3FA9C1-261019-0007`.
pub fn format_lead_number(campaign_id: Uuid, date: NaiveDate, seq: i32) -> String {
    let hex = campaign_id.simple().to_string();
    format!(
        "L{}-{}-{:04}",
        hex[..6].to_uppercase(),
        date.format("%y%m%d"),
        seq
    )
}

fn mint_lead_number<S: LeadStore>(
    s: &mut S,
    campaign_id: Uuid,
    date: NaiveDate,
    seq: i32,
    taken: &HashSet<String>,
) -> AppResult<String> {
    let base = format_lead_number(campaign_id, date, seq);
    let mut candidate = base.clone();
    for _ in 0..LEAD_NUMBER_ATTEMPTS {
        if !taken.contains(&candidate) && !s.lead_number_exists(&candidate)? {
            return Ok(candidate);
        }
        tracing::warn!(lead_number = %candidate, "Lead number collision, adding a random suffix");
        let suffix = Uuid::new_v4().simple().to_string();
        candidate = format!("{}-{}", base, suffix[..4].to_uppercase());
    }
    Err(AppError::conflict_with_code(
        "Could not mint a unique lead number",
        None,
        error_codes::LEAD_NUMBER_EXHAUSTED,
    ))
}
