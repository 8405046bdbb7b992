use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::db::enums::CampaignStatus;
use crate::db::models::api::error_codes;
use crate::db::models::campaign::Campaign;
use crate::db::store::{AllocationStore, CampaignStore};
use crate::error::{AppError, AppResult};

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct UserAllocation {
    pub user_id: Uuid,
    pub daily_quota: i32,
    pub already_generated: i32,
    pub remaining: i32,
    pub slots: i32,
}

/// How many new leads each active assignee may receive for one campaign on one day.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AllocationPlan {
    pub campaign_id: Uuid,
    pub date: NaiveDate,
    pub daily_lead_quota: i32,
    pub already_generated: i32,
    pub campaign_remaining: i32,
    pub users: Vec<UserAllocation>,
}

impl AllocationPlan {
    /// `(user_id, slots)` pairs with at least one slot, in assignment order.
    pub fn slots(&self) -> Vec<(Uuid, i32)> {
        self.users
            .iter()
            .filter(|u| u.slots > 0)
            .map(|u| (u.user_id, u.slots))
            .collect()
    }

    pub fn total_slots(&self) -> i32 {
        self.users.iter().map(|u| u.slots).sum()
    }

    pub fn has_eligible_assignees(&self) -> bool {
        self.users.iter().any(|u| u.remaining > 0)
    }
}

pub struct QuotaAllocator;

impl QuotaAllocator {
    /// Plans the next batch of slots for `campaign_id` on `date` from the current
    /// counters. Pure read; callers that act on the plan must hold the daily counter
    /// lock in the same unit of work.
    pub fn allocate<S>(store: &mut S, campaign_id: Uuid, date: NaiveDate) -> AppResult<AllocationPlan>
    where
        S: CampaignStore + AllocationStore,
    {
        let campaign = store.find_campaign(campaign_id)?.ok_or_else(|| {
            AppError::not_found_with_code("campaign", error_codes::CAMPAIGN_NOT_FOUND)
        })?;
        Self::ensure_generation_allowed(&campaign, date)?;

        let already_generated = store.generated_count(campaign_id, date)?;
        let per_user: HashMap<Uuid, i32> = store
            .user_counters(campaign_id, date)?
            .into_iter()
            .map(|c| (c.user_id, c.generated_count))
            .collect();
        let assignments = store.list_assignments(campaign_id, true)?;

        let campaign_remaining = (campaign.daily_lead_quota - already_generated).max(0);
        let mut users: Vec<UserAllocation> = assignments
            .iter()
            .map(|a| {
                let generated = per_user.get(&a.user_id).copied().unwrap_or(0);
                UserAllocation {
                    user_id: a.user_id,
                    daily_quota: a.daily_quota,
                    already_generated: generated,
                    remaining: (a.daily_quota - generated).max(0),
                    slots: 0,
                }
            })
            .collect();

        let capacities: Vec<i64> = users.iter().map(|u| i64::from(u.remaining)).collect();
        let slots = distribute(i64::from(campaign_remaining), &capacities);
        for (user, slot) in users.iter_mut().zip(slots) {
            // bounded by the user's remaining quota, which is an i32
            user.slots = slot as i32;
        }

        Ok(AllocationPlan {
            campaign_id,
            date,
            daily_lead_quota: campaign.daily_lead_quota,
            already_generated,
            campaign_remaining,
            users,
        })
    }

    /// Generation needs an active campaign and a date inside its window.
    pub fn ensure_generation_allowed(campaign: &Campaign, date: NaiveDate) -> AppResult<()> {
        if campaign.status != CampaignStatus::Active {
            return Err(AppError::conflict_with_code(
                format!("Campaign is {}", campaign.status.as_str()),
                Some("campaign_id".to_string()),
                error_codes::CAMPAIGN_NOT_ACTIVE,
            ));
        }
        if !campaign.covers(date) {
            return Err(AppError::conflict_with_code(
                format!(
                    "Date {} is outside the campaign window {} to {}",
                    date, campaign.start_date, campaign.end_date
                ),
                Some("date".to_string()),
                error_codes::CAMPAIGN_NOT_ACTIVE,
            ));
        }
        Ok(())
    }
}

/// Splits `campaign_remaining` slots across users in proportion to their remaining
/// capacity, never exceeding any capacity. Slots lost to rounding go round-robin to
/// users still under their cap, largest fractional share first.
///
/// The result sums to `min(campaign_remaining, sum(capacities))`.
pub fn distribute(campaign_remaining: i64, capacities: &[i64]) -> Vec<i64> {
    let caps: Vec<i64> = capacities.iter().map(|c| (*c).max(0)).collect();
    let mut slots = vec![0i64; caps.len()];
    if campaign_remaining <= 0 {
        return slots;
    }

    let total_capacity: i64 = caps.iter().sum();
    if total_capacity == 0 {
        return slots;
    }
    if total_capacity <= campaign_remaining {
        return caps;
    }

    let mut order: Vec<(i64, usize)> = Vec::with_capacity(caps.len());
    for (i, cap) in caps.iter().enumerate() {
        let share = campaign_remaining * cap;
        slots[i] = share / total_capacity;
        order.push((share % total_capacity, i));
    }
    order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut leftover = campaign_remaining - slots.iter().sum::<i64>();
    while leftover > 0 {
        let mut progressed = false;
        for &(_, i) in &order {
            if leftover == 0 {
                break;
            }
            if slots[i] < caps[i] {
                slots[i] += 1;
                leftover -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    slots
}
