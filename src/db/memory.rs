//! In-memory [`EngineStore`](crate::db::store::EngineStore) for tests and local tooling.
//!
//! Units of work snapshot the whole state and restore it on error, which gives the
//! same all-or-nothing behavior as a database transaction for a single caller. It is
//! not shared between threads; concurrency is exercised against Postgres.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::enums::{AssignmentStatus, CampaignStatus};
use crate::db::models::allocation::{DailyAllocationCounter, UserAllocationCounter};
use crate::db::models::campaign::{Campaign, CampaignAssignment, NewCampaign, NewCampaignAssignment};
use crate::db::models::lead::{Lead, LeadChangeset, LeadFilter, NewLead};
use crate::db::store::{AllocationStore, CampaignStore, Isolation, LeadStore, UnitOfWork};
use crate::error::{AppError, AppResult};

#[derive(Default, Clone)]
struct MemoryState {
    campaigns: Vec<Campaign>,
    assignments: Vec<CampaignAssignment>,
    leads: Vec<Lead>,
    daily_counters: HashMap<(Uuid, NaiveDate), DailyAllocationCounter>,
    user_counters: HashMap<(Uuid, NaiveDate, Uuid), UserAllocationCounter>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: MemoryState,
    pending_conflicts: u32,
    units_started: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_campaign(&mut self, new_campaign: NewCampaign) -> Campaign {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: new_campaign.name,
            description: new_campaign.description,
            start_date: new_campaign.start_date,
            end_date: new_campaign.end_date,
            status: new_campaign.status,
            daily_lead_quota: new_campaign.daily_lead_quota,
            created_by: new_campaign.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state.campaigns.push(campaign.clone());
        campaign
    }

    pub fn leads(&self) -> &[Lead] {
        &self.state.leads
    }

    /// The next `count` units of work fail with a serialization conflict after running.
    pub fn inject_serialization_conflicts(&mut self, count: u32) {
        self.pending_conflicts = count;
    }

    /// Number of units of work opened so far, retries included.
    pub fn units_started(&self) -> u32 {
        self.units_started
    }

    fn serialization_failure() -> AppError {
        AppError::Database(DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access due to concurrent update".to_string()),
        ))
    }
}

impl UnitOfWork for MemoryStore {
    fn atomically<T, F>(&mut self, _isolation: Isolation, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Self) -> AppResult<T>,
    {
        self.units_started += 1;
        let snapshot = self.state.clone();
        let result = f(self);

        if self.pending_conflicts > 0 {
            self.pending_conflicts -= 1;
            self.state = snapshot;
            return Err(Self::serialization_failure());
        }
        if result.is_err() {
            self.state = snapshot;
        }
        result
    }
}

impl CampaignStore for MemoryStore {
    fn find_campaign(&mut self, campaign_id: Uuid) -> AppResult<Option<Campaign>> {
        Ok(self
            .state
            .campaigns
            .iter()
            .find(|c| c.id == campaign_id)
            .cloned())
    }

    fn list_campaigns(&mut self, status: Option<CampaignStatus>) -> AppResult<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .state
            .campaigns
            .iter()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(campaigns)
    }

    fn update_campaign_status(
        &mut self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> AppResult<Campaign> {
        let campaign = self
            .state
            .campaigns
            .iter_mut()
            .find(|c| c.id == campaign_id)
            .ok_or(AppError::Database(DieselError::NotFound))?;
        campaign.status = status;
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    fn list_assignments(
        &mut self,
        campaign_id: Uuid,
        only_active: bool,
    ) -> AppResult<Vec<CampaignAssignment>> {
        Ok(self
            .state
            .assignments
            .iter()
            .filter(|a| a.campaign_id == campaign_id && (!only_active || a.is_active()))
            .cloned()
            .collect())
    }

    fn find_assignment(
        &mut self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<CampaignAssignment>> {
        Ok(self
            .state
            .assignments
            .iter()
            .find(|a| a.campaign_id == campaign_id && a.user_id == user_id)
            .cloned())
    }

    fn upsert_assignment(
        &mut self,
        assignment: &NewCampaignAssignment,
    ) -> AppResult<CampaignAssignment> {
        let now = Utc::now();
        if let Some(existing) = self
            .state
            .assignments
            .iter_mut()
            .find(|a| a.campaign_id == assignment.campaign_id && a.user_id == assignment.user_id)
        {
            existing.status = assignment.status;
            existing.daily_quota = assignment.daily_quota;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let created = CampaignAssignment {
            id: Uuid::new_v4(),
            campaign_id: assignment.campaign_id,
            user_id: assignment.user_id,
            status: assignment.status,
            daily_quota: assignment.daily_quota,
            created_at: now,
            updated_at: now,
        };
        self.state.assignments.push(created.clone());
        Ok(created)
    }

    fn set_assignment_status(
        &mut self,
        campaign_id: Uuid,
        user_id: Uuid,
        status: AssignmentStatus,
    ) -> AppResult<Option<CampaignAssignment>> {
        Ok(self
            .state
            .assignments
            .iter_mut()
            .find(|a| a.campaign_id == campaign_id && a.user_id == user_id)
            .map(|a| {
                a.status = status;
                a.updated_at = Utc::now();
                a.clone()
            }))
    }
}

impl AllocationStore for MemoryStore {
    fn generated_count(&mut self, campaign_id: Uuid, date: NaiveDate) -> AppResult<i32> {
        Ok(self
            .state
            .daily_counters
            .get(&(campaign_id, date))
            .map(|c| c.generated_count)
            .unwrap_or(0))
    }

    fn lock_daily_counter(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<DailyAllocationCounter> {
        Ok(self
            .state
            .daily_counters
            .entry((campaign_id, date))
            .or_insert_with(|| DailyAllocationCounter {
                campaign_id,
                allocation_date: date,
                generated_count: 0,
                updated_at: Utc::now(),
            })
            .clone())
    }

    fn user_counters(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<UserAllocationCounter>> {
        Ok(self
            .state
            .user_counters
            .values()
            .filter(|c| c.campaign_id == campaign_id && c.allocation_date == date)
            .cloned()
            .collect())
    }

    fn record_generated(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
        per_user: &[(Uuid, i32)],
    ) -> AppResult<()> {
        let now = Utc::now();
        let total: i32 = per_user.iter().map(|(_, n)| n).sum();
        let daily = self
            .state
            .daily_counters
            .get_mut(&(campaign_id, date))
            .ok_or(AppError::Database(DieselError::NotFound))?;
        daily.generated_count += total;
        daily.updated_at = now;

        for (user_id, count) in per_user {
            let counter = self
                .state
                .user_counters
                .entry((campaign_id, date, *user_id))
                .or_insert_with(|| UserAllocationCounter {
                    campaign_id,
                    allocation_date: date,
                    user_id: *user_id,
                    generated_count: 0,
                    updated_at: now,
                });
            counter.generated_count += count;
            counter.updated_at = now;
        }
        Ok(())
    }
}

impl LeadStore for MemoryStore {
    fn find_lead(&mut self, lead_id: Uuid) -> AppResult<Option<Lead>> {
        Ok(self.state.leads.iter().find(|l| l.id == lead_id).cloned())
    }

    fn lock_lead(&mut self, lead_id: Uuid) -> AppResult<Option<Lead>> {
        self.find_lead(lead_id)
    }

    fn lead_number_exists(&mut self, lead_number: &str) -> AppResult<bool> {
        Ok(self.state.leads.iter().any(|l| l.lead_number == lead_number))
    }

    fn insert_leads(&mut self, leads: &[NewLead]) -> AppResult<Vec<Lead>> {
        let now = Utc::now();
        let mut inserted = Vec::with_capacity(leads.len());
        for new_lead in leads {
            if self.lead_number_exists(&new_lead.lead_number)? {
                return Err(AppError::Database(DieselError::DatabaseError(
                    DatabaseErrorKind::UniqueViolation,
                    Box::new(format!("duplicate lead_number {}", new_lead.lead_number)),
                )));
            }
            let lead = Lead {
                id: Uuid::new_v4(),
                lead_number: new_lead.lead_number.clone(),
                campaign_id: new_lead.campaign_id,
                assigned_to: new_lead.assigned_to,
                assigned_date: new_lead.assigned_date,
                customer_name: None,
                contact_number: None,
                whatsapp_number: None,
                lead_source: None,
                sale_status: new_lead.sale_status,
                follow_up_status: new_lead.follow_up_status,
                reason_not_closed: None,
                notes: None,
                admin_approved: new_lead.admin_approved,
                admin_notes: None,
                updated_by: new_lead.updated_by,
                created_at: now,
                updated_at: now,
            };
            self.state.leads.push(lead.clone());
            inserted.push(lead);
        }
        Ok(inserted)
    }

    fn update_lead(&mut self, lead_id: Uuid, changes: &LeadChangeset) -> AppResult<Lead> {
        let lead = self
            .state
            .leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or(AppError::Database(DieselError::NotFound))?;
        lead.apply(changes);
        if !lead.approval_invariant_holds() {
            return Err(AppError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::CheckViolation,
                Box::new("leads_approval_requires_closed".to_string()),
            )));
        }
        Ok(lead.clone())
    }

    fn list_leads(&mut self, filter: &LeadFilter) -> AppResult<Vec<Lead>> {
        let mut leads: Vec<Lead> = self
            .state
            .leads
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        leads.sort_by(|a, b| {
            a.assigned_date
                .cmp(&b.assigned_date)
                .then_with(|| a.lead_number.cmp(&b.lead_number))
        });
        Ok(leads)
    }
}
