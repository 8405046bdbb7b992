//! Storage seam for the lead engine.
//!
//! Services are written against these traits so the same allocation and approval
//! logic runs on Postgres in production and on [`MemoryStore`](crate::db::memory::MemoryStore)
//! in tests. A single store value represents one connection; `atomically` opens a
//! unit of work on it.

use chrono::NaiveDate;
use diesel::PgConnection;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use uuid::Uuid;

use crate::db::enums::{AssignmentStatus, CampaignStatus};
use crate::db::models::allocation::{DailyAllocationCounter, UserAllocationCounter};
use crate::db::models::campaign::{Campaign, CampaignAssignment, NewCampaignAssignment};
use crate::db::models::lead::{Lead, LeadChangeset, LeadFilter, NewLead};
use crate::db::repositories::allocation_counters::AllocationCounterRepo;
use crate::db::repositories::campaigns::{AssignmentRepo, CampaignRepo};
use crate::db::repositories::leads::LeadRepo;
use crate::error::{AppError, AppResult};

/// Transaction isolation requested for a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    ReadCommitted,
    Serializable,
}

impl Isolation {
    fn begin_sql(&self) -> &'static str {
        match self {
            Isolation::ReadCommitted => "BEGIN ISOLATION LEVEL READ COMMITTED",
            Isolation::Serializable => "BEGIN ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

pub trait UnitOfWork {
    /// Runs `f` inside one transaction. Everything `f` wrote is rolled back when it
    /// returns an error.
    fn atomically<T, F>(&mut self, isolation: Isolation, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Self) -> AppResult<T>;
}

pub trait CampaignStore {
    fn find_campaign(&mut self, campaign_id: Uuid) -> AppResult<Option<Campaign>>;
    fn list_campaigns(&mut self, status: Option<CampaignStatus>) -> AppResult<Vec<Campaign>>;
    fn update_campaign_status(
        &mut self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> AppResult<Campaign>;

    /// Assignments in creation order, optionally restricted to active ones.
    fn list_assignments(
        &mut self,
        campaign_id: Uuid,
        only_active: bool,
    ) -> AppResult<Vec<CampaignAssignment>>;
    fn find_assignment(
        &mut self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<CampaignAssignment>>;
    fn upsert_assignment(&mut self, assignment: &NewCampaignAssignment)
    -> AppResult<CampaignAssignment>;
    fn set_assignment_status(
        &mut self,
        campaign_id: Uuid,
        user_id: Uuid,
        status: AssignmentStatus,
    ) -> AppResult<Option<CampaignAssignment>>;
}

pub trait AllocationStore {
    /// Generated-so-far for (campaign, date); zero when nothing was generated yet.
    fn generated_count(&mut self, campaign_id: Uuid, date: NaiveDate) -> AppResult<i32>;
    /// Creates the (campaign, date) counter if needed and holds it exclusively until
    /// the current unit of work ends.
    fn lock_daily_counter(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<DailyAllocationCounter>;
    fn user_counters(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<UserAllocationCounter>>;
    fn record_generated(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
        per_user: &[(Uuid, i32)],
    ) -> AppResult<()>;
}

pub trait LeadStore {
    fn find_lead(&mut self, lead_id: Uuid) -> AppResult<Option<Lead>>;
    /// Like `find_lead`, but the row stays locked until the unit of work ends.
    fn lock_lead(&mut self, lead_id: Uuid) -> AppResult<Option<Lead>>;
    fn lead_number_exists(&mut self, lead_number: &str) -> AppResult<bool>;
    fn insert_leads(&mut self, leads: &[NewLead]) -> AppResult<Vec<Lead>>;
    fn update_lead(&mut self, lead_id: Uuid, changes: &LeadChangeset) -> AppResult<Lead>;
    /// Matching leads ordered by `assigned_date`, then `lead_number`.
    fn list_leads(&mut self, filter: &LeadFilter) -> AppResult<Vec<Lead>>;
}

/// Everything the engine services need from storage.
pub trait EngineStore: UnitOfWork + CampaignStore + AllocationStore + LeadStore {}

impl<T> EngineStore for T where T: UnitOfWork + CampaignStore + AllocationStore + LeadStore {}

/// Runs a unit of work, retrying once when the database aborts it with a
/// serialization conflict. A second conflict surfaces as [`AppError::Transient`].
pub fn run_atomic<S, T, F>(store: &mut S, isolation: Isolation, mut f: F) -> AppResult<T>
where
    S: UnitOfWork,
    F: FnMut(&mut S) -> AppResult<T>,
{
    match store.atomically(isolation, &mut f) {
        Err(e) if e.is_serialization_conflict() => {
            tracing::warn!(error = %e, "Unit of work hit a serialization conflict, retrying once");
            store.atomically(isolation, &mut f).map_err(|e| {
                if e.is_serialization_conflict() {
                    AppError::Transient(
                        "The operation conflicted with a concurrent update, please retry"
                            .to_string(),
                    )
                } else {
                    e
                }
            })
        }
        other => other,
    }
}

/// Postgres-backed store over one pooled connection.
pub struct PgStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl UnitOfWork for PgStore<'_> {
    fn atomically<T, F>(&mut self, isolation: Isolation, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Self) -> AppResult<T>,
    {
        AnsiTransactionManager::begin_transaction_sql(&mut *self.conn, isolation.begin_sql())?;
        match f(self) {
            Ok(value) => {
                AnsiTransactionManager::commit_transaction(&mut *self.conn)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = AnsiTransactionManager::rollback_transaction(&mut *self.conn)
                {
                    tracing::error!(error = %rollback_err, "Failed to roll back transaction");
                }
                Err(e)
            }
        }
    }
}

impl CampaignStore for PgStore<'_> {
    fn find_campaign(&mut self, campaign_id: Uuid) -> AppResult<Option<Campaign>> {
        Ok(CampaignRepo::find_by_id(self.conn, campaign_id)?)
    }

    fn list_campaigns(&mut self, status: Option<CampaignStatus>) -> AppResult<Vec<Campaign>> {
        Ok(CampaignRepo::list(self.conn, status)?)
    }

    fn update_campaign_status(
        &mut self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> AppResult<Campaign> {
        Ok(CampaignRepo::update_status(self.conn, campaign_id, status)?)
    }

    fn list_assignments(
        &mut self,
        campaign_id: Uuid,
        only_active: bool,
    ) -> AppResult<Vec<CampaignAssignment>> {
        Ok(AssignmentRepo::list_by_campaign(self.conn, campaign_id, only_active)?)
    }

    fn find_assignment(
        &mut self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<CampaignAssignment>> {
        Ok(AssignmentRepo::find(self.conn, campaign_id, user_id)?)
    }

    fn upsert_assignment(
        &mut self,
        assignment: &NewCampaignAssignment,
    ) -> AppResult<CampaignAssignment> {
        Ok(AssignmentRepo::upsert(self.conn, assignment)?)
    }

    fn set_assignment_status(
        &mut self,
        campaign_id: Uuid,
        user_id: Uuid,
        status: AssignmentStatus,
    ) -> AppResult<Option<CampaignAssignment>> {
        Ok(AssignmentRepo::set_status(self.conn, campaign_id, user_id, status)?)
    }
}

impl AllocationStore for PgStore<'_> {
    fn generated_count(&mut self, campaign_id: Uuid, date: NaiveDate) -> AppResult<i32> {
        Ok(AllocationCounterRepo::find(self.conn, campaign_id, date)?
            .map(|c| c.generated_count)
            .unwrap_or(0))
    }

    fn lock_daily_counter(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<DailyAllocationCounter> {
        Ok(AllocationCounterRepo::lock_or_create(self.conn, campaign_id, date)?)
    }

    fn user_counters(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<UserAllocationCounter>> {
        Ok(AllocationCounterRepo::list_user_counters(self.conn, campaign_id, date)?)
    }

    fn record_generated(
        &mut self,
        campaign_id: Uuid,
        date: NaiveDate,
        per_user: &[(Uuid, i32)],
    ) -> AppResult<()> {
        let total: i32 = per_user.iter().map(|(_, n)| n).sum();
        AllocationCounterRepo::increment(self.conn, campaign_id, date, total)?;
        for (user_id, count) in per_user {
            AllocationCounterRepo::increment_user(self.conn, campaign_id, date, *user_id, *count)?;
        }
        Ok(())
    }
}

impl LeadStore for PgStore<'_> {
    fn find_lead(&mut self, lead_id: Uuid) -> AppResult<Option<Lead>> {
        Ok(LeadRepo::find_by_id(self.conn, lead_id)?)
    }

    fn lock_lead(&mut self, lead_id: Uuid) -> AppResult<Option<Lead>> {
        Ok(LeadRepo::find_for_update(self.conn, lead_id)?)
    }

    fn lead_number_exists(&mut self, lead_number: &str) -> AppResult<bool> {
        Ok(LeadRepo::lead_number_exists(self.conn, lead_number)?)
    }

    fn insert_leads(&mut self, leads: &[NewLead]) -> AppResult<Vec<Lead>> {
        Ok(LeadRepo::insert_many(self.conn, leads)?)
    }

    fn update_lead(&mut self, lead_id: Uuid, changes: &LeadChangeset) -> AppResult<Lead> {
        Ok(LeadRepo::update(self.conn, lead_id, changes)?)
    }

    fn list_leads(&mut self, filter: &LeadFilter) -> AppResult<Vec<Lead>> {
        Ok(LeadRepo::list(self.conn, filter)?)
    }
}
