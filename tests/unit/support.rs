use chrono::NaiveDate;
use lead_engine::db::enums::{CampaignStatus, SaleStatus, UserRole};
use lead_engine::db::memory::MemoryStore;
use lead_engine::db::models::campaign::{Campaign, NewCampaign};
use lead_engine::db::models::lead::Lead;
use lead_engine::routes::leads::UpdateLeadRequest;
use lead_engine::services::context::RequestContext;
use lead_engine::services::{CampaignsService, LeadGenerator, LeadSourceRegistry, LeadWorkflow};
use uuid::Uuid;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

pub fn admin() -> RequestContext {
    RequestContext::new(Uuid::new_v4(), UserRole::Admin)
}

pub fn agent(user_id: Uuid) -> RequestContext {
    RequestContext::new(user_id, UserRole::Agent)
}

/// An active campaign running through October 2026.
pub fn campaign(store: &mut MemoryStore, daily_lead_quota: i32) -> Campaign {
    store.insert_campaign(NewCampaign {
        name: "Diwali outreach".to_string(),
        description: None,
        start_date: day(1),
        end_date: day(31),
        status: CampaignStatus::Active,
        daily_lead_quota,
        created_by: Uuid::new_v4(),
    })
}

pub fn assign(store: &mut MemoryStore, campaign_id: Uuid, daily_quota: i32) -> Uuid {
    let user_id = Uuid::new_v4();
    CampaignsService::assign_user(store, &admin(), campaign_id, user_id, daily_quota)
        .unwrap()
        .user_id
}

pub fn generate(store: &mut MemoryStore, campaign_id: Uuid, date: NaiveDate) -> i32 {
    LeadGenerator::generate_daily_leads(store, campaign_id, date, None)
        .unwrap()
        .created_count
}

pub fn leads_for(store: &MemoryStore, user_id: Uuid) -> Vec<Lead> {
    store
        .leads()
        .iter()
        .filter(|l| l.assigned_to == user_id)
        .cloned()
        .collect()
}

pub fn set_status(
    store: &mut MemoryStore,
    ctx: &RequestContext,
    lead_id: Uuid,
    status: SaleStatus,
) -> lead_engine::error::AppResult<Lead> {
    let req = UpdateLeadRequest {
        sale_status: Some(status),
        ..Default::default()
    };
    LeadWorkflow::update_lead(store, ctx, &LeadSourceRegistry::default(), lead_id, &req)
        .map(|outcome| outcome.lead)
}

pub fn assert_approval_invariant(store: &MemoryStore) {
    for lead in store.leads() {
        assert!(
            lead.approval_invariant_holds(),
            "lead {} approved while {}",
            lead.lead_number,
            lead.sale_status
        );
    }
}
