use std::collections::HashSet;

use lead_engine::db::enums::{CampaignStatus, FollowUpStatus, SaleStatus};
use lead_engine::db::memory::MemoryStore;
use lead_engine::services::context::RequestContext;
use lead_engine::services::{CampaignsService, LeadGenerator};

use super::support::{admin, assign, campaign, day, generate, leads_for};

#[test]
fn splits_campaign_quota_evenly_and_second_run_is_empty() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    let a = assign(&mut store, c.id, 6);
    let b = assign(&mut store, c.id, 6);

    let result = LeadGenerator::generate_daily_leads(&mut store, c.id, day(19), None).unwrap();
    assert_eq!(result.created_count, 10);
    assert_eq!(result.campaign_remaining, 0);
    assert_eq!(leads_for(&store, a).len(), 5);
    assert_eq!(leads_for(&store, b).len(), 5);

    assert_eq!(generate(&mut store, c.id, day(19)), 0);
    assert_eq!(store.leads().len(), 10);
}

#[test]
fn new_leads_start_pending_and_unapproved() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 3);
    assign(&mut store, c.id, 3);
    generate(&mut store, c.id, day(19));

    for lead in store.leads() {
        assert_eq!(lead.sale_status, SaleStatus::Pending);
        assert_eq!(lead.follow_up_status, FollowUpStatus::NotRequired);
        assert_eq!(lead.assigned_date, day(19));
        assert!(!lead.admin_approved);
    }
}

#[test]
fn per_user_quota_is_a_ceiling() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    let a = assign(&mut store, c.id, 2);
    let b = assign(&mut store, c.id, 3);

    assert_eq!(generate(&mut store, c.id, day(19)), 5);
    assert_eq!(leads_for(&store, a).len(), 2);
    assert_eq!(leads_for(&store, b).len(), 3);

    // campaign room is left but nobody can take it
    let err = LeadGenerator::generate_daily_leads(&mut store, c.id, day(19), None).unwrap_err();
    assert_eq!(err.code(), "NO_ELIGIBLE_ASSIGNEES");
    assert_eq!(store.leads().len(), 5);
}

#[test]
fn repeated_runs_only_top_up() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    assign(&mut store, c.id, 3);
    assign(&mut store, c.id, 3);

    assert_eq!(generate(&mut store, c.id, day(19)), 6);

    let late = assign(&mut store, c.id, 8);
    assert_eq!(generate(&mut store, c.id, day(19)), 4);
    assert_eq!(leads_for(&store, late).len(), 4);
    assert_eq!(generate(&mut store, c.id, day(19)), 0);
    assert_eq!(store.leads().len(), 10);
}

#[test]
fn each_day_has_its_own_quota() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 4);
    assign(&mut store, c.id, 4);

    assert_eq!(generate(&mut store, c.id, day(19)), 4);
    assert_eq!(generate(&mut store, c.id, day(20)), 4);
    assert_eq!(store.leads().len(), 8);
}

#[test]
fn lead_numbers_are_unique_and_continue_the_daily_sequence() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 6);
    assign(&mut store, c.id, 2);
    generate(&mut store, c.id, day(19));
    assign(&mut store, c.id, 4);
    generate(&mut store, c.id, day(19));

    let numbers: HashSet<&str> = store.leads().iter().map(|l| l.lead_number.as_str()).collect();
    assert_eq!(numbers.len(), 6);

    let prefix = format!("L{}-261019-", &c.id.simple().to_string()[..6].to_uppercase());
    for seq in 1..=6 {
        assert!(numbers.contains(format!("{}{:04}", prefix, seq).as_str()));
    }
}

#[test]
fn inactive_assignees_get_nothing() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    let a = assign(&mut store, c.id, 5);
    let b = assign(&mut store, c.id, 5);
    CampaignsService::deactivate_assignment(&mut store, &admin(), c.id, b).unwrap();

    assert_eq!(generate(&mut store, c.id, day(19)), 5);
    assert_eq!(leads_for(&store, a).len(), 5);
    assert!(leads_for(&store, b).is_empty());
}

#[test]
fn inactive_or_out_of_window_campaigns_are_rejected() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    assign(&mut store, c.id, 5);

    let err = LeadGenerator::generate_daily_leads(&mut store, c.id, day(1).pred_opt().unwrap(), None)
        .unwrap_err();
    assert_eq!(err.code(), "CAMPAIGN_NOT_ACTIVE");

    CampaignsService::change_status(&mut store, &admin(), c.id, CampaignStatus::Paused).unwrap();
    let err = LeadGenerator::generate_daily_leads(&mut store, c.id, day(19), None).unwrap_err();
    assert_eq!(err.code(), "CAMPAIGN_NOT_ACTIVE");
    assert!(store.leads().is_empty());
}

#[test]
fn campaign_without_assignees_reports_no_eligible_assignees() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);

    let err = LeadGenerator::generate_daily_leads(&mut store, c.id, day(19), None).unwrap_err();
    assert_eq!(err.code(), "NO_ELIGIBLE_ASSIGNEES");
}

#[test]
fn unknown_campaign_is_not_found() {
    let mut store = MemoryStore::new();
    let err = LeadGenerator::generate_daily_leads(&mut store, uuid::Uuid::new_v4(), day(19), None)
        .unwrap_err();
    assert_eq!(err.code(), "CAMPAIGN_NOT_FOUND");
}

#[test]
fn serialization_conflict_is_retried_once() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    assign(&mut store, c.id, 6);
    assign(&mut store, c.id, 6);
    let units_before = store.units_started();

    store.inject_serialization_conflicts(1);
    assert_eq!(generate(&mut store, c.id, day(19)), 10);
    assert_eq!(store.units_started() - units_before, 2);
    assert_eq!(store.leads().len(), 10);
}

#[test]
fn second_conflict_surfaces_as_transient() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    assign(&mut store, c.id, 10);

    store.inject_serialization_conflicts(2);
    let err = LeadGenerator::generate_daily_leads(&mut store, c.id, day(19), None).unwrap_err();
    assert_eq!(err.code(), "TRANSIENT_CONFLICT");
    assert!(store.leads().is_empty());

    // nothing was booked, so the next run still gets the full quota
    assert_eq!(generate(&mut store, c.id, day(19)), 10);
}

#[test]
fn generated_leads_record_the_actor() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 2);
    assign(&mut store, c.id, 2);
    let ctx: RequestContext = admin();

    LeadGenerator::generate_daily_leads(&mut store, c.id, day(19), Some(ctx.user_id)).unwrap();
    assert!(store.leads().iter().all(|l| l.updated_by == Some(ctx.user_id)));
}
