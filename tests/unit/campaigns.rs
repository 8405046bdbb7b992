use lead_engine::db::enums::{AssignmentStatus, CampaignStatus};
use lead_engine::db::memory::MemoryStore;
use lead_engine::services::CampaignsService;
use uuid::Uuid;

use super::support::{admin, agent, assign, campaign, day, generate};

#[test]
fn status_changes_follow_the_lifecycle() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 5);

    let (paused, changed) =
        CampaignsService::change_status(&mut store, &admin(), c.id, CampaignStatus::Paused).unwrap();
    assert!(changed);
    assert_eq!(paused.status, CampaignStatus::Paused);

    let (_, changed) =
        CampaignsService::change_status(&mut store, &admin(), c.id, CampaignStatus::Paused).unwrap();
    assert!(!changed);

    CampaignsService::change_status(&mut store, &admin(), c.id, CampaignStatus::Completed).unwrap();
    let err = CampaignsService::change_status(&mut store, &admin(), c.id, CampaignStatus::Active)
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");
}

#[test]
fn assignment_upsert_reactivates_and_requotas() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    let user = assign(&mut store, c.id, 3);

    CampaignsService::deactivate_assignment(&mut store, &admin(), c.id, user).unwrap();
    let again = CampaignsService::assign_user(&mut store, &admin(), c.id, user, 7).unwrap();
    assert_eq!(again.status, AssignmentStatus::Active);
    assert_eq!(again.daily_quota, 7);

    let all = CampaignsService::list_assignments(&mut store, c.id).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn assignment_rules() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);

    let err = CampaignsService::assign_user(&mut store, &admin(), c.id, Uuid::new_v4(), -1).unwrap_err();
    assert_eq!(err.code(), "OUT_OF_RANGE");

    let err = CampaignsService::assign_user(&mut store, &agent(Uuid::new_v4()), c.id, Uuid::new_v4(), 3)
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    let err = CampaignsService::deactivate_assignment(&mut store, &admin(), c.id, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.code(), "ASSIGNMENT_NOT_FOUND");

    CampaignsService::change_status(&mut store, &admin(), c.id, CampaignStatus::Cancelled).unwrap();
    let err = CampaignsService::assign_user(&mut store, &admin(), c.id, Uuid::new_v4(), 3).unwrap_err();
    assert_eq!(err.code(), "CAMPAIGN_NOT_ACTIVE");
}

#[test]
fn allocation_preview_reflects_what_is_left() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 10);
    let a = assign(&mut store, c.id, 4);
    let b = assign(&mut store, c.id, 8);
    CampaignsService::assign_user(&mut store, &admin(), c.id, b, 6).unwrap();

    let plan = CampaignsService::allocation_preview(&mut store, &admin(), c.id, day(19)).unwrap();
    assert_eq!(plan.campaign_remaining, 10);
    assert_eq!(plan.total_slots(), 10);
    let slots = plan.slots();
    assert!(slots.contains(&(a, 4)));
    assert!(slots.contains(&(b, 6)));

    generate(&mut store, c.id, day(19));
    let plan = CampaignsService::allocation_preview(&mut store, &admin(), c.id, day(19)).unwrap();
    assert_eq!(plan.already_generated, 10);
    assert_eq!(plan.total_slots(), 0);
}

#[test]
fn unknown_campaign_is_not_found() {
    let mut store = MemoryStore::new();
    let err = CampaignsService::get(&mut store, Uuid::new_v4()).unwrap_err();
    assert_eq!(err.code(), "CAMPAIGN_NOT_FOUND");
    let err = CampaignsService::list_assignments(&mut store, Uuid::new_v4()).unwrap_err();
    assert_eq!(err.code(), "CAMPAIGN_NOT_FOUND");
}
