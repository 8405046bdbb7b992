use lead_engine::db::enums::SaleStatus;
use lead_engine::db::memory::MemoryStore;
use lead_engine::db::models::allocation::UserAllocationCounter;
use lead_engine::db::store::AllocationStore;
use lead_engine::routes::leads::UpdateLeadRequest;
use lead_engine::services::lead_workflow::ApprovalAction;
use lead_engine::services::{LeadSourceRegistry, LeadWorkflow};
use uuid::Uuid;

use super::support::{
    admin, agent, assert_approval_invariant, assign, campaign, day, generate, leads_for,
    set_status,
};

fn counts(counters: Vec<UserAllocationCounter>) -> Vec<(Uuid, i32)> {
    let mut counts: Vec<_> = counters.iter().map(|c| (c.user_id, c.generated_count)).collect();
    counts.sort();
    counts
}

/// One campaign, two agents with two leads each for Oct 19.
fn seeded() -> (MemoryStore, Uuid, Uuid, Uuid) {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 4);
    let a = assign(&mut store, c.id, 2);
    let b = assign(&mut store, c.id, 2);
    generate(&mut store, c.id, day(19));
    (store, c.id, a, b)
}

#[test]
fn approval_is_cleared_when_a_lead_leaves_closed() {
    let (mut store, _, a, _) = seeded();
    let admin = admin();
    let lead_id = leads_for(&store, a)[0].id;

    set_status(&mut store, &agent(a), lead_id, SaleStatus::Closed).unwrap();
    let outcome = LeadWorkflow::approve(&mut store, &admin, lead_id, Some("verified")).unwrap();
    assert!(outcome.changed);
    assert!(outcome.lead.admin_approved);
    assert_approval_invariant(&store);

    let req = UpdateLeadRequest {
        sale_status: Some(SaleStatus::Pending),
        ..Default::default()
    };
    let outcome =
        LeadWorkflow::update_lead(&mut store, &agent(a), &LeadSourceRegistry::default(), lead_id, &req)
            .unwrap();
    assert!(outcome.approval_reset);
    assert!(!outcome.lead.admin_approved);
    assert_eq!(outcome.lead.sale_status, SaleStatus::Pending);
    assert!(outcome.lead.admin_notes.unwrap().contains("approval reset"));
    assert_approval_invariant(&store);
}

#[test]
fn editing_an_approved_lead_without_leaving_closed_keeps_approval() {
    let (mut store, _, a, _) = seeded();
    let lead_id = leads_for(&store, a)[0].id;
    set_status(&mut store, &agent(a), lead_id, SaleStatus::Closed).unwrap();
    LeadWorkflow::approve(&mut store, &admin(), lead_id, None).unwrap();

    let req = UpdateLeadRequest {
        notes: Some("delivered on Monday".to_string()),
        sale_status: Some(SaleStatus::Closed),
        ..Default::default()
    };
    let outcome =
        LeadWorkflow::update_lead(&mut store, &agent(a), &LeadSourceRegistry::default(), lead_id, &req)
            .unwrap();
    assert!(!outcome.approval_reset);
    assert!(outcome.lead.admin_approved);
    assert_eq!(outcome.lead.notes.as_deref(), Some("delivered on Monday"));
}

#[test]
fn only_closed_leads_can_be_approved_or_rejected() {
    let (mut store, _, a, _) = seeded();
    let lead_id = leads_for(&store, a)[0].id;

    let err = LeadWorkflow::approve(&mut store, &admin(), lead_id, None).unwrap_err();
    assert_eq!(err.code(), "LEAD_NOT_CLOSED");
    let err = LeadWorkflow::reject(&mut store, &admin(), lead_id, Some("no proof")).unwrap_err();
    assert_eq!(err.code(), "LEAD_NOT_CLOSED");
    assert_approval_invariant(&store);
}

#[test]
fn approving_twice_is_a_no_op() {
    let (mut store, _, a, _) = seeded();
    let lead_id = leads_for(&store, a)[0].id;
    set_status(&mut store, &admin(), lead_id, SaleStatus::Closed).unwrap();

    let first = LeadWorkflow::approve(&mut store, &admin(), lead_id, None).unwrap();
    let second = LeadWorkflow::approve(&mut store, &admin(), lead_id, None).unwrap();
    assert!(first.changed);
    assert!(!second.changed);
    assert!(second.lead.admin_approved);
    assert_eq!(first.lead.admin_notes, second.lead.admin_notes);
}

#[test]
fn reject_keeps_the_lead_closed_and_records_the_reason() {
    let (mut store, _, a, _) = seeded();
    let lead_id = leads_for(&store, a)[0].id;
    set_status(&mut store, &agent(a), lead_id, SaleStatus::Closed).unwrap();

    let outcome =
        LeadWorkflow::reject(&mut store, &admin(), lead_id, Some("invoice missing")).unwrap();
    assert_eq!(outcome.action, ApprovalAction::Reject);
    assert_eq!(outcome.lead.sale_status, SaleStatus::Closed);
    assert!(!outcome.lead.admin_approved);
    assert!(outcome.lead.is_pending_approval());
    assert!(
        outcome
            .lead
            .admin_notes
            .unwrap()
            .contains("rejected: invoice missing")
    );
}

#[test]
fn revoke_needs_an_approved_lead() {
    let (mut store, _, a, _) = seeded();
    let lead_id = leads_for(&store, a)[0].id;
    set_status(&mut store, &agent(a), lead_id, SaleStatus::Closed).unwrap();

    let err = LeadWorkflow::revoke(&mut store, &admin(), lead_id, None).unwrap_err();
    assert_eq!(err.code(), "LEAD_NOT_APPROVED");

    LeadWorkflow::approve(&mut store, &admin(), lead_id, None).unwrap();
    let outcome = LeadWorkflow::revoke(&mut store, &admin(), lead_id, Some("recheck")).unwrap();
    assert!(!outcome.lead.admin_approved);
    assert_eq!(outcome.lead.sale_status, SaleStatus::Closed);
}

#[test]
fn bulk_approval_approves_the_eligible_subset() {
    let (mut store, _, a, b) = seeded();
    let a_leads = leads_for(&store, a);
    let b_leads = leads_for(&store, b);
    set_status(&mut store, &agent(a), a_leads[0].id, SaleStatus::Closed).unwrap();
    set_status(&mut store, &agent(b), b_leads[0].id, SaleStatus::Closed).unwrap();
    let unknown = Uuid::new_v4();

    let ids = vec![
        a_leads[0].id,
        a_leads[1].id,
        b_leads[0].id,
        unknown,
        a_leads[0].id,
    ];
    let result =
        LeadWorkflow::bulk_decide(&mut store, &admin(), &ids, ApprovalAction::Approve, None, 100)
            .unwrap();

    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed, 2);
    assert!(!result.all_succeeded());
    assert_eq!(result.results.len(), 4);

    let failed: Vec<_> = result.results.iter().filter(|r| !r.success).collect();
    assert_eq!(failed[0].lead_id, a_leads[1].id);
    assert_eq!(failed[0].code.as_deref(), Some("LEAD_NOT_CLOSED"));
    assert_eq!(failed[1].lead_id, unknown);
    assert_eq!(failed[1].code.as_deref(), Some("LEAD_NOT_FOUND"));

    let approved: Vec<Uuid> = store
        .leads()
        .iter()
        .filter(|l| l.admin_approved)
        .map(|l| l.id)
        .collect();
    assert_eq!(approved.len(), 2);
    assert!(approved.contains(&a_leads[0].id));
    assert!(approved.contains(&b_leads[0].id));
    assert_approval_invariant(&store);

    // retrying the same batch changes nothing
    let retry =
        LeadWorkflow::bulk_decide(&mut store, &admin(), &ids, ApprovalAction::Approve, None, 100)
            .unwrap();
    assert_eq!(retry.succeeded, 2);
    assert_eq!(store.leads().iter().filter(|l| l.admin_approved).count(), 2);
}

#[test]
fn bulk_batches_are_bounded() {
    let (mut store, _, a, _) = seeded();
    let ids: Vec<Uuid> = leads_for(&store, a).iter().map(|l| l.id).collect();

    let err = LeadWorkflow::bulk_decide(&mut store, &admin(), &ids, ApprovalAction::Approve, None, 1)
        .unwrap_err();
    assert_eq!(err.code(), "BATCH_TOO_LARGE");

    let err = LeadWorkflow::bulk_decide(&mut store, &admin(), &[], ApprovalAction::Approve, None, 10)
        .unwrap_err();
    assert_eq!(err.code(), "REQUIRED");
}

#[test]
fn agents_cannot_review_or_touch_other_agents_leads() {
    let (mut store, _, a, b) = seeded();
    let b_lead = leads_for(&store, b)[0].id;

    let err = LeadWorkflow::approve(&mut store, &agent(a), b_lead, None).unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    let err = set_status(&mut store, &agent(a), b_lead, SaleStatus::Closed).unwrap_err();
    assert_eq!(err.code(), "LEAD_NOT_FOUND");
    let err = LeadWorkflow::get_lead(&mut store, &agent(a), b_lead).unwrap_err();
    assert_eq!(err.code(), "LEAD_NOT_FOUND");

    assert_eq!(LeadWorkflow::get_lead(&mut store, &agent(b), b_lead).unwrap().id, b_lead);
    assert_eq!(LeadWorkflow::get_lead(&mut store, &admin(), b_lead).unwrap().id, b_lead);
}

#[test]
fn whatsapp_leads_need_a_whatsapp_number() {
    let (mut store, _, a, _) = seeded();
    let lead_id = leads_for(&store, a)[0].id;
    let registry = LeadSourceRegistry::default();

    let req = UpdateLeadRequest {
        customer_name: Some("Meera Iyer".to_string()),
        contact_number: Some("+91 98450 12345".to_string()),
        lead_source: Some("WhatsApp".to_string()),
        ..Default::default()
    };
    let err = LeadWorkflow::update_lead(&mut store, &agent(a), &registry, lead_id, &req).unwrap_err();
    assert_eq!(err.code(), "REQUIRED");
    assert!(store.leads().iter().all(|l| l.customer_name.is_none()));

    let req = UpdateLeadRequest {
        whatsapp_number: Some("+91 98450 12345".to_string()),
        ..req
    };
    let outcome = LeadWorkflow::update_lead(&mut store, &agent(a), &registry, lead_id, &req).unwrap();
    assert_eq!(outcome.lead.lead_source.as_deref(), Some("whatsapp"));
    assert_eq!(outcome.lead.customer_name.as_deref(), Some("Meera Iyer"));

    // clearing the number later is refused too
    let req = UpdateLeadRequest {
        whatsapp_number: Some(String::new()),
        ..Default::default()
    };
    let err = LeadWorkflow::update_lead(&mut store, &agent(a), &registry, lead_id, &req).unwrap_err();
    assert_eq!(err.code(), "REQUIRED");
}

#[test]
fn unknown_sources_and_empty_updates_are_rejected() {
    let (mut store, _, a, _) = seeded();
    let lead_id = leads_for(&store, a)[0].id;
    let registry = LeadSourceRegistry::default();

    let req = UpdateLeadRequest {
        lead_source: Some("carrier_pigeon".to_string()),
        ..Default::default()
    };
    let err = LeadWorkflow::update_lead(&mut store, &agent(a), &registry, lead_id, &req).unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_LEAD_SOURCE");

    let err = LeadWorkflow::update_lead(
        &mut store,
        &agent(a),
        &registry,
        lead_id,
        &UpdateLeadRequest::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_FAILED");
}

#[test]
fn reassignment_moves_the_lead_without_touching_counters() {
    let (mut store, c, a, b) = seeded();
    let lead = leads_for(&store, a)[0].clone();
    let before = store.user_counters(c, day(19)).unwrap();

    let (moved, previous) =
        LeadWorkflow::reassign(&mut store, &admin(), lead.id, b, Some("a on leave")).unwrap();
    assert_eq!(previous, a);
    assert_eq!(moved.assigned_to, b);
    assert_eq!(moved.lead_number, lead.lead_number);
    assert_eq!(moved.sale_status, lead.sale_status);
    assert_eq!(leads_for(&store, b).len(), 3);
    assert_eq!(store.leads().len(), 4);

    let after = store.user_counters(c, day(19)).unwrap();
    assert_eq!(counts(before), counts(after));
}

#[test]
fn reassignment_needs_an_active_assignee() {
    let (mut store, _, a, _) = seeded();
    let lead_id = leads_for(&store, a)[0].id;

    let err = LeadWorkflow::reassign(&mut store, &admin(), lead_id, Uuid::new_v4(), None).unwrap_err();
    assert_eq!(err.code(), "ASSIGNMENT_NOT_FOUND");

    let err = LeadWorkflow::reassign(&mut store, &agent(a), lead_id, a, None).unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}

#[test]
fn pending_approval_queue_lists_closed_unapproved_leads() {
    let (mut store, c, a, b) = seeded();
    let a_leads = leads_for(&store, a);
    let b_leads = leads_for(&store, b);
    set_status(&mut store, &agent(a), a_leads[0].id, SaleStatus::Closed).unwrap();
    set_status(&mut store, &agent(a), a_leads[1].id, SaleStatus::Closed).unwrap();
    set_status(&mut store, &agent(b), b_leads[0].id, SaleStatus::Confirmed).unwrap();
    LeadWorkflow::approve(&mut store, &admin(), a_leads[1].id, None).unwrap();

    let queue = LeadWorkflow::pending_approval(&mut store, &admin(), Some(c)).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, a_leads[0].id);

    let err = LeadWorkflow::pending_approval(&mut store, &agent(a), None).unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}
