use lead_engine::db::enums::SaleStatus;
use lead_engine::db::memory::MemoryStore;
use lead_engine::services::kpi_service::KpiQuery;
use lead_engine::services::{KpiService, LeadWorkflow};

use super::support::{admin, agent, assign, campaign, day, generate, leads_for, set_status};

#[test]
fn campaign_kpis_count_dispositions_and_approvals() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 5);
    let a = assign(&mut store, c.id, 5);
    generate(&mut store, c.id, day(19));
    let leads = leads_for(&store, a);

    set_status(&mut store, &agent(a), leads[0].id, SaleStatus::Closed).unwrap();
    set_status(&mut store, &agent(a), leads[1].id, SaleStatus::Closed).unwrap();
    set_status(&mut store, &agent(a), leads[2].id, SaleStatus::NotInterested).unwrap();
    set_status(&mut store, &agent(a), leads[3].id, SaleStatus::NoResponse).unwrap();
    LeadWorkflow::approve(&mut store, &admin(), leads[0].id, None).unwrap();

    let query = KpiQuery {
        campaign_id: Some(c.id),
        ..Default::default()
    };
    let kpis = KpiService::compute(&mut store, &admin(), &query).unwrap();
    assert_eq!(kpis.total, 5);
    assert_eq!(kpis.closed, 2);
    assert_eq!(kpis.pending, 1);
    assert_eq!(kpis.not_interested, 1);
    assert_eq!(kpis.no_response, 1);
    assert_eq!(kpis.confirmed, 0);
    assert_eq!(kpis.approved, 1);
    assert_eq!(kpis.pending_approval, 1);
    assert!((kpis.conversion_rate - 0.4).abs() < f64::EPSILON);
}

#[test]
fn empty_scope_has_zero_conversion() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 5);

    let query = KpiQuery {
        campaign_id: Some(c.id),
        ..Default::default()
    };
    let kpis = KpiService::compute(&mut store, &admin(), &query).unwrap();
    assert_eq!(kpis.total, 0);
    assert_eq!(kpis.conversion_rate, 0.0);
}

#[test]
fn agents_only_see_their_own_numbers() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 6);
    let a = assign(&mut store, c.id, 2);
    let b = assign(&mut store, c.id, 4);
    generate(&mut store, c.id, day(19));

    let query = KpiQuery {
        user_id: Some(b),
        ..Default::default()
    };
    let kpis = KpiService::compute(&mut store, &agent(a), &query).unwrap();
    assert_eq!(kpis.total, 2);

    let kpis = KpiService::compute(&mut store, &admin(), &query).unwrap();
    assert_eq!(kpis.total, 4);
}

#[test]
fn team_performance_groups_by_date_and_user() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 4);
    let a = assign(&mut store, c.id, 2);
    let b = assign(&mut store, c.id, 2);
    generate(&mut store, c.id, day(19));
    generate(&mut store, c.id, day(20));
    let first = leads_for(&store, a)[0].id;
    set_status(&mut store, &agent(a), first, SaleStatus::Closed).unwrap();

    let query = KpiQuery {
        campaign_id: Some(c.id),
        start_date: Some(day(19)),
        end_date: Some(day(20)),
        ..Default::default()
    };
    let rows = KpiService::team_performance(&mut store, &admin(), &query).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].date, day(19));
    assert_eq!(rows[3].date, day(20));
    assert!(rows.iter().all(|r| r.kpis.total == 2));

    let closed: i64 = rows.iter().map(|r| r.kpis.closed).sum();
    assert_eq!(closed, 1);

    let mine = KpiService::team_performance(&mut store, &agent(b), &query).unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|r| r.user_id == b));
}

#[test]
fn campaign_cards_are_admin_only() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 3);
    let a = assign(&mut store, c.id, 3);
    generate(&mut store, c.id, day(19));

    let cards = KpiService::campaign_cards(&mut store, &admin(), None).unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].campaign_id, c.id);
    assert_eq!(cards[0].active_assignees, 1);
    assert_eq!(cards[0].kpis.total, 3);

    let err = KpiService::campaign_cards(&mut store, &agent(a), None).unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}
