use lead_engine::db::enums::SaleStatus;
use lead_engine::db::memory::MemoryStore;
use lead_engine::services::ExportService;
use uuid::Uuid;

use super::support::{admin, agent, assign, campaign, day, generate, leads_for, set_status};

#[test]
fn export_covers_the_inclusive_range_in_order() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 2);
    let a = assign(&mut store, c.id, 2);
    for d in [18, 19, 20, 21] {
        generate(&mut store, c.id, day(d));
    }

    let rows = ExportService::export_leads(&mut store, &admin(), c.id, day(19), day(20), 92).unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.assigned_date >= day(19) && r.assigned_date <= day(20)));
    assert!(rows.iter().all(|r| r.assigned_to == a));
    assert!(
        rows.windows(2)
            .all(|w| (w[0].assigned_date, &w[0].lead_number) <= (w[1].assigned_date, &w[1].lead_number))
    );
}

#[test]
fn export_includes_every_status() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 3);
    let a = assign(&mut store, c.id, 3);
    generate(&mut store, c.id, day(19));
    let leads = leads_for(&store, a);
    set_status(&mut store, &agent(a), leads[0].id, SaleStatus::Closed).unwrap();
    set_status(&mut store, &agent(a), leads[1].id, SaleStatus::NotInterested).unwrap();

    let rows = ExportService::export_leads(&mut store, &admin(), c.id, day(19), day(19), 92).unwrap();
    assert_eq!(rows.len(), 3);

    let csv = ExportService::to_csv(&rows).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains(",closed,"));
    assert!(csv.contains(",not_interested,"));
}

#[test]
fn export_rejects_bad_ranges_and_unknown_campaigns() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 3);

    let err = ExportService::export_leads(&mut store, &admin(), c.id, day(20), day(19), 92).unwrap_err();
    assert_eq!(err.code(), "INVALID_RANGE");

    let err = ExportService::export_leads(&mut store, &admin(), c.id, day(1), day(31), 7).unwrap_err();
    assert_eq!(err.code(), "RANGE_TOO_LARGE");

    let err = ExportService::export_leads(&mut store, &admin(), Uuid::new_v4(), day(1), day(2), 92)
        .unwrap_err();
    assert_eq!(err.code(), "CAMPAIGN_NOT_FOUND");
}

#[test]
fn export_is_admin_only() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 1);
    let a = assign(&mut store, c.id, 1);

    let err = ExportService::export_leads(&mut store, &agent(a), c.id, day(1), day(2), 92).unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}

#[test]
fn empty_range_still_yields_a_header() {
    let mut store = MemoryStore::new();
    let c = campaign(&mut store, 1);

    let rows = ExportService::export_leads(&mut store, &admin(), c.id, day(1), day(2), 92).unwrap();
    assert!(rows.is_empty());
    let csv = ExportService::to_csv(&rows).unwrap();
    assert_eq!(csv.lines().count(), 1);
}
