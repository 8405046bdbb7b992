use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// Leads generated so far for one campaign on one day.
#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::daily_allocation_counters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DailyAllocationCounter {
    pub campaign_id: Uuid,
    pub allocation_date: NaiveDate,
    pub generated_count: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::user_allocation_counters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserAllocationCounter {
    pub campaign_id: Uuid,
    pub allocation_date: NaiveDate,
    pub user_id: Uuid,
    pub generated_count: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::daily_allocation_counters)]
pub struct NewDailyAllocationCounter {
    pub campaign_id: Uuid,
    pub allocation_date: NaiveDate,
    pub generated_count: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::user_allocation_counters)]
pub struct NewUserAllocationCounter {
    pub campaign_id: Uuid,
    pub allocation_date: NaiveDate,
    pub user_id: Uuid,
    pub generated_count: i32,
}
