use crate::db::enums::{AssignmentStatus, CampaignStatus};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::campaigns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CampaignStatus,
    pub daily_lead_quota: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::campaigns)]
pub struct NewCampaign {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CampaignStatus,
    pub daily_lead_quota: i32,
    pub created_by: Uuid,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::campaign_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CampaignAssignment {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub status: AssignmentStatus,
    pub daily_quota: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignAssignment {
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::campaign_assignments)]
pub struct NewCampaignAssignment {
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub status: AssignmentStatus,
    pub daily_quota: i32,
}
