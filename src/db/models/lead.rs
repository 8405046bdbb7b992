use crate::db::enums::{FollowUpStatus, SaleStatus};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::leads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Lead {
    pub id: Uuid,
    pub lead_number: String,
    pub campaign_id: Uuid,
    pub assigned_to: Uuid,
    pub assigned_date: NaiveDate,
    pub customer_name: Option<String>,
    pub contact_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub lead_source: Option<String>,
    pub sale_status: SaleStatus,
    pub follow_up_status: FollowUpStatus,
    pub reason_not_closed: Option<String>,
    pub notes: Option<String>,
    pub admin_approved: bool,
    pub admin_notes: Option<String>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Closed and waiting for an admin decision.
    pub fn is_pending_approval(&self) -> bool {
        self.sale_status == SaleStatus::Closed && !self.admin_approved
    }

    /// Approval is only meaningful on a closed lead.
    pub fn approval_invariant_holds(&self) -> bool {
        !self.admin_approved || self.sale_status == SaleStatus::Closed
    }

    /// Applies a changeset in memory the same way the database would.
    pub fn apply(&mut self, changes: &LeadChangeset) {
        if let Some(v) = &changes.customer_name {
            self.customer_name = v.clone();
        }
        if let Some(v) = &changes.contact_number {
            self.contact_number = v.clone();
        }
        if let Some(v) = &changes.whatsapp_number {
            self.whatsapp_number = v.clone();
        }
        if let Some(v) = &changes.lead_source {
            self.lead_source = v.clone();
        }
        if let Some(v) = changes.sale_status {
            self.sale_status = v;
        }
        if let Some(v) = changes.follow_up_status {
            self.follow_up_status = v;
        }
        if let Some(v) = &changes.reason_not_closed {
            self.reason_not_closed = v.clone();
        }
        if let Some(v) = &changes.notes {
            self.notes = v.clone();
        }
        if let Some(v) = changes.admin_approved {
            self.admin_approved = v;
        }
        if let Some(v) = &changes.admin_notes {
            self.admin_notes = v.clone();
        }
        if let Some(v) = changes.assigned_to {
            self.assigned_to = v;
        }
        if let Some(v) = changes.updated_by {
            self.updated_by = v;
        }
        if let Some(v) = changes.updated_at {
            self.updated_at = v;
        }
    }
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::leads)]
pub struct NewLead {
    pub lead_number: String,
    pub campaign_id: Uuid,
    pub assigned_to: Uuid,
    pub assigned_date: NaiveDate,
    pub sale_status: SaleStatus,
    pub follow_up_status: FollowUpStatus,
    pub admin_approved: bool,
    pub updated_by: Option<Uuid>,
}

#[derive(AsChangeset, Default, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::leads)]
pub struct LeadChangeset {
    pub customer_name: Option<Option<String>>,
    pub contact_number: Option<Option<String>>,
    pub whatsapp_number: Option<Option<String>>,
    pub lead_source: Option<Option<String>>,
    pub sale_status: Option<SaleStatus>,
    pub follow_up_status: Option<FollowUpStatus>,
    pub reason_not_closed: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub admin_approved: Option<bool>,
    pub admin_notes: Option<Option<String>>,
    pub assigned_to: Option<Uuid>,
    pub updated_by: Option<Option<Uuid>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read filter shared by listing, KPI and export queries. Date bounds are inclusive.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct LeadFilter {
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub assigned_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sale_status: Option<SaleStatus>,
    pub admin_approved: Option<bool>,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        self.campaign_id.is_none_or(|c| lead.campaign_id == c)
            && self.assigned_to.is_none_or(|u| lead.assigned_to == u)
            && self.assigned_date.is_none_or(|d| lead.assigned_date == d)
            && self.start_date.is_none_or(|d| lead.assigned_date >= d)
            && self.end_date.is_none_or(|d| lead.assigned_date <= d)
            && self.sale_status.is_none_or(|s| lead.sale_status == s)
            && self.admin_approved.is_none_or(|a| lead.admin_approved == a)
    }
}

/// Flat, CSV-ready projection of a lead.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LeadExportRow {
    pub lead_number: String,
    pub campaign_id: Uuid,
    pub assigned_to: Uuid,
    pub assigned_date: NaiveDate,
    pub customer_name: String,
    pub contact_number: String,
    pub whatsapp_number: String,
    pub lead_source: String,
    pub sale_status: SaleStatus,
    pub follow_up_status: FollowUpStatus,
    pub reason_not_closed: String,
    pub notes: String,
    pub admin_approved: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<Lead> for LeadExportRow {
    fn from(lead: Lead) -> Self {
        Self {
            lead_number: lead.lead_number,
            campaign_id: lead.campaign_id,
            assigned_to: lead.assigned_to,
            assigned_date: lead.assigned_date,
            customer_name: lead.customer_name.unwrap_or_default(),
            contact_number: lead.contact_number.unwrap_or_default(),
            whatsapp_number: lead.whatsapp_number.unwrap_or_default(),
            lead_source: lead.lead_source.unwrap_or_default(),
            sale_status: lead.sale_status,
            follow_up_status: lead.follow_up_status,
            reason_not_closed: lead.reason_not_closed.unwrap_or_default(),
            notes: lead.notes.unwrap_or_default(),
            admin_approved: lead.admin_approved,
            updated_at: lead.updated_at,
        }
    }
}
