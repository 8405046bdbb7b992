use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::lead::{Lead, LeadChangeset, LeadFilter, NewLead};

pub struct LeadRepo;

impl LeadRepo {
    pub fn find_by_id(
        conn: &mut PgConnection,
        lead_id: Uuid,
    ) -> Result<Option<Lead>, diesel::result::Error> {
        use crate::schema::leads::dsl::*;
        leads
            .filter(id.eq(lead_id))
            .select(Lead::as_select())
            .first::<Lead>(conn)
            .optional()
    }

    /// Row-locks the lead for the rest of the transaction.
    pub fn find_for_update(
        conn: &mut PgConnection,
        lead_id: Uuid,
    ) -> Result<Option<Lead>, diesel::result::Error> {
        use crate::schema::leads::dsl::*;
        leads
            .filter(id.eq(lead_id))
            .select(Lead::as_select())
            .for_update()
            .first::<Lead>(conn)
            .optional()
    }

    pub fn lead_number_exists(
        conn: &mut PgConnection,
        number: &str,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::leads::dsl::*;
        diesel::select(diesel::dsl::exists(leads.filter(lead_number.eq(number)))).get_result(conn)
    }

    pub fn insert_many(
        conn: &mut PgConnection,
        new_leads: &[NewLead],
    ) -> Result<Vec<Lead>, diesel::result::Error> {
        if new_leads.is_empty() {
            return Ok(Vec::new());
        }
        diesel::insert_into(crate::schema::leads::table)
            .values(new_leads)
            .returning(Lead::as_returning())
            .get_results(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        lead_id: Uuid,
        changes: &LeadChangeset,
    ) -> Result<Lead, diesel::result::Error> {
        use crate::schema::leads::dsl::*;
        diesel::update(leads.filter(id.eq(lead_id)))
            .set(changes)
            .returning(Lead::as_returning())
            .get_result(conn)
    }

    pub fn list(
        conn: &mut PgConnection,
        filter: &LeadFilter,
    ) -> Result<Vec<Lead>, diesel::result::Error> {
        use crate::schema::leads::dsl::*;
        let mut query = leads.select(Lead::as_select()).into_boxed();
        if let Some(c) = filter.campaign_id {
            query = query.filter(campaign_id.eq(c));
        }
        if let Some(u) = filter.assigned_to {
            query = query.filter(assigned_to.eq(u));
        }
        if let Some(d) = filter.assigned_date {
            query = query.filter(assigned_date.eq(d));
        }
        if let Some(d) = filter.start_date {
            query = query.filter(assigned_date.ge(d));
        }
        if let Some(d) = filter.end_date {
            query = query.filter(assigned_date.le(d));
        }
        if let Some(s) = filter.sale_status {
            query = query.filter(sale_status.eq(s));
        }
        if let Some(a) = filter.admin_approved {
            query = query.filter(admin_approved.eq(a));
        }
        query
            .order((assigned_date.asc(), lead_number.asc()))
            .load::<Lead>(conn)
    }
}
