use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::{AssignmentStatus, CampaignStatus};
use crate::db::models::campaign::{Campaign, CampaignAssignment, NewCampaignAssignment};

pub struct CampaignRepo;

impl CampaignRepo {
    pub fn find_by_id(
        conn: &mut PgConnection,
        campaign_id: Uuid,
    ) -> Result<Option<Campaign>, diesel::result::Error> {
        use crate::schema::campaigns::dsl::*;
        campaigns
            .filter(id.eq(campaign_id))
            .select(Campaign::as_select())
            .first::<Campaign>(conn)
            .optional()
    }

    pub fn list(
        conn: &mut PgConnection,
        status_filter: Option<CampaignStatus>,
    ) -> Result<Vec<Campaign>, diesel::result::Error> {
        use crate::schema::campaigns::dsl::*;
        let mut query = campaigns.select(Campaign::as_select()).into_boxed();
        if let Some(s) = status_filter {
            query = query.filter(status.eq(s));
        }
        query.order(start_date.desc()).load::<Campaign>(conn)
    }

    pub fn update_status(
        conn: &mut PgConnection,
        campaign_id: Uuid,
        new_status: CampaignStatus,
    ) -> Result<Campaign, diesel::result::Error> {
        use crate::schema::campaigns::dsl::*;
        diesel::update(campaigns.filter(id.eq(campaign_id)))
            .set((status.eq(new_status), updated_at.eq(Utc::now())))
            .returning(Campaign::as_returning())
            .get_result(conn)
    }
}

pub struct AssignmentRepo;

impl AssignmentRepo {
    pub fn list_by_campaign(
        conn: &mut PgConnection,
        target_campaign_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<CampaignAssignment>, diesel::result::Error> {
        use crate::schema::campaign_assignments::dsl::*;
        let mut query = campaign_assignments
            .filter(campaign_id.eq(target_campaign_id))
            .select(CampaignAssignment::as_select())
            .into_boxed();
        if only_active {
            query = query.filter(status.eq(AssignmentStatus::Active));
        }
        query
            .order((created_at.asc(), user_id.asc()))
            .load::<CampaignAssignment>(conn)
    }

    pub fn find(
        conn: &mut PgConnection,
        target_campaign_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<Option<CampaignAssignment>, diesel::result::Error> {
        use crate::schema::campaign_assignments::dsl::*;
        campaign_assignments
            .filter(campaign_id.eq(target_campaign_id))
            .filter(user_id.eq(target_user_id))
            .select(CampaignAssignment::as_select())
            .first::<CampaignAssignment>(conn)
            .optional()
    }

    /// Inserts the assignment or, when the pair already exists, reactivates it with the new quota.
    pub fn upsert(
        conn: &mut PgConnection,
        new_assignment: &NewCampaignAssignment,
    ) -> Result<CampaignAssignment, diesel::result::Error> {
        use crate::schema::campaign_assignments::dsl::*;
        diesel::insert_into(campaign_assignments)
            .values(new_assignment)
            .on_conflict((campaign_id, user_id))
            .do_update()
            .set((
                status.eq(new_assignment.status),
                daily_quota.eq(new_assignment.daily_quota),
                updated_at.eq(Utc::now()),
            ))
            .returning(CampaignAssignment::as_returning())
            .get_result(conn)
    }

    pub fn set_status(
        conn: &mut PgConnection,
        target_campaign_id: Uuid,
        target_user_id: Uuid,
        new_status: AssignmentStatus,
    ) -> Result<Option<CampaignAssignment>, diesel::result::Error> {
        use crate::schema::campaign_assignments::dsl::*;
        diesel::update(
            campaign_assignments
                .filter(campaign_id.eq(target_campaign_id))
                .filter(user_id.eq(target_user_id)),
        )
        .set((status.eq(new_status), updated_at.eq(Utc::now())))
        .returning(CampaignAssignment::as_returning())
        .get_result(conn)
        .optional()
    }
}
