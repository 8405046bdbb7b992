use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::allocation::{
    DailyAllocationCounter, NewDailyAllocationCounter, NewUserAllocationCounter,
    UserAllocationCounter,
};

pub struct AllocationCounterRepo;

impl AllocationCounterRepo {
    pub fn find(
        conn: &mut PgConnection,
        target_campaign_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DailyAllocationCounter>, diesel::result::Error> {
        use crate::schema::daily_allocation_counters::dsl::*;
        daily_allocation_counters
            .filter(campaign_id.eq(target_campaign_id))
            .filter(allocation_date.eq(date))
            .select(DailyAllocationCounter::as_select())
            .first(conn)
            .optional()
    }

    /// Ensures the (campaign, date) row exists and takes a row lock on it until the
    /// surrounding transaction ends. Concurrent generators for the same day queue here.
    pub fn lock_or_create(
        conn: &mut PgConnection,
        target_campaign_id: Uuid,
        date: NaiveDate,
    ) -> Result<DailyAllocationCounter, diesel::result::Error> {
        use crate::schema::daily_allocation_counters::dsl::*;
        diesel::insert_into(daily_allocation_counters)
            .values(&NewDailyAllocationCounter {
                campaign_id: target_campaign_id,
                allocation_date: date,
                generated_count: 0,
            })
            .on_conflict_do_nothing()
            .execute(conn)?;

        daily_allocation_counters
            .filter(campaign_id.eq(target_campaign_id))
            .filter(allocation_date.eq(date))
            .select(DailyAllocationCounter::as_select())
            .for_update()
            .first(conn)
    }

    pub fn list_user_counters(
        conn: &mut PgConnection,
        target_campaign_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<UserAllocationCounter>, diesel::result::Error> {
        use crate::schema::user_allocation_counters::dsl::*;
        user_allocation_counters
            .filter(campaign_id.eq(target_campaign_id))
            .filter(allocation_date.eq(date))
            .select(UserAllocationCounter::as_select())
            .load(conn)
    }

    pub fn increment(
        conn: &mut PgConnection,
        target_campaign_id: Uuid,
        date: NaiveDate,
        by: i32,
    ) -> Result<DailyAllocationCounter, diesel::result::Error> {
        use crate::schema::daily_allocation_counters::dsl::*;
        diesel::update(
            daily_allocation_counters
                .filter(campaign_id.eq(target_campaign_id))
                .filter(allocation_date.eq(date)),
        )
        .set((
            generated_count.eq(generated_count + by),
            updated_at.eq(Utc::now()),
        ))
        .returning(DailyAllocationCounter::as_returning())
        .get_result(conn)
    }

    pub fn increment_user(
        conn: &mut PgConnection,
        target_campaign_id: Uuid,
        date: NaiveDate,
        target_user_id: Uuid,
        by: i32,
    ) -> Result<(), diesel::result::Error> {
        use crate::schema::user_allocation_counters::dsl::*;
        diesel::insert_into(user_allocation_counters)
            .values(&NewUserAllocationCounter {
                campaign_id: target_campaign_id,
                allocation_date: date,
                user_id: target_user_id,
                generated_count: by,
            })
            .on_conflict((campaign_id, allocation_date, user_id))
            .do_update()
            .set((
                generated_count.eq(generated_count + by),
                updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
        Ok(())
    }
}
