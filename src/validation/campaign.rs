use chrono::NaiveDate;

use crate::error::AppError;

const MAX_DAILY_QUOTA: i32 = 10_000;

pub fn validate_daily_quota(daily_quota: i32) -> Result<(), AppError> {
    if daily_quota < 0 {
        return Err(AppError::invalid_field(
            "daily_quota",
            "OUT_OF_RANGE",
            "Daily quota cannot be negative",
        ));
    }
    if daily_quota > MAX_DAILY_QUOTA {
        return Err(AppError::invalid_field(
            "daily_quota",
            "OUT_OF_RANGE",
            format!("Daily quota cannot exceed {}", MAX_DAILY_QUOTA),
        ));
    }
    Ok(())
}

/// Inclusive `[start, end]` window of at most `max_days` days.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate, max_days: i64) -> Result<(), AppError> {
    if end < start {
        return Err(AppError::invalid_field(
            "end_date",
            "INVALID_RANGE",
            "end_date must not be before start_date",
        ));
    }
    let days = (end - start).num_days() + 1;
    if days > max_days {
        return Err(AppError::invalid_field(
            "end_date",
            "RANGE_TOO_LARGE",
            format!("Date range spans {} days, the maximum is {}", days, max_days),
        ));
    }
    Ok(())
}
