use chrono::{Datelike, Duration, NaiveDate, Weekday};
use entity::leave_requests::LeaveKind;

use crate::{DomainError, DomainResult};

/// Longest single request, in calendar days.
pub const MAX_SPAN_DAYS: i64 = 90;

fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Inclusive count of Monday–Friday dates between `start` and `end`.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> i32 {
    if end < start {
        return 0;
    }
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if is_working_day(day) {
            count += 1;
        }
        day += Duration::days(1);
    }
    count
}

/// Working days of `[start, end]` that fall inside `[window_start, window_end]`.
pub fn overlapping_working_days(
    start: NaiveDate,
    end: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> i32 {
    working_days(start.max(window_start), end.min(window_end))
}

/// Validates a new request and returns the working days it covers.
pub fn validate_request(
    kind: LeaveKind,
    start: NaiveDate,
    end: NaiveDate,
    balance: i32,
) -> DomainResult<i32> {
    if end < start {
        return Err(DomainError::invalid("end date is before start date"));
    }
    if (end - start).num_days() >= MAX_SPAN_DAYS {
        return Err(DomainError::invalid(format!(
            "a single request may span at most {MAX_SPAN_DAYS} days"
        )));
    }
    let days = working_days(start, end);
    if days == 0 {
        return Err(DomainError::invalid("request covers no working days"));
    }
    ensure_balance(kind, days, balance)?;
    Ok(days)
}

/// Paid kinds must fit within the remaining balance.
pub fn ensure_balance(kind: LeaveKind, days: i32, balance: i32) -> DomainResult<()> {
    if kind.is_paid() && days > balance {
        return Err(DomainError::InsufficientBalance {
            requested: days,
            available: balance,
        });
    }
    Ok(())
}
