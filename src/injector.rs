//! Communal turns for days the weekend pass never reaches.

use crate::calendar::HolidayCalendar;
use crate::turn::{DuplicateDate, TurnAssignment, TurnSet};
use chrono::{Datelike, NaiveDate, Weekday};

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every Monday–Friday holiday of `year` that is still unclaimed becomes a
/// Shared turn noted with the holiday name. Returns how many were added.
pub fn inject_weekday_holidays(
    year: i32,
    calendar: &HolidayCalendar,
    claimed: &mut TurnSet,
) -> Result<usize, DuplicateDate> {
    let pending: Vec<NaiveDate> = calendar
        .holidays_in_year(year)
        .filter(|date| is_weekday(*date) && !claimed.is_claimed(*date))
        .collect();
    for date in &pending {
        let notes = calendar.holiday_name(*date).map(str::to_string);
        claimed.insert(TurnAssignment::shared(*date).with_notes(notes))?;
    }
    Ok(pending.len())
}

/// Weekend days of `year` that no in-year weekend unit covers: a Sunday
/// January 1st, and a Saturday December 31st whose Sunday belongs to the
/// next year. Unclaimed ones become Shared turns.
pub fn inject_boundary_weekend_days(
    year: i32,
    calendar: &HolidayCalendar,
    claimed: &mut TurnSet,
) -> Result<usize, DuplicateDate> {
    let candidates = [
        NaiveDate::from_ymd_opt(year, 1, 1).filter(|date| date.weekday() == Weekday::Sun),
        NaiveDate::from_ymd_opt(year, 12, 31).filter(|date| date.weekday() == Weekday::Sat),
    ];
    let mut added = 0;
    for date in candidates.into_iter().flatten() {
        if claimed.is_claimed(date) {
            continue;
        }
        let notes = calendar.holiday_name(date).map(str::to_string);
        claimed.insert(TurnAssignment::shared(date).with_notes(notes))?;
        added += 1;
    }
    Ok(added)
}
