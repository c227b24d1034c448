use crate::calendar::HolidayCalendar;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A Saturday/Sunday pair. `is_long` is set when the Friday before, the
/// Saturday, the Sunday or the Monday after is a holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendUnit {
    pub saturday: NaiveDate,
    pub sunday: NaiveDate,
    pub is_long: bool,
}

impl WeekendUnit {
    pub fn new(saturday: NaiveDate, calendar: &HolidayCalendar) -> Self {
        Self {
            saturday,
            sunday: saturday + Duration::days(1),
            is_long: is_long_weekend(saturday, calendar),
        }
    }

    pub fn friday(&self) -> NaiveDate {
        self.saturday - Duration::days(1)
    }

    pub fn monday(&self) -> NaiveDate {
        self.saturday + Duration::days(2)
    }

    /// Friday through Monday.
    pub fn span(&self) -> [NaiveDate; 4] {
        [self.friday(), self.saturday, self.sunday, self.monday()]
    }

    /// Both weekend days fall in `year`.
    pub fn within_year(&self, year: i32) -> bool {
        self.saturday.year() == year && self.sunday.year() == year
    }
}

/// First Saturday on or after January 1st.
pub fn first_saturday(year: i32) -> Option<NaiveDate> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = (7 + Weekday::Sat.num_days_from_monday() - jan_first.weekday().num_days_from_monday()) % 7;
    Some(jan_first + Duration::days(i64::from(offset)))
}

pub fn is_long_weekend(saturday: NaiveDate, calendar: &HolidayCalendar) -> bool {
    [
        saturday - Duration::days(1),
        saturday,
        saturday + Duration::days(1),
        saturday + Duration::days(2),
    ]
    .into_iter()
    .any(|date| calendar.is_holiday(date))
}

/// One unit per Saturday of `year`, in chronological order.
pub fn weekends_of(year: i32, calendar: &HolidayCalendar) -> Vec<WeekendUnit> {
    let Some(mut saturday) = first_saturday(year) else {
        return Vec::new();
    };
    let mut weekends = Vec::with_capacity(53);
    while saturday.year() == year {
        weekends.push(WeekendUnit::new(saturday, calendar));
        saturday += Duration::days(7);
    }
    weekends
}
