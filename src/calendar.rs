use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Holiday table for one jurisdiction over an inclusive range of years.
///
/// Dates outside the configured range are never reported as holidays, even
/// when the same month/day is a holiday inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    jurisdiction: String,
    first_year: i32,
    last_year: i32,
    holidays: BTreeMap<NaiveDate, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendarConfig {
    jurisdiction: String,
    first_year: i32,
    last_year: i32,
    holidays: Vec<HolidayEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("holiday calendar year range {first_year}..={last_year} is empty")]
    EmptyYearRange { first_year: i32, last_year: i32 },
    #[error("holiday {date} ({name}) is outside the calendar range {first_year}..={last_year}")]
    HolidayOutsideRange {
        date: NaiveDate,
        name: String,
        first_year: i32,
        last_year: i32,
    },
}

// Argentina 2026, including the movable dates already shifted to Monday.
const ARGENTINA_2026: [(u32, u32, &str); 18] = [
    (1, 1, "Año Nuevo"),
    (2, 16, "Carnaval"),
    (2, 17, "Carnaval"),
    (3, 24, "Día de la Memoria por la Verdad y la Justicia"),
    (4, 2, "Día del Veterano y de los Caídos en Malvinas"),
    (4, 3, "Viernes Santo"),
    (4, 5, "Pascua"),
    (4, 6, "Lunes de Pascua"),
    (5, 1, "Día del Trabajador"),
    (5, 25, "Revolución de Mayo"),
    (6, 15, "Paso a la Inmortalidad de Güemes"),
    (6, 20, "Día de la Bandera"),
    (7, 9, "Día de la Independencia"),
    (8, 17, "Paso a la Inmortalidad de San Martín"),
    (10, 12, "Día del Respeto a la Diversidad Cultural"),
    (11, 23, "Día de la Soberanía Nacional"),
    (12, 8, "Inmaculada Concepción de María"),
    (12, 25, "Navidad"),
];

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::argentina_2026()
    }
}

impl HolidayCalendar {
    /// Empty calendar covering `first_year..=last_year`; the bounds are
    /// swapped when given in reverse.
    pub fn with_year_range(jurisdiction: impl Into<String>, first_year: i32, last_year: i32) -> Self {
        let (first_year, last_year) = if first_year <= last_year {
            (first_year, last_year)
        } else {
            (last_year, first_year)
        };
        Self {
            jurisdiction: jurisdiction.into(),
            first_year,
            last_year,
            holidays: BTreeMap::new(),
        }
    }

    /// Built-in national holiday table for Argentina, 2026.
    pub fn argentina_2026() -> Self {
        let mut calendar = Self::with_year_range("AR", 2026, 2026);
        for (month, day, name) in ARGENTINA_2026 {
            if let Some(date) = NaiveDate::from_ymd_opt(2026, month, day) {
                calendar.holidays.insert(date, name.to_string());
            }
        }
        calendar
    }

    pub fn from_config(config: &HolidayCalendarConfig) -> Result<Self, CalendarError> {
        if config.first_year > config.last_year {
            return Err(CalendarError::EmptyYearRange {
                first_year: config.first_year,
                last_year: config.last_year,
            });
        }
        let mut calendar =
            Self::with_year_range(config.jurisdiction.clone(), config.first_year, config.last_year);
        for entry in &config.holidays {
            calendar.add_holiday(entry.date, entry.name.clone())?;
        }
        Ok(calendar)
    }

    pub fn to_config(&self) -> HolidayCalendarConfig {
        HolidayCalendarConfig::from(self)
    }

    /// Add a holiday inside the covered year range.
    pub fn add_holiday(&mut self, date: NaiveDate, name: impl Into<String>) -> Result<(), CalendarError> {
        let name = name.into();
        if !self.covers_year(date.year()) {
            return Err(CalendarError::HolidayOutsideRange {
                date,
                name,
                first_year: self.first_year,
                last_year: self.last_year,
            });
        }
        self.holidays.insert(date, name);
        Ok(())
    }

    pub fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    pub fn year_range(&self) -> (i32, i32) {
        (self.first_year, self.last_year)
    }

    pub fn covers_year(&self, year: i32) -> bool {
        (self.first_year..=self.last_year).contains(&year)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.covers_year(date.year()) && self.holidays.contains_key(&date)
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// True for Saturdays, Sundays and holidays.
    pub fn is_weekend_or_holiday(&self, date: NaiveDate) -> bool {
        Self::is_weekend(date) || self.is_holiday(date)
    }

    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        if !self.covers_year(date.year()) {
            return None;
        }
        self.holidays.get(&date).map(String::as_str)
    }

    /// Holidays of `year` in chronological order.
    pub fn holidays_in_year(&self, year: i32) -> impl Iterator<Item = NaiveDate> + '_ {
        let in_range = self.covers_year(year);
        self.holidays
            .keys()
            .copied()
            .filter(move |date| in_range && date.year() == year)
    }

    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }
}

impl HolidayCalendarConfig {
    pub fn new<I>(jurisdiction: impl Into<String>, first_year: i32, last_year: i32, holidays: I) -> Self
    where
        I: IntoIterator<Item = HolidayEntry>,
    {
        let mut holidays: Vec<HolidayEntry> = holidays.into_iter().collect();
        holidays.sort_by_key(|entry| entry.date);
        holidays.dedup_by_key(|entry| entry.date);
        Self {
            jurisdiction: jurisdiction.into(),
            first_year,
            last_year,
            holidays,
        }
    }

    pub fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    pub fn first_year(&self) -> i32 {
        self.first_year
    }

    pub fn last_year(&self) -> i32 {
        self.last_year
    }

    pub fn holidays(&self) -> &[HolidayEntry] {
        &self.holidays
    }
}

impl Default for HolidayCalendarConfig {
    fn default() -> Self {
        HolidayCalendarConfig::from(&HolidayCalendar::default())
    }
}

impl From<&HolidayCalendar> for HolidayCalendarConfig {
    fn from(calendar: &HolidayCalendar) -> Self {
        let holidays = calendar
            .holidays
            .iter()
            .map(|(date, name)| HolidayEntry {
                date: *date,
                name: name.clone(),
            })
            .collect();
        Self {
            jurisdiction: calendar.jurisdiction.clone(),
            first_year: calendar.first_year,
            last_year: calendar.last_year,
            holidays,
        }
    }
}
