//! Window selection for annually recurring dates.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeMap;

/// Days a Monday digest looks back to pick up the preceding weekend.
const MONDAY_LOOKBACK_DAYS: i64 = 2;
/// Minimum forward distance after which a Monday treats the occurrence as
/// belonging to the previous year.
const PREVIOUS_YEAR_THRESHOLD_DAYS: i64 = 363;
const DAYS_IN_LONG_YEAR: i64 = 366;

/// Bucket index to display texts, in discovery order.
///
/// Keys are weekday indices (`0` = Monday .. `4` = Friday); weekend
/// occurrences are folded into `0`.
pub type Digest = BTreeMap<usize, Vec<String>>;

/// One annually recurring date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualEvent {
    pub display_text: String,
    pub month: u32,
    pub day: u32,
    /// Year of the stored date. Only used to decide Feb-29 handling.
    pub origin_year: i32,
}

impl AnnualEvent {
    pub fn new(display_text: impl Into<String>, month: u32, day: u32, origin_year: i32) -> Self {
        Self {
            display_text: display_text.into(),
            month,
            day,
            origin_year,
        }
    }

    /// Builds an event recurring on the month/day of `date`.
    pub fn from_date(display_text: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(display_text, date.month(), date.day(), date.year())
    }

    /// Returns the occurrence of this event in `year`.
    ///
    /// Feb-29 maps to Feb-28 in common years, unless the origin year itself
    /// was not a leap year (such a date cannot exist and is skipped).
    pub fn occurrence_in(&self, year: i32) -> Option<NaiveDate> {
        if self.month == 2 && self.day == 29 && !is_leap_year(year) {
            if !is_leap_year(self.origin_year) {
                return None;
            }
            return NaiveDate::from_ymd_opt(year, 2, 28);
        }
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

/// Selects events occurring within `window_days` of `reference`.
///
/// On Mondays the window starts two days earlier so that weekend occurrences
/// are still announced. Every kept event lands in the bucket of its weekday,
/// Saturday and Sunday going to Monday.
pub fn next_occurrences(events: &[AnnualEvent], window_days: u32, reference: NaiveDate) -> Digest {
    let mut digest = Digest::new();
    if window_days == 0 {
        return digest;
    }

    let window = i64::from(window_days);
    let is_monday = reference.weekday() == Weekday::Mon;
    let min_delta = if is_monday { -MONDAY_LOOKBACK_DAYS } else { 0 };
    let year = reference.year();

    for event in events {
        let Some(mut occurrence) = event.occurrence_in(year) else {
            continue;
        };
        let mut delta = (occurrence - reference).num_days();

        if delta < min_delta {
            if -delta <= DAYS_IN_LONG_YEAR - window {
                continue;
            }
            let Some(next) = event.occurrence_in(year + 1) else {
                continue;
            };
            occurrence = next;
            delta = (occurrence - reference).num_days();
        } else if delta >= PREVIOUS_YEAR_THRESHOLD_DAYS && is_monday {
            let Some(previous) = event.occurrence_in(year - 1) else {
                continue;
            };
            occurrence = previous;
            delta = (occurrence - reference).num_days();
        }

        if delta < min_delta || delta >= min_delta + window {
            continue;
        }

        digest
            .entry(bucket_for(occurrence))
            .or_default()
            .push(event.display_text.clone());
    }

    digest
}

fn bucket_for(occurrence: NaiveDate) -> usize {
    let index = occurrence.weekday().num_days_from_monday() as usize;
    if index >= 5 {
        0
    } else {
        index
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
