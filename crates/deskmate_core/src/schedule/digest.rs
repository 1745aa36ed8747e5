//! Text rendering for scheduler digests.

use super::occurrence::Digest;
use crate::field::format_date;
use chrono::{Days, NaiveDate};

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const DAYS_PER_WEEK: u32 = 7;

/// Output layout for a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestLayout {
    /// `Label: a, b` with entries sorted alphabetically.
    Compact,
    /// `Label:` header followed by one indented line per entry, discovery
    /// order.
    Detailed,
}

/// Renders non-empty buckets of `digest`.
///
/// Windows of up to a week walk all seven weekday buckets, not only the
/// first `window_days`; a 2-day window still prints a Wednesday bucket.
/// These buckets are labeled with weekday names. Longer windows label bucket
/// `i` with the date `reference + i`, which does not match the weekday
/// semantics of the bucket keys; callers relying on the date labels should
/// keep windows within a week.
pub fn render_digest(
    digest: &Digest,
    window_days: u32,
    reference: NaiveDate,
    layout: DigestLayout,
) -> Vec<String> {
    let weekly = window_days <= DAYS_PER_WEEK;
    let bucket_count = if weekly { DAYS_PER_WEEK } else { window_days };

    let mut lines = Vec::new();
    for index in 0..bucket_count as usize {
        let Some(entries) = digest.get(&index).filter(|entries| !entries.is_empty()) else {
            continue;
        };
        let label = if weekly {
            WEEKDAY_NAMES[index].to_string()
        } else {
            reference
                .checked_add_days(Days::new(index as u64))
                .map(format_date)
                .unwrap_or_else(|| format!("+{index}"))
        };

        match layout {
            DigestLayout::Compact => {
                let mut sorted = entries.clone();
                sorted.sort();
                lines.push(format!("{label}: {}", sorted.join(", ")));
            }
            DigestLayout::Detailed => {
                lines.push(format!("{label}:"));
                lines.extend(entries.iter().map(|entry| format!("    {entry}")));
            }
        }
    }
    lines
}
