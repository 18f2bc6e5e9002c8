//! Date-range chunking for aggregate requests.
//!
//! The aggregates endpoint caps each response at 50,000 rows. At ~960
//! 1-minute bars per extended-hours trading day that allows ~52 days per
//! request, so job windows are split into sub-windows of at most
//! [`MAX_DAYS_PER_WINDOW`] calendar days before fetching.

use chrono::{DateTime, Days, NaiveTime, Utc};

/// Maximum calendar days per aggregates request (50 × 960 = 48,000 < 50,000).
pub const MAX_DAYS_PER_WINDOW: u64 = 50;

/// Split `[from, to]` into ordered inclusive windows of at most `max_days`
/// calendar days each.
///
/// Windows cover the input contiguously with no gaps or overlaps; the last
/// window may be shorter. Returns an empty list iff `from > to`.
#[must_use]
pub fn split_date_range(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    max_days: u64,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut windows = Vec::new();
    if from > to || max_days == 0 {
        return windows;
    }

    let mut current_start = from;
    loop {
        let mut current_end = current_start + Days::new(max_days - 1);
        if current_end > to {
            current_end = to;
        }

        windows.push((current_start, current_end));

        if current_end == to {
            break;
        }
        current_start = current_end + Days::new(1);
    }

    windows
}

/// Clamp the final window's end to yesterday 23:59:59 UTC when it falls on
/// or after the current UTC day.
///
/// The upstream marks windows touching the current day as not finalized
/// (DELAYED); pulling the end back one day avoids requesting them. Interior
/// windows pass through unchanged.
#[must_use]
pub fn adjust_last_window(
    window_end: DateTime<Utc>,
    is_last: bool,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if !is_last {
        return window_end;
    }
    let today = now.date_naive();
    if window_end.date_naive() >= today {
        let yesterday = today - Days::new(1);
        #[allow(clippy::expect_used)]
        let end_of_day = yesterday
            .and_time(NaiveTime::from_hms_opt(23, 59, 59).expect("23:59:59 is a valid time"))
            .and_utc();
        return end_of_day;
    }
    window_end
}
