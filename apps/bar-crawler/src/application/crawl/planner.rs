//! Resume planner: derives fetch jobs from the ticker list and progress.
//!
//! Tickers without recorded progress get one large backfill job (the
//! chunker subdivides it later); tickers with progress get one single-day
//! job per missing calendar day, which keeps gap-fill request payloads
//! small and lets failures re-run day by day.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};

use crate::domain::Job;

/// Years of history fetched for a ticker never seen before.
const BACKFILL_YEARS: i32 = 2;

/// Compute the jobs for one crawl cycle.
///
/// - Ticker absent from `progress`: one job `[today - 2 years, now + 1 day]`.
/// - Ticker present with last date `d`: one job per calendar day in
///   `[d + 1, yesterday]`; nothing when already current.
/// - An unparsable progress date falls back to the full backfill.
#[must_use]
pub fn plan_jobs(
    tickers: &[String],
    progress: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> Vec<Job> {
    let today = now.date_naive();
    let yesterday = today - Days::new(1);

    let mut jobs = Vec::new();
    for ticker in tickers {
        let last = progress
            .get(ticker)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        let Some(last) = last else {
            jobs.push(backfill_job(ticker, now, today));
            continue;
        };

        let start = last + Days::new(1);
        if start > yesterday {
            continue; // already current
        }
        let mut day = start;
        while day <= yesterday {
            jobs.push(day_job(ticker, day));
            day = day + Days::new(1);
        }
    }
    jobs
}

fn backfill_job(ticker: &str, now: DateTime<Utc>, today: NaiveDate) -> Job {
    let from_date = two_years_before(today);
    Job {
        ticker: ticker.to_string(),
        from: from_date.and_time(NaiveTime::MIN).and_utc(),
        to: now + Days::new(1),
    }
}

fn day_job(ticker: &str, day: NaiveDate) -> Job {
    #[allow(clippy::expect_used)]
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid time");
    Job {
        ticker: ticker.to_string(),
        from: day.and_time(NaiveTime::MIN).and_utc(),
        to: day.and_time(end_of_day).and_utc(),
    }
}

/// Same month/day two years earlier; Feb 29 lands on Mar 1.
fn two_years_before(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() - BACKFILL_YEARS, date.month(), date.day())
        .unwrap_or_else(|| {
            #[allow(clippy::expect_used)]
            NaiveDate::from_ymd_opt(date.year() - BACKFILL_YEARS, 3, 1).expect("Mar 1 exists")
        })
}
