//! Derived statistics over the session history.
//!
//! Everything here is computed on demand from the full history; nothing is
//! cached or persisted.

use crate::SessionLog;
use chrono::{DateTime, FixedOffset, NaiveDate};

/// Totals shown on the dashboard
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aggregates {
    pub total_minutes: f64,
    pub total_sessions: usize,
}

/// Sum time and count sessions across the history
pub fn compute_aggregates(history: &[SessionLog]) -> Aggregates {
    let total_seconds: u64 = history.iter().map(|log| u64::from(log.total_time)).sum();
    Aggregates {
        total_minutes: total_seconds as f64 / 60.0,
        total_sessions: history.len(),
    }
}

fn local_day(log: &SessionLog, now: &DateTime<FixedOffset>) -> NaiveDate {
    log.date.with_timezone(&now.timezone()).date_naive()
}

/// Count consecutive days with a session, ending today or yesterday
///
/// Dates are reduced to calendar days in `now`'s offset. The walk goes
/// newest to oldest, comparing each entry against the last counted day:
/// - one day earlier extends the streak
/// - the same day is skipped (several sessions on one day count once)
/// - a larger gap ends the walk
///
/// If the newest session is older than yesterday the streak is zero.
pub fn compute_streak(history: &[SessionLog], now: DateTime<FixedOffset>) -> u32 {
    if history.is_empty() {
        return 0;
    }

    let mut days: Vec<NaiveDate> = history.iter().map(|log| local_day(log, &now)).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));

    let today = now.date_naive();
    let mut last_day = days[0];

    if (today - last_day).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    for day in &days[1..] {
        let gap = (last_day - *day).num_days();
        if gap == 1 {
            streak += 1;
            last_day = *day;
        } else if gap > 1 {
            break;
        }
    }

    streak
}

/// The `n` most recent sessions, newest first
///
/// History order is not trusted; entries are sorted by date.
pub fn recent_sessions(history: &[SessionLog], n: usize) -> Vec<&SessionLog> {
    let mut sorted: Vec<&SessionLog> = history.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(n);
    sorted
}
