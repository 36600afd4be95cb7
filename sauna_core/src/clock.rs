//! Time source abstraction.
//!
//! Session logs are stamped and streaks are computed from a `Clock` so tests
//! can pin "now" to a known instant and offset.

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Provides the current instant
pub trait Clock {
    /// Current instant, used to stamp session logs
    fn now(&self) -> DateTime<Utc>;

    /// Current instant in the user's local offset, used for calendar-day math
    fn now_local(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the system's local timezone
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock frozen at a fixed instant
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    at: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self { at }
    }

    /// Parse an RFC 3339 timestamp, keeping its offset as the local offset
    pub fn parse(s: &str) -> crate::Result<Self> {
        let at = DateTime::parse_from_rfc3339(s)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?;
        Ok(Self::new(at))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at.with_timezone(&Utc)
    }

    fn now_local(&self) -> DateTime<FixedOffset> {
        self.at
    }
}
