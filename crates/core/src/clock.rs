//! # Clock Module
//!
//! Wall-clock seam for cooldowns, expiry, and audit timestamps. The engine
//! stores and compares UTC; the fixed local offset exists only for display.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::sync::Mutex;

/// Hours east of UTC for display-side local time (the deployment's zone).
pub const LOCAL_OFFSET_HOURS: i32 = 3;

/// Render a UTC timestamp in the fixed local zone.
pub fn local_time(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(LOCAL_OFFSET_HOURS * 3600).expect("valid fixed offset");
    at.with_timezone(&offset)
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock advanced explicitly. Never moves backwards.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
