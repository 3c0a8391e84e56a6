//! Injected time source.
//!
//! Acknowledgment expiry is evaluated lazily against "now", so every
//! component that needs the current time takes a `Clock` instead of
//! calling `Utc::now()` directly.

use std::sync::Mutex;

use chrono::{Duration, NaiveDateTime, SubsecRound, Utc};

/// Drop sub-second precision. Timestamps are stored as whole seconds, so a
/// record handed back to a caller must carry the same value as its row.
pub fn whole_seconds(t: NaiveDateTime) -> NaiveDateTime {
    t.trunc_subsecs(0)
}

pub trait Clock: Send + Sync {
    /// Current time in UTC, without offset.
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        whole_seconds(Utc::now().naive_utc())
    }
}

/// Manually driven clock for simulations and tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: NaiveDateTime) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
