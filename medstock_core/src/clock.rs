//! Source of "today" for the stock ledger.
//!
//! Every date check in the crate goes through a [`Clock`] so tests (and the
//! CLI's `--today` override) can pin the calendar date.

use chrono::{Days, Local, NaiveDate};
use std::sync::{Arc, RwLock};

/// Supplies the current calendar date (no time component)
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the local system date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable clock for deterministic tests
///
/// Clones share the same date, so a test can hand one copy to a store and
/// another to the ledger and move both forward together.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<RwLock<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(RwLock::new(date)),
        }
    }

    /// Move the clock to a specific date
    pub fn set(&self, date: NaiveDate) {
        let mut guard = self.date.write().unwrap_or_else(|e| e.into_inner());
        *guard = date;
    }

    /// Move the clock forward by a number of days
    pub fn advance_days(&self, days: u64) {
        let mut guard = self.date.write().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = guard.checked_add_days(Days::new(days)) {
            *guard = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
