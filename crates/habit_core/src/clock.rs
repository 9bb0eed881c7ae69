use chrono::{Duration, Local, NaiveDate};
use parking_lot::RwLock;

/// Source of "today" for anything that restricts or highlights the current day.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a date until told otherwise.
#[derive(Debug)]
pub struct FixedClock {
    date: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: RwLock::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.date.write() = date;
    }

    pub fn advance_days(&self, days: i64) {
        let mut date = self.date.write();
        *date = date
            .checked_add_signed(Duration::days(days))
            .unwrap_or(*date);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.read()
    }
}
