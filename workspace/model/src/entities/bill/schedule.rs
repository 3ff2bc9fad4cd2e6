//! Due-date projection for bills, mirroring the cadence rules onto the
//! entity so callers never touch the nullable columns directly.

use chrono::NaiveDate;

use crate::cadence::CadenceError;
use crate::entities::bill::Model as Bill;

impl Bill {
    /// The concrete due dates this bill produces between `start` and `end`:
    /// one per month (monthly) or per year (yearly) containing the horizon,
    /// each clamped to the month length.
    pub fn due_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, CadenceError> {
        Ok(self.cadence()?.due_dates(start, end))
    }

    /// The first due date on or after `from`.
    pub fn next_due(&self, from: NaiveDate) -> Result<NaiveDate, CadenceError> {
        Ok(self.cadence()?.next_due(from))
    }

    /// Whether any due date falls between `start` and `end` inclusive.
    pub fn has_any_due(&self, start: NaiveDate, end: NaiveDate) -> Result<bool, CadenceError> {
        let next = self.cadence()?.next_due(start);
        Ok(next <= end)
    }
}
