//! Recurrence rules for bills.
//!
//! A bill is due either on a fixed day of every month or on a fixed
//! month/day every year. The storage schema keeps these as nullable sibling
//! columns; in process the rule is always this sum type, so exactly one
//! variant's fields exist and the mutual-exclusivity invariant cannot be
//! violated after construction.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::entities::bill::BillPeriod;

/// Cadence field combinations rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CadenceError {
    #[error("due_day {0} is outside 1-31")]
    DueDayOutOfRange(i32),
    #[error("due_month {0} is outside 1-12")]
    DueMonthOutOfRange(i32),
    #[error("due_dom {0} is outside 1-31")]
    DueDomOutOfRange(i32),
    #[error("monthly bills require due_day")]
    MissingDueDay,
    #[error("monthly bills take due_day only, but yearly fields are set")]
    MonthlyWithYearlyFields,
    #[error("yearly bills require both due_month and due_dom")]
    MissingYearlyFields,
    #[error("yearly bills take due_month and due_dom only, but due_day is set")]
    YearlyWithMonthlyField,
}

/// A bill's recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Due on `due_day` of every month, clamped to the month length.
    Monthly { due_day: u32 },
    /// Due every year on `due_month`/`due_dom`, clamped to the month length.
    Yearly { due_month: u32, due_dom: u32 },
}

impl Cadence {
    pub fn monthly(due_day: i32) -> Result<Self, CadenceError> {
        if !(1..=31).contains(&due_day) {
            return Err(CadenceError::DueDayOutOfRange(due_day));
        }
        Ok(Cadence::Monthly {
            due_day: due_day as u32,
        })
    }

    pub fn yearly(due_month: i32, due_dom: i32) -> Result<Self, CadenceError> {
        if !(1..=12).contains(&due_month) {
            return Err(CadenceError::DueMonthOutOfRange(due_month));
        }
        if !(1..=31).contains(&due_dom) {
            return Err(CadenceError::DueDomOutOfRange(due_dom));
        }
        Ok(Cadence::Yearly {
            due_month: due_month as u32,
            due_dom: due_dom as u32,
        })
    }

    /// Builds the rule from the persisted sibling columns, enforcing that
    /// exactly one cadence's fields are populated.
    pub fn from_columns(
        period: BillPeriod,
        due_day: Option<i32>,
        due_month: Option<i32>,
        due_dom: Option<i32>,
    ) -> Result<Self, CadenceError> {
        match period {
            BillPeriod::Monthly => {
                if due_month.is_some() || due_dom.is_some() {
                    return Err(CadenceError::MonthlyWithYearlyFields);
                }
                Cadence::monthly(due_day.ok_or(CadenceError::MissingDueDay)?)
            }
            BillPeriod::Yearly => {
                if due_day.is_some() {
                    return Err(CadenceError::YearlyWithMonthlyField);
                }
                match (due_month, due_dom) {
                    (Some(month), Some(dom)) => Cadence::yearly(month, dom),
                    _ => Err(CadenceError::MissingYearlyFields),
                }
            }
        }
    }

    /// One clamped due date per month (monthly) or per year (yearly), from
    /// the period containing `start` through the period containing `end`.
    pub fn due_dates(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        if end < start {
            return dates;
        }

        match *self {
            Cadence::Monthly { due_day } => {
                let mut year = start.year();
                let mut month = start.month();
                loop {
                    dates.push(clamped_date(year, month, due_day));
                    if year == end.year() && month == end.month() {
                        break;
                    }
                    month += 1;
                    if month > 12 {
                        month = 1;
                        year += 1;
                    }
                }
            }
            Cadence::Yearly { due_month, due_dom } => {
                for year in start.year()..=end.year() {
                    dates.push(clamped_date(year, due_month, due_dom));
                }
            }
        }

        dates
    }

    /// The first due date on or after `from`.
    pub fn next_due(&self, from: NaiveDate) -> NaiveDate {
        match *self {
            Cadence::Monthly { due_day } => {
                let this_month = clamped_date(from.year(), from.month(), due_day);
                if this_month >= from {
                    return this_month;
                }
                let (year, month) = if from.month() == 12 {
                    (from.year() + 1, 1)
                } else {
                    (from.year(), from.month() + 1)
                };
                clamped_date(year, month, due_day)
            }
            Cadence::Yearly { due_month, due_dom } => {
                let this_year = clamped_date(from.year(), due_month, due_dom);
                if this_year >= from {
                    return this_year;
                }
                clamped_date(from.year() + 1, due_month, due_dom)
            }
        }
    }
}

/// Returns the number of days in the given month using chrono.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    // First day of the next month, stepped back by one day.
    let next_month_year = year + (month / 12) as i32;
    let next_month = (month % 12) + 1;
    let first_day_next_month = NaiveDate::from_ymd_opt(next_month_year, next_month, 1).unwrap();
    first_day_next_month.pred_opt().unwrap().day()
}

/// A concrete date with the day clamped to the month length, so "day 31 of
/// April" resolves to April 30 instead of erroring.
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn test_monthly_clamps_to_month_length() {
        let cadence = Cadence::monthly(31).unwrap();
        let dates = cadence.due_dates(date(2025, 1, 1), date(2025, 4, 30));
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30),
            ]
        );
    }

    #[test]
    fn test_monthly_clamp_respects_leap_years() {
        let cadence = Cadence::monthly(31).unwrap();
        let dates = cadence.due_dates(date(2024, 2, 1), date(2024, 2, 28));
        assert_eq!(dates, vec![date(2024, 2, 29)]);
    }

    #[test]
    fn test_monthly_iterates_months_containing_the_horizon() {
        // The horizon endpoints fall mid-month; both end months still count.
        let cadence = Cadence::monthly(5).unwrap();
        let dates = cadence.due_dates(date(2025, 11, 20), date(2026, 1, 10));
        assert_eq!(
            dates,
            vec![date(2025, 11, 5), date(2025, 12, 5), date(2026, 1, 5)]
        );
    }

    #[test]
    fn test_yearly_clamps_feb_29() {
        let cadence = Cadence::yearly(2, 29).unwrap();
        assert_eq!(
            cadence.due_dates(date(2023, 1, 1), date(2024, 12, 31)),
            vec![date(2023, 2, 28), date(2024, 2, 29)]
        );
    }

    #[test]
    fn test_due_dates_empty_for_inverted_horizon() {
        let cadence = Cadence::monthly(1).unwrap();
        assert!(
            cadence
                .due_dates(date(2025, 2, 1), date(2025, 1, 1))
                .is_empty()
        );
    }

    #[test]
    fn test_next_due_monthly() {
        let cadence = Cadence::monthly(15).unwrap();
        assert_eq!(cadence.next_due(date(2025, 3, 10)), date(2025, 3, 15));
        assert_eq!(cadence.next_due(date(2025, 3, 15)), date(2025, 3, 15));
        assert_eq!(cadence.next_due(date(2025, 3, 16)), date(2025, 4, 15));
        // December rolls into the next year
        assert_eq!(cadence.next_due(date(2025, 12, 20)), date(2026, 1, 15));
    }

    #[test]
    fn test_next_due_monthly_clamped() {
        let cadence = Cadence::monthly(31).unwrap();
        assert_eq!(cadence.next_due(date(2025, 2, 10)), date(2025, 2, 28));
    }

    #[test]
    fn test_next_due_yearly() {
        let cadence = Cadence::yearly(3, 3).unwrap();
        assert_eq!(cadence.next_due(date(2025, 3, 1)), date(2025, 3, 3));
        assert_eq!(cadence.next_due(date(2025, 3, 4)), date(2026, 3, 3));
    }

    #[test]
    fn test_from_columns_enforces_mutual_exclusivity() {
        assert_eq!(
            Cadence::from_columns(BillPeriod::Monthly, Some(15), None, None),
            Ok(Cadence::Monthly { due_day: 15 })
        );
        assert_eq!(
            Cadence::from_columns(BillPeriod::Monthly, Some(15), Some(3), None),
            Err(CadenceError::MonthlyWithYearlyFields)
        );
        assert_eq!(
            Cadence::from_columns(BillPeriod::Monthly, None, None, None),
            Err(CadenceError::MissingDueDay)
        );
        assert_eq!(
            Cadence::from_columns(BillPeriod::Yearly, None, Some(3), Some(3)),
            Ok(Cadence::Yearly {
                due_month: 3,
                due_dom: 3
            })
        );
        assert_eq!(
            Cadence::from_columns(BillPeriod::Yearly, Some(1), Some(3), Some(3)),
            Err(CadenceError::YearlyWithMonthlyField)
        );
        assert_eq!(
            Cadence::from_columns(BillPeriod::Yearly, None, Some(3), None),
            Err(CadenceError::MissingYearlyFields)
        );
    }

    #[test]
    fn test_constructors_reject_out_of_range_fields() {
        assert_eq!(Cadence::monthly(0), Err(CadenceError::DueDayOutOfRange(0)));
        assert_eq!(
            Cadence::monthly(32),
            Err(CadenceError::DueDayOutOfRange(32))
        );
        assert_eq!(
            Cadence::yearly(13, 1),
            Err(CadenceError::DueMonthOutOfRange(13))
        );
        assert_eq!(
            Cadence::yearly(2, 0),
            Err(CadenceError::DueDomOutOfRange(0))
        );
    }
}
