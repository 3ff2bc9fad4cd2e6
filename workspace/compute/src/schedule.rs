//! Occurrence generation: turning a bill's cadence into concrete, dated
//! payment-occurrence rows.
//!
//! Generation is idempotent. The `(bill_id, due_date)` natural key is
//! checked before every insert and enforced by a unique index underneath,
//! so overlapping horizons and at-least-once retries never produce
//! duplicate rows, and existing rows (paid, ignored, or plain) are never
//! touched.

use chrono::NaiveDate;
use common::DateRange;
use model::entities::prelude::*;
use model::entities::{bill, bill_payment, pay_schedule};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, instrument, trace, warn};

use crate::error::{EngineError, Result};

/// An active bill's next occurrence inside a window, with its current
/// reconciliation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingBill {
    pub bill: bill::Model,
    pub due_date: NaiveDate,
    pub paid: bool,
    pub ignored: bool,
}

/// Materializes the bill's occurrences for the horizon and returns the
/// computed due dates.
///
/// Inactive bills generate nothing. Due dates whose occurrence already
/// exists are left untouched; in particular an existing row's amount
/// snapshot survives later edits to the bill's `amount_due`.
#[instrument(skip(db, bill), fields(bill_id = bill.id))]
pub async fn materialize(
    db: &DatabaseConnection,
    bill: &bill::Model,
    horizon: &DateRange,
) -> Result<Vec<NaiveDate>> {
    // Cadence validity is enforced at construction; re-checked here so a row
    // written behind the engine's back fails loudly instead of generating
    // garbage dates.
    let cadence = bill.cadence()?;

    if !bill.active {
        debug!("bill {} is inactive, skipping generation", bill.id);
        return Ok(Vec::new());
    }

    let due_dates = cadence.due_dates(horizon.start, horizon.end);
    for due_date in &due_dates {
        insert_occurrence_if_absent(db, bill, *due_date).await?;
    }

    Ok(due_dates)
}

/// Inserts the occurrence unless one already exists for the natural key.
/// Returns whether a row was created.
async fn insert_occurrence_if_absent<C: ConnectionTrait>(
    conn: &C,
    bill: &bill::Model,
    due_date: NaiveDate,
) -> Result<bool> {
    let existing = find_occurrence(conn, bill.id, due_date).await?;
    if existing.is_some() {
        trace!("occurrence for bill {} on {} already exists", bill.id, due_date);
        return Ok(false);
    }

    let insert = bill_payment::ActiveModel {
        bill_id: Set(bill.id),
        due_date: Set(due_date),
        amount: Set(bill.amount_due),
        paid_at: Set(None),
        ignored: Set(false),
        ..Default::default()
    }
    .insert(conn)
    .await;

    match insert {
        Ok(_) => Ok(true),
        Err(insert_err) => {
            // A concurrent writer may have won the race for the natural key;
            // a conflicting row matching our computed due date makes the
            // retry benign.
            match find_occurrence(conn, bill.id, due_date).await? {
                Some(_) => {
                    trace!(
                        "occurrence for bill {} on {} inserted concurrently: {}",
                        bill.id, due_date, insert_err
                    );
                    Ok(false)
                }
                None => Err(EngineError::UniquenessViolation {
                    bill_id: bill.id,
                    due_date,
                }),
            }
        }
    }
}

async fn find_occurrence<C: ConnectionTrait>(
    conn: &C,
    bill_id: i32,
    due_date: NaiveDate,
) -> Result<Option<bill_payment::Model>> {
    Ok(BillPayment::find()
        .filter(bill_payment::Column::BillId.eq(bill_id))
        .filter(bill_payment::Column::DueDate.eq(due_date))
        .one(conn)
        .await?)
}

/// Rebuilds a bill's future occurrences after its cadence changed.
///
/// Only rows with `due_date > today` and no `paid_at` are deleted; paid
/// history is immutable and past-due unpaid rows are kept. New occurrences
/// are generated up to the furthest date that had been materialized before,
/// and only for future due dates.
#[instrument(skip(db, bill), fields(bill_id = bill.id))]
pub async fn regenerate(
    db: &DatabaseConnection,
    bill: &bill::Model,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let cadence = bill.cadence()?;

    let txn = db.begin().await?;

    let furthest = BillPayment::find()
        .filter(bill_payment::Column::BillId.eq(bill.id))
        .order_by_desc(bill_payment::Column::DueDate)
        .one(&txn)
        .await?
        .map(|occurrence| occurrence.due_date);

    let deleted = BillPayment::delete_many()
        .filter(bill_payment::Column::BillId.eq(bill.id))
        .filter(bill_payment::Column::DueDate.gt(today))
        .filter(bill_payment::Column::PaidAt.is_null())
        .exec(&txn)
        .await?;
    debug!(
        "deleted {} future unpaid occurrences for bill {}",
        deleted.rows_affected, bill.id
    );

    let mut created = Vec::new();
    if bill.active {
        if let Some(furthest) = furthest {
            if furthest > today {
                for due_date in cadence.due_dates(today, furthest) {
                    if due_date > today && insert_occurrence_if_absent(&txn, bill, due_date).await? {
                        created.push(due_date);
                    }
                }
            }
        }
    }

    txn.commit().await?;
    Ok(created)
}

/// Drops a deactivated bill's future unpaid occurrences. Paid history and
/// past-due rows are kept.
#[instrument(skip(db))]
pub async fn prune_future_occurrences(
    db: &DatabaseConnection,
    bill_id: i32,
    today: NaiveDate,
) -> Result<u64> {
    let deleted = BillPayment::delete_many()
        .filter(bill_payment::Column::BillId.eq(bill_id))
        .filter(bill_payment::Column::DueDate.gt(today))
        .filter(bill_payment::Column::PaidAt.is_null())
        .exec(db)
        .await?;

    debug!(
        "pruned {} future occurrences for bill {}",
        deleted.rows_affected, bill_id
    );
    Ok(deleted.rows_affected)
}

/// Active bills whose next due date falls inside the window, sorted by due
/// date then payee. Bills with malformed cadence columns are skipped with a
/// warning rather than failing the whole projection.
#[instrument(skip(db))]
pub async fn upcoming_bills(db: &DatabaseConnection, window: &DateRange) -> Result<Vec<UpcomingBill>> {
    let bills = Bill::find()
        .filter(bill::Column::Active.eq(true))
        .all(db)
        .await?;

    let mut upcoming = Vec::new();
    for bill in bills {
        let cadence = match bill.cadence() {
            Ok(cadence) => cadence,
            Err(error) => {
                warn!("skipping bill {} with malformed cadence: {}", bill.id, error);
                continue;
            }
        };

        let due_date = cadence.next_due(window.start);
        if due_date > window.end {
            continue;
        }

        let occurrence = find_occurrence(db, bill.id, due_date).await?;
        let (paid, ignored) = occurrence
            .map(|o| (o.is_paid(), o.ignored))
            .unwrap_or((false, false));

        upcoming.push(UpcomingBill {
            bill,
            due_date,
            paid,
            ignored,
        });
    }

    upcoming.sort_by(|a, b| {
        (a.due_date, a.bill.payee.to_lowercase()).cmp(&(b.due_date, b.bill.payee.to_lowercase()))
    });
    Ok(upcoming)
}

/// The biweekly pay window containing `today`, anchored on the stored pay
/// schedule. Without a stored schedule the window simply starts today.
#[instrument(skip(db))]
pub async fn current_pay_window(db: &DatabaseConnection, today: NaiveDate) -> Result<DateRange> {
    let schedule = PaySchedule::find_by_id(1).one(db).await?;

    let (start, end) = match schedule {
        Some(schedule) => schedule.pay_window(today),
        None => {
            let fallback = pay_schedule::Model {
                id: 1,
                frequency: pay_schedule::PayFrequency::Biweekly,
                anchor_date: today,
            };
            fallback.pay_window(today)
        }
    };

    DateRange::new(start, end).map_err(EngineError::Validation)
}

/// Sets or replaces the singleton pay schedule's anchor payday.
#[instrument(skip(db))]
pub async fn set_pay_anchor(
    db: &DatabaseConnection,
    anchor_date: NaiveDate,
) -> Result<pay_schedule::Model> {
    match PaySchedule::find_by_id(1).one(db).await? {
        Some(existing) => {
            let mut active = existing.into_active_model();
            active.anchor_date = Set(anchor_date);
            Ok(active.update(db).await?)
        }
        None => Ok(pay_schedule::ActiveModel {
            id: Set(1),
            frequency: Set(pay_schedule::PayFrequency::Biweekly),
            anchor_date: Set(anchor_date),
        }
        .insert(db)
        .await?),
    }
}
