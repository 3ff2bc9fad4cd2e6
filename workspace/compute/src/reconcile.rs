//! Reconciliation: marking occurrences paid or ignored and keeping each
//! bill's outstanding-debt accumulator in line with its occurrences.
//!
//! Paying a bill touches the occurrence, the bill, and (when the bill draws
//! from an account) the account's ledger, all in one unit of work.

use chrono::{NaiveDate, NaiveDateTime};
use model::entities::prelude::*;
use model::entities::{bill, bill_payment, transaction};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, error, instrument, trace, warn};

use crate::error::{EngineError, Result};
use crate::ledger::{self, NewTransaction};

/// The result of paying one occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub occurrence: bill_payment::Model,
    /// The bill's outstanding debt after the payment.
    pub total_debt: Decimal,
    /// True when the decrement would have pushed `total_debt` below zero.
    /// The stored value is floored at zero; the underflow itself signals a
    /// data inconsistency and is logged, never hidden.
    pub debt_underflow: bool,
}

async fn load_bill<C: ConnectionTrait>(conn: &C, bill_id: i32) -> Result<bill::Model> {
    Bill::find_by_id(bill_id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("bill {bill_id} not found")))
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

/// Marks the occurrence for `(bill_id, due_date)` paid.
///
/// The occurrence is created on the fly if generation has not materialized
/// it yet (amount snapshot taken from the bill). An already-paid occurrence
/// is a no-op: its original `paid_at` and amount are immutable history.
/// Paying clears any ignore flag. The bill's `total_debt` is decremented by
/// the snapshot amount, floored at zero, and a ledger expense row is
/// appended to the linked account in the same unit of work.
#[instrument(skip(db))]
pub async fn mark_paid(
    db: &DatabaseConnection,
    bill_id: i32,
    due_date: NaiveDate,
    paid_at: NaiveDateTime,
) -> Result<PaymentOutcome> {
    let txn = db.begin().await?;

    let bill = load_bill(&txn, bill_id).await?;
    let existing = find_occurrence(&txn, bill_id, due_date).await?;

    if let Some(occurrence) = &existing {
        if occurrence.is_paid() {
            trace!(
                "occurrence for bill {} on {} already paid, nothing to do",
                bill_id, due_date
            );
            return Ok(PaymentOutcome {
                occurrence: occurrence.clone(),
                total_debt: bill.total_debt,
                debt_underflow: false,
            });
        }
    }

    let occurrence = match existing {
        Some(occurrence) => {
            let mut active = occurrence.into_active_model();
            active.paid_at = Set(Some(paid_at));
            active.ignored = Set(false);
            active.update(&txn).await?
        }
        None => {
            bill_payment::ActiveModel {
                bill_id: Set(bill_id),
                due_date: Set(due_date),
                amount: Set(bill.amount_due),
                paid_at: Set(Some(paid_at)),
                ignored: Set(false),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    let mut debt_underflow = false;
    let mut total_debt = bill.total_debt - occurrence.amount;
    if total_debt < Decimal::ZERO {
        error!(
            "bill {}: paying {} on {} would push total_debt to {}, flooring at zero",
            bill_id, occurrence.amount, due_date, total_debt
        );
        debt_underflow = true;
        total_debt = Decimal::ZERO;
    }

    let account_id = bill.account_id;
    let payee = bill.payee.clone();
    let mut bill_active = bill.into_active_model();
    bill_active.total_debt = Set(total_debt);
    bill_active.update(&txn).await?;

    if let Some(account_id) = account_id {
        let row = ledger::append_transaction(
            &txn,
            NewTransaction {
                account_id,
                kind: transaction::TransactionKind::Expense,
                method: transaction::TransactionMethod::NotApplicable,
                category: transaction::TransactionCategory::Bills,
                payee,
                amount: occurrence.amount,
                posted_on: due_date,
                pending: false,
            },
        )
        .await?;
        debug!(
            "bill {} payment recorded as transaction {} on account {}",
            bill_id, row.id, account_id
        );
    }

    txn.commit().await?;
    Ok(PaymentOutcome {
        occurrence,
        total_debt,
        debt_underflow,
    })
}

/// Flips the ignore flag for `(bill_id, due_date)`, creating the occurrence
/// if generation has not materialized it yet.
///
/// An ignored occurrence is excluded from the bill's outstanding debt and
/// from due-soon projections. Ignoring a paid occurrence is rejected with
/// [`EngineError::InvalidStateTransition`]; un-ignoring a paid occurrence is
/// a no-op since paid rows never carry the flag.
#[instrument(skip(db))]
pub async fn set_ignored(
    db: &DatabaseConnection,
    bill_id: i32,
    due_date: NaiveDate,
    ignored: bool,
) -> Result<bill_payment::Model> {
    let txn = db.begin().await?;

    let bill = load_bill(&txn, bill_id).await?;
    let existing = find_occurrence(&txn, bill_id, due_date).await?;

    if let Some(occurrence) = &existing {
        if occurrence.is_paid() {
            if ignored {
                return Err(EngineError::InvalidStateTransition(format!(
                    "occurrence for bill {bill_id} on {due_date} is paid and cannot be ignored"
                )));
            }
            return Ok(occurrence.clone());
        }
        if occurrence.ignored == ignored {
            return Ok(occurrence.clone());
        }
    }

    let occurrence = match existing {
        Some(occurrence) => {
            let mut active = occurrence.into_active_model();
            active.ignored = Set(ignored);
            active.update(&txn).await?
        }
        None => {
            bill_payment::ActiveModel {
                bill_id: Set(bill_id),
                due_date: Set(due_date),
                amount: Set(bill.amount_due),
                paid_at: Set(None),
                ignored: Set(ignored),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    // Mirror the flag into the accumulator: ignoring removes the amount
    // from the outstanding debt, un-ignoring restores it.
    let mut total_debt = if ignored {
        bill.total_debt - occurrence.amount
    } else {
        bill.total_debt + occurrence.amount
    };
    if total_debt < Decimal::ZERO {
        error!(
            "bill {}: ignoring {} on {} would push total_debt to {}, flooring at zero",
            bill_id, occurrence.amount, due_date, total_debt
        );
        total_debt = Decimal::ZERO;
    }
    let mut bill_active = bill.into_active_model();
    bill_active.total_debt = Set(total_debt);
    bill_active.update(&txn).await?;

    txn.commit().await?;
    Ok(occurrence)
}

/// The bill's outstanding debt derived from first principles: the sum of
/// amounts over unpaid, non-ignored occurrences.
pub async fn derived_total_debt<C: ConnectionTrait>(conn: &C, bill_id: i32) -> Result<Decimal> {
    let occurrences = BillPayment::find()
        .filter(bill_payment::Column::BillId.eq(bill_id))
        .filter(bill_payment::Column::PaidAt.is_null())
        .filter(bill_payment::Column::Ignored.eq(false))
        .all(conn)
        .await?;

    Ok(occurrences
        .iter()
        .fold(Decimal::ZERO, |sum, occurrence| sum + occurrence.amount))
}

/// Rewrites the bill's `total_debt` accumulator from the outstanding
/// occurrence set, logging any drift. Use after historical edits that the
/// incremental bookkeeping cannot follow.
#[instrument(skip(db))]
pub async fn sync_total_debt(db: &DatabaseConnection, bill_id: i32) -> Result<Decimal> {
    let txn = db.begin().await?;

    let bill = load_bill(&txn, bill_id).await?;
    let derived = derived_total_debt(&txn, bill_id).await?;

    if bill.total_debt != derived {
        warn!(
            "bill {}: total_debt {} drifted from outstanding occurrences {}, rewriting",
            bill_id, bill.total_debt, derived
        );
        let mut active = bill.into_active_model();
        active.total_debt = Set(derived);
        active.update(&txn).await?;
    }

    txn.commit().await?;
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule;
    use crate::testing::{create_account, create_monthly_bill, date, datetime, setup_db};
    use common::DateRange;

    async fn create_unlinked_bill(db: &DatabaseConnection) -> bill::Model {
        create_monthly_bill(db, None, 1, Decimal::new(5000, 2), Decimal::new(10000, 2)).await
    }

    #[tokio::test]
    async fn test_mark_paid_records_payment_and_ledger_row() {
        let db = setup_db().await;
        let account = create_account(&db, Decimal::new(200000, 2)).await; // 2000.00
        let bill = create_monthly_bill(
            &db,
            Some(account.id),
            1,
            Decimal::new(120000, 2),
            Decimal::new(240000, 2),
        )
        .await;

        let outcome = mark_paid(&db, bill.id, date(2025, 2, 1), datetime(2025, 2, 1))
            .await
            .unwrap();

        assert_eq!(outcome.occurrence.paid_at, Some(datetime(2025, 2, 1)));
        assert!(!outcome.occurrence.ignored);
        assert_eq!(outcome.total_debt, Decimal::new(120000, 2));
        assert!(!outcome.debt_underflow);

        // The payment landed in the linked account's ledger as an expense.
        let rows = ledger::list_transactions(&db, account.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, Decimal::new(-120000, 2));
        assert_eq!(rows[0].balance, Decimal::new(80000, 2));
        assert_eq!(rows[0].payee, "Hilltop Properties");
        assert_eq!(rows[0].category, transaction::TransactionCategory::Bills);
        assert!(!rows[0].pending);
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent() {
        let db = setup_db().await;
        let bill = create_unlinked_bill(&db).await;

        let first = mark_paid(&db, bill.id, date(2025, 2, 1), datetime(2025, 2, 1))
            .await
            .unwrap();
        let second = mark_paid(&db, bill.id, date(2025, 2, 1), datetime(2025, 3, 15))
            .await
            .unwrap();

        // The original payment timestamp is immutable history.
        assert_eq!(second.occurrence.paid_at, first.occurrence.paid_at);
        assert_eq!(second.total_debt, first.total_debt);

        let count = BillPayment::find()
            .filter(bill_payment::Column::BillId.eq(bill.id))
            .all(&db)
            .await
            .unwrap()
            .len();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_mark_paid_uses_the_materialized_snapshot() {
        let db = setup_db().await;
        let bill = create_monthly_bill(
            &db,
            None,
            15,
            Decimal::new(5000, 2),
            Decimal::new(10000, 2),
        )
        .await;

        schedule::materialize(
            &db,
            &bill,
            &DateRange::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap(),
        )
        .await
        .unwrap();

        // The bill gets more expensive after generation.
        let mut active = bill.clone().into_active_model();
        active.amount_due = Set(Decimal::new(9000, 2));
        let bill = active.update(&db).await.unwrap();

        let outcome = mark_paid(&db, bill.id, date(2025, 1, 15), datetime(2025, 1, 15))
            .await
            .unwrap();

        // Payment settles at the snapshot taken when the occurrence was
        // generated, not the edited amount.
        assert_eq!(outcome.occurrence.amount, Decimal::new(5000, 2));
        assert_eq!(outcome.total_debt, Decimal::new(5000, 2));
    }

    #[tokio::test]
    async fn test_mark_paid_flags_debt_underflow() {
        let db = setup_db().await;
        let bill =
            create_monthly_bill(&db, None, 1, Decimal::new(5000, 2), Decimal::new(3000, 2)).await;

        let outcome = mark_paid(&db, bill.id, date(2025, 2, 1), datetime(2025, 2, 1))
            .await
            .unwrap();

        assert!(outcome.debt_underflow);
        assert_eq!(outcome.total_debt, Decimal::ZERO);

        let stored = Bill::find_by_id(bill.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.total_debt, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_ignoring_a_paid_occurrence_is_rejected() {
        let db = setup_db().await;
        let bill = create_unlinked_bill(&db).await;

        mark_paid(&db, bill.id, date(2025, 2, 1), datetime(2025, 2, 1))
            .await
            .unwrap();

        let result = set_ignored(&db, bill.id, date(2025, 2, 1), true).await;
        assert!(matches!(
            result,
            Err(EngineError::InvalidStateTransition(_))
        ));

        // State remains paid and un-ignored.
        let occurrence = find_occurrence(&db, bill.id, date(2025, 2, 1))
            .await
            .unwrap()
            .unwrap();
        assert!(occurrence.is_paid());
        assert!(!occurrence.ignored);
    }

    #[tokio::test]
    async fn test_ignore_and_unignore_adjust_outstanding_debt() {
        let db = setup_db().await;
        let bill =
            create_monthly_bill(&db, None, 1, Decimal::new(5000, 2), Decimal::new(10000, 2)).await;

        let occurrence = set_ignored(&db, bill.id, date(2025, 2, 1), true).await.unwrap();
        assert!(occurrence.ignored);
        assert!(occurrence.paid_at.is_none());

        let stored = Bill::find_by_id(bill.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.total_debt, Decimal::new(5000, 2));

        let occurrence = set_ignored(&db, bill.id, date(2025, 2, 1), false).await.unwrap();
        assert!(!occurrence.ignored);

        let stored = Bill::find_by_id(bill.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.total_debt, Decimal::new(10000, 2));

        // Repeating the current state changes nothing.
        set_ignored(&db, bill.id, date(2025, 2, 1), false).await.unwrap();
        let stored = Bill::find_by_id(bill.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.total_debt, Decimal::new(10000, 2));
    }

    #[tokio::test]
    async fn test_paying_clears_an_ignore_flag() {
        let db = setup_db().await;
        let bill = create_unlinked_bill(&db).await;

        set_ignored(&db, bill.id, date(2025, 2, 1), true).await.unwrap();
        let outcome = mark_paid(&db, bill.id, date(2025, 2, 1), datetime(2025, 2, 2))
            .await
            .unwrap();

        assert!(outcome.occurrence.is_paid());
        assert!(!outcome.occurrence.ignored);
    }

    #[tokio::test]
    async fn test_total_debt_is_derivable_from_occurrences() {
        let db = setup_db().await;
        // Debt seeded to the three occurrences about to be generated.
        let bill =
            create_monthly_bill(&db, None, 15, Decimal::new(5000, 2), Decimal::new(15000, 2)).await;

        schedule::materialize(
            &db,
            &bill,
            &DateRange::new(date(2025, 1, 1), date(2025, 3, 31)).unwrap(),
        )
        .await
        .unwrap();

        // Three outstanding occurrences, one paid, one ignored.
        mark_paid(&db, bill.id, date(2025, 1, 15), datetime(2025, 1, 15))
            .await
            .unwrap();
        set_ignored(&db, bill.id, date(2025, 2, 15), true).await.unwrap();

        let derived = derived_total_debt(&db, bill.id).await.unwrap();
        assert_eq!(derived, Decimal::new(5000, 2));

        let synced = sync_total_debt(&db, bill.id).await.unwrap();
        assert_eq!(synced, derived);

        let stored = Bill::find_by_id(bill.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.total_debt, derived);
    }
}
