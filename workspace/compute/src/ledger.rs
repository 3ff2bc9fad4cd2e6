//! The per-account transaction store and its running-balance projection.
//!
//! Rows are ordered by the manual sort key, ties broken by row id. The
//! stored `balance` column is a projection over that order: it is refreshed
//! here on every write and never trusted as an input. Each mutation runs in
//! its own database transaction so two concurrent edits on one account
//! cannot both extend a stale tail.

use chrono::NaiveDate;
use model::entities::prelude::*;
use model::entities::{account, transaction};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, error, instrument, trace};

use crate::error::{EngineError, Result};

/// Gap between consecutive manual sort keys, leaving room to re-file rows
/// between neighbors without resequencing.
const SORT_KEY_GAP: i32 = 10;

/// Input for a new ledger row. The amount may carry any sign; the stored
/// sign is derived from `kind`.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i32,
    pub kind: transaction::TransactionKind,
    pub method: transaction::TransactionMethod,
    pub category: transaction::TransactionCategory,
    pub payee: String,
    pub amount: Decimal,
    pub posted_on: NaiveDate,
    pub pending: bool,
}

/// Partial update for an existing row. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub kind: Option<transaction::TransactionKind>,
    pub method: Option<transaction::TransactionMethod>,
    pub category: Option<transaction::TransactionCategory>,
    pub payee: Option<String>,
    pub amount: Option<Decimal>,
    pub posted_on: Option<NaiveDate>,
    pub pending: Option<bool>,
    pub sort_key: Option<i32>,
    pub account_id: Option<i32>,
}

/// Balance projections for one account. `posted` counts cleared rows only,
/// `available` counts cleared and pending rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalances {
    pub posted: Decimal,
    pub available: Decimal,
}

/// One account's entry in the institution-grouped overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: i32,
    pub name: String,
    pub available: Decimal,
}

/// All active accounts of one institution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionAccounts {
    pub institution: String,
    pub accounts: Vec<AccountSummary>,
}

async fn load_account<C: ConnectionTrait>(conn: &C, account_id: i32) -> Result<account::Model> {
    Account::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("account {account_id} not found")))
}

/// Rows at or after the given `(sort_key, id)` position.
fn at_or_after(sort_key: i32, id: i32) -> Condition {
    Condition::any()
        .add(transaction::Column::SortKey.gt(sort_key))
        .add(
            Condition::all()
                .add(transaction::Column::SortKey.eq(sort_key))
                .add(transaction::Column::Id.gte(id)),
        )
}

/// Rows strictly before the given `(sort_key, id)` position.
fn before(sort_key: i32, id: i32) -> Condition {
    Condition::any()
        .add(transaction::Column::SortKey.lt(sort_key))
        .add(
            Condition::all()
                .add(transaction::Column::SortKey.eq(sort_key))
                .add(transaction::Column::Id.lt(id)),
        )
}

/// Lists an account's rows in `(sort_key, id)` order, the order balances are
/// computed in.
#[instrument(skip(conn))]
pub async fn list_transactions<C: ConnectionTrait>(
    conn: &C,
    account_id: i32,
) -> Result<Vec<transaction::Model>> {
    let rows = Transaction::find()
        .filter(transaction::Column::AccountId.eq(account_id))
        .order_by_asc(transaction::Column::SortKey)
        .order_by_asc(transaction::Column::Id)
        .all(conn)
        .await?;

    trace!("found {} transactions for account {}", rows.len(), account_id);
    Ok(rows)
}

/// Allocates the next manual sort key for an account: the current maximum
/// plus a gap of ten.
pub async fn next_sort_key<C: ConnectionTrait>(conn: &C, account_id: i32) -> Result<i32> {
    let last = Transaction::find()
        .filter(transaction::Column::AccountId.eq(account_id))
        .order_by_desc(transaction::Column::SortKey)
        .order_by_desc(transaction::Column::Id)
        .one(conn)
        .await?;

    Ok(last.map(|row| row.sort_key).unwrap_or(0) + SORT_KEY_GAP)
}

/// Recomputes the running balance for every row at or after `from`
/// (everything when `from` is `None`), seeding from the row before the edit
/// point or the account's opening balance.
///
/// Returns the number of rows whose stored balance changed.
#[instrument(skip(conn, account), fields(account_id = account.id))]
pub async fn recompute_tail<C: ConnectionTrait>(
    conn: &C,
    account: &account::Model,
    from: Option<(i32, i32)>,
) -> Result<usize> {
    let mut seed = account.opening_balance;

    let mut query = Transaction::find().filter(transaction::Column::AccountId.eq(account.id));
    if let Some((sort_key, id)) = from {
        let previous = Transaction::find()
            .filter(transaction::Column::AccountId.eq(account.id))
            .filter(before(sort_key, id))
            .order_by_desc(transaction::Column::SortKey)
            .order_by_desc(transaction::Column::Id)
            .one(conn)
            .await?;
        if let Some(previous) = previous {
            seed = previous.balance;
        }
        query = query.filter(at_or_after(sort_key, id));
    }

    let rows = query
        .order_by_asc(transaction::Column::SortKey)
        .order_by_asc(transaction::Column::Id)
        .all(conn)
        .await?;

    let mut updated = 0;
    let mut expected = seed;
    for row in rows {
        expected += row.amount;
        if row.balance != expected {
            let mut active = row.into_active_model();
            active.balance = Set(expected);
            active.update(conn).await?;
            updated += 1;
        }
    }

    debug!("recomputed {} balances for account {}", updated, account.id);
    Ok(updated)
}

/// Full-account recomputation, used whenever the manual sort order itself
/// changed.
pub async fn resequence_account<C: ConnectionTrait>(
    conn: &C,
    account: &account::Model,
) -> Result<usize> {
    recompute_tail(conn, account, None).await
}

/// Appends a row on the caller's connection and refreshes the tail behind
/// it. Callers that are not already inside a unit of work should use
/// [`insert_transaction`] instead.
pub async fn append_transaction<C: ConnectionTrait>(
    conn: &C,
    new: NewTransaction,
) -> Result<transaction::Model> {
    let account = load_account(conn, new.account_id).await?;
    let sort_key = next_sort_key(conn, new.account_id).await?;
    let amount = new.kind.signed_amount(new.amount);

    let inserted = transaction::ActiveModel {
        account_id: Set(new.account_id),
        sort_key: Set(sort_key),
        pending: Set(new.pending),
        kind: Set(new.kind),
        method: Set(new.method),
        category: Set(new.category),
        payee: Set(new.payee),
        amount: Set(amount),
        balance: Set(Decimal::ZERO),
        posted_on: Set(new.posted_on),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    recompute_tail(conn, &account, Some((sort_key, inserted.id))).await?;

    Transaction::find_by_id(inserted.id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("transaction {} not found", inserted.id)))
}

/// Inserts a row and recomputes the balances behind it, atomically.
#[instrument(skip(db))]
pub async fn insert_transaction(
    db: &DatabaseConnection,
    new: NewTransaction,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;
    let row = append_transaction(&txn, new).await?;
    txn.commit().await?;
    Ok(row)
}

/// Applies a partial edit. An amount or kind change recomputes the tail
/// from the edited row; a sort-key or account move resequences the whole
/// affected account(s).
#[instrument(skip(db, patch))]
pub async fn update_transaction(
    db: &DatabaseConnection,
    transaction_id: i32,
    patch: TransactionPatch,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;

    let existing = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id} not found")))?;

    let old_account_id = existing.account_id;
    let old_position = (existing.sort_key, existing.id);

    let kind = patch.kind.unwrap_or(existing.kind);
    let raw_amount = patch.amount.unwrap_or(existing.amount);
    let amount = kind.signed_amount(raw_amount);
    let new_account_id = patch.account_id.unwrap_or(old_account_id);
    let new_sort_key = patch.sort_key.unwrap_or(existing.sort_key);
    let moved = new_account_id != old_account_id || new_sort_key != existing.sort_key;

    let mut active = existing.into_active_model();
    active.kind = Set(kind);
    active.amount = Set(amount);
    active.account_id = Set(new_account_id);
    active.sort_key = Set(new_sort_key);
    if let Some(method) = patch.method {
        active.method = Set(method);
    }
    if let Some(category) = patch.category {
        active.category = Set(category);
    }
    if let Some(payee) = patch.payee {
        active.payee = Set(payee);
    }
    if let Some(posted_on) = patch.posted_on {
        active.posted_on = Set(posted_on);
    }
    if let Some(pending) = patch.pending {
        active.pending = Set(pending);
    }
    active.update(&txn).await?;

    let old_account = load_account(&txn, old_account_id).await?;
    if moved {
        resequence_account(&txn, &old_account).await?;
        if new_account_id != old_account_id {
            let new_account = load_account(&txn, new_account_id).await?;
            resequence_account(&txn, &new_account).await?;
        }
    } else {
        recompute_tail(&txn, &old_account, Some(old_position)).await?;
    }

    let updated = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id} not found")))?;
    txn.commit().await?;
    Ok(updated)
}

/// Deletes a row and recomputes the balances of everything behind it.
#[instrument(skip(db))]
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: i32) -> Result<()> {
    let txn = db.begin().await?;

    let existing = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id} not found")))?;

    let account = load_account(&txn, existing.account_id).await?;
    let position = (existing.sort_key, existing.id);

    Transaction::delete_by_id(transaction_id).exec(&txn).await?;
    recompute_tail(&txn, &account, Some(position)).await?;

    txn.commit().await?;
    Ok(())
}

/// Flips the pending flag. The running-balance chain covers pending and
/// cleared rows alike, so no recomputation is needed; only the posted
/// projection shifts.
#[instrument(skip(db))]
pub async fn set_pending(
    db: &DatabaseConnection,
    transaction_id: i32,
    pending: bool,
) -> Result<transaction::Model> {
    let existing = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id} not found")))?;

    let mut active = existing.into_active_model();
    active.pending = Set(pending);
    Ok(active.update(db).await?)
}

/// Swaps the row's sort key with its nearest neighbor above (toward the top
/// of the newest-first display). Returns false when the row is already at
/// the edge.
#[instrument(skip(db))]
pub async fn move_up(db: &DatabaseConnection, account_id: i32, transaction_id: i32) -> Result<bool> {
    swap_with_neighbor(db, account_id, transaction_id, true).await
}

/// Swaps the row's sort key with its nearest neighbor below.
#[instrument(skip(db))]
pub async fn move_down(
    db: &DatabaseConnection,
    account_id: i32,
    transaction_id: i32,
) -> Result<bool> {
    swap_with_neighbor(db, account_id, transaction_id, false).await
}

async fn swap_with_neighbor(
    db: &DatabaseConnection,
    account_id: i32,
    transaction_id: i32,
    toward_higher: bool,
) -> Result<bool> {
    let txn = db.begin().await?;

    let current = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .filter(|row| row.account_id == account_id)
        .ok_or_else(|| {
            EngineError::NotFound(format!(
                "transaction {transaction_id} not found in account {account_id}"
            ))
        })?;

    let mut query = Transaction::find().filter(transaction::Column::AccountId.eq(account_id));
    query = if toward_higher {
        query
            .filter(transaction::Column::SortKey.gt(current.sort_key))
            .order_by_asc(transaction::Column::SortKey)
            .order_by_asc(transaction::Column::Id)
    } else {
        query
            .filter(transaction::Column::SortKey.lt(current.sort_key))
            .order_by_desc(transaction::Column::SortKey)
            .order_by_desc(transaction::Column::Id)
    };

    let Some(neighbor) = query.one(&txn).await? else {
        return Ok(false);
    };

    let current_key = current.sort_key;
    let neighbor_key = neighbor.sort_key;

    let mut current_active = current.into_active_model();
    current_active.sort_key = Set(neighbor_key);
    current_active.update(&txn).await?;

    let mut neighbor_active = neighbor.into_active_model();
    neighbor_active.sort_key = Set(current_key);
    neighbor_active.update(&txn).await?;

    let account = load_account(&txn, account_id).await?;
    resequence_account(&txn, &account).await?;

    txn.commit().await?;
    Ok(true)
}

/// Posted and available balances for one account.
#[instrument(skip(db))]
pub async fn account_balances(db: &DatabaseConnection, account_id: i32) -> Result<AccountBalances> {
    let account = load_account(db, account_id).await?;
    let rows = list_transactions(db, account_id).await?;

    let mut posted = account.opening_balance;
    let mut available = account.opening_balance;
    for row in &rows {
        available += row.amount;
        if !row.pending {
            posted += row.amount;
        }
    }

    Ok(AccountBalances { posted, available })
}

/// Active accounts grouped by institution with their available balances,
/// ordered by institution then account name.
#[instrument(skip(db))]
pub async fn account_overview(db: &DatabaseConnection) -> Result<Vec<InstitutionAccounts>> {
    let accounts = Account::find()
        .filter(account::Column::Active.eq(true))
        .order_by_asc(account::Column::Institution)
        .order_by_asc(account::Column::Name)
        .all(db)
        .await?;

    let mut groups: Vec<InstitutionAccounts> = Vec::new();
    for account in accounts {
        let balances = account_balances(db, account.id).await?;
        let summary = AccountSummary {
            id: account.id,
            name: account.name.clone(),
            available: balances.available,
        };
        let new_institution = groups
            .last()
            .map(|group| group.institution != account.institution)
            .unwrap_or(true);
        if new_institution {
            groups.push(InstitutionAccounts {
                institution: account.institution,
                accounts: Vec::new(),
            });
        }
        if let Some(group) = groups.last_mut() {
            group.accounts.push(summary);
        }
    }

    Ok(groups)
}

/// Walks the account's rows in order and checks the balance chain,
/// surfacing the first gap found.
#[instrument(skip(conn))]
pub async fn verify_chain<C: ConnectionTrait>(conn: &C, account_id: i32) -> Result<()> {
    let account = load_account(conn, account_id).await?;
    let rows = list_transactions(conn, account_id).await?;

    let mut expected = account.opening_balance;
    for row in rows {
        expected += row.amount;
        if row.balance != expected {
            let message = format!(
                "account {} transaction {}: stored balance {} but chain expects {}",
                account_id, row.id, row.balance, expected
            );
            error!("{message}");
            return Err(EngineError::InconsistentBalance(message));
        }
    }

    Ok(())
}
