use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::account;

/// Lookup codes for what a ledger row represents. The sign convention of the
/// stored amount follows from this (see [`TransactionKind::signed_amount`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum TransactionKind {
    #[sea_orm(num_value = 1)]
    Deposit,
    #[sea_orm(num_value = 2)]
    Expense,
    #[sea_orm(num_value = 3)]
    Transfer,
}

impl TransactionKind {
    /// Applies the ledger's sign convention: expenses are stored negative,
    /// deposits and transfers positive. Whatever sign the caller supplied is
    /// discarded.
    pub fn signed_amount(self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Expense => -amount.abs(),
            TransactionKind::Deposit | TransactionKind::Transfer => amount.abs(),
        }
    }
}

/// Lookup codes for how a transaction was made. Code 0 is the historical
/// "N/A" placeholder and keeps its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum TransactionMethod {
    #[sea_orm(num_value = 0)]
    NotApplicable,
    #[sea_orm(num_value = 1)]
    Cash,
    #[sea_orm(num_value = 2)]
    Debit,
    #[sea_orm(num_value = 3)]
    Credit,
    #[sea_orm(num_value = 4)]
    Check,
    #[sea_orm(num_value = 5)]
    Ach,
}

/// Lookup codes for spending categories. Code 0 is "uncategorized".
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum TransactionCategory {
    #[sea_orm(num_value = 0)]
    Uncategorized,
    #[sea_orm(num_value = 1)]
    Bills,
    #[sea_orm(num_value = 2)]
    Groceries,
    #[sea_orm(num_value = 3)]
    Dining,
    #[sea_orm(num_value = 4)]
    Fuel,
    #[sea_orm(num_value = 5)]
    Income,
    #[sea_orm(num_value = 6)]
    Other,
}

/// One ledger row in an account's transaction sequence.
///
/// `sort_key` is the manual sort key: a user-controlled ordering field,
/// independent of insertion time, that defines the processing order for
/// balance computation. Ties break by row id. `balance` is the running
/// balance at this row in that order; it is a computed projection, refreshed
/// by the engine on every write, never authoritative on its own.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    pub sort_key: i32,
    /// Pending rows count toward the available balance but not the posted one.
    pub pending: bool,
    pub kind: TransactionKind,
    pub method: TransactionMethod,
    pub category: TransactionCategory,
    pub payee: String,
    /// Signed amount; the sign is enforced from `kind` at write time.
    #[sea_orm(column_type = "Decimal(Some((28, 9)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 9)))")]
    pub balance: Decimal,
    pub posted_on: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to exactly one account.
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::AccountId",
        to = "account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_amount_ignores_input_sign() {
        let fifty = Decimal::new(5000, 2);

        assert_eq!(TransactionKind::Expense.signed_amount(fifty), -fifty);
        assert_eq!(TransactionKind::Expense.signed_amount(-fifty), -fifty);
        assert_eq!(TransactionKind::Deposit.signed_amount(fifty), fifty);
        assert_eq!(TransactionKind::Deposit.signed_amount(-fifty), fifty);
        assert_eq!(TransactionKind::Transfer.signed_amount(-fifty), fifty);
    }
}
