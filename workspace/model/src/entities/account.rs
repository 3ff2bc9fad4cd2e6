use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// The kind of account, persisted as a stable small-integer lookup code.
/// Codes are never reused; new kinds get the next free code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum AccountKind {
    #[sea_orm(num_value = 1)]
    Checking,
    #[sea_orm(num_value = 2)]
    Savings,
    #[sea_orm(num_value = 3)]
    CreditCard,
    #[sea_orm(num_value = 4)]
    Other,
}

/// A financial account held at an institution.
///
/// `opening_balance` is the balance before the first ledger row; every
/// running balance in the account's transaction sequence is seeded from it.
/// The *current* balance is a derived projection over the transaction rows
/// and is never stored here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub institution: String,
    pub kind: AccountKind,
    /// User-visible label, e.g. "Everyday Checking".
    pub name: String,
    /// Inactive accounts are hidden from overviews; their history is kept.
    #[sea_orm(default_value = "true")]
    pub active: bool,
    #[sea_orm(column_type = "Decimal(Some((28, 9)))")]
    pub opening_balance: Decimal,
    /// Whether the account accrues interest; `apy` is only meaningful then.
    pub interest: bool,
    #[sea_orm(column_type = "Decimal(Some((8, 5)))", nullable)]
    pub apy: Option<Decimal>,
    pub opened_on: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An account owns its ledger rows.
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
    /// Bills optionally draw from an account.
    #[sea_orm(has_many = "super::bill::Entity")]
    Bill,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bill.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
