use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use crate::cadence::{Cadence, CadenceError};

use super::account;

pub mod schedule;

/// How often a bill recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(7))")]
pub enum BillPeriod {
    #[sea_orm(string_value = "Monthly")]
    Monthly,
    #[sea_orm(string_value = "Yearly")]
    Yearly,
}

/// A recurring obligation, e.g. rent or an insurance premium.
///
/// The cadence lives in the nullable `due_day` / `due_month` / `due_dom`
/// sibling columns; exactly one period's fields may be populated, and
/// [`Model::cadence`] is the checked way to read them. `total_debt`
/// accumulates the outstanding amount and is maintained by the
/// reconciliation engine.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub payee: String,
    pub period: BillPeriod,
    #[sea_orm(column_type = "Decimal(Some((28, 9)))")]
    pub amount_due: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 9)))")]
    pub total_debt: Decimal,
    /// The account payments are drawn from, if any.
    pub account_id: Option<i32>,
    pub due_day: Option<i32>,
    pub due_month: Option<i32>,
    pub due_dom: Option<i32>,
    /// Inactive bills stop generating occurrences; their history is kept.
    #[sea_orm(default_value = "true")]
    pub active: bool,
    pub notes: Option<String>,
}

impl Model {
    /// The validated recurrence rule behind the nullable cadence columns.
    pub fn cadence(&self) -> Result<Cadence, CadenceError> {
        Cadence::from_columns(self.period, self.due_day, self.due_month, self.due_dom)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::AccountId",
        to = "account::Column::Id",
        on_delete = "SetNull"
    )]
    Account,
    #[sea_orm(has_many = "super::bill_payment::Entity")]
    BillPayment,
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::bill_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillPayment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
