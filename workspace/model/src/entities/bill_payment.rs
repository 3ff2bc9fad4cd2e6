use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::bill;

/// One concrete, dated instance of a bill's obligation.
///
/// `(bill_id, due_date)` is the natural key: at most one occurrence may
/// exist per bill and due date, enforced by a unique index and re-checked by
/// the engine before every insert. `amount` is a snapshot of the bill's
/// `amount_due` at generation time; later edits to the bill never touch it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bill_payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bill_id: i32,
    pub due_date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((28, 9)))")]
    pub amount: Decimal,
    /// Set exactly once; a paid occurrence is immutable history.
    pub paid_at: Option<NaiveDateTime>,
    /// Ignored occurrences are excluded from totals and due-soon views.
    /// An occurrence is never both paid and ignored.
    #[sea_orm(default_value = "false")]
    pub ignored: bool,
}

impl Model {
    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    /// Whether the occurrence still counts toward the bill's total debt.
    pub fn is_outstanding(&self) -> bool {
        !self.is_paid() && !self.ignored
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each occurrence belongs to one bill.
    #[sea_orm(
        belongs_to = "bill::Entity",
        from = "Column::BillId",
        to = "bill::Column::Id",
        on_delete = "Cascade"
    )]
    Bill,
}

impl Related<bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bill.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
