use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{account, bill, bill_payment};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create bills table
        manager
            .create_table(
                Table::create()
                    .table(Bill::table())
                    .if_not_exists()
                    .col(pk_auto(Bill::column(bill::Column::Id)))
                    .col(string(Bill::column(bill::Column::Payee)))
                    .col(string(Bill::column(bill::Column::Period)).string_len(7))
                    .col(decimal(Bill::column(bill::Column::AmountDue)).decimal_len(28, 9))
                    .col(decimal(Bill::column(bill::Column::TotalDebt)).decimal_len(28, 9))
                    .col(integer_null(Bill::column(bill::Column::AccountId)))
                    .col(integer_null(Bill::column(bill::Column::DueDay)))
                    .col(integer_null(Bill::column(bill::Column::DueMonth)))
                    .col(integer_null(Bill::column(bill::Column::DueDom)))
                    .col(boolean(Bill::column(bill::Column::Active)).default(true))
                    .col(string_null(Bill::column(bill::Column::Notes)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bills_account")
                            .from(Bill::table(), Bill::column(bill::Column::AccountId))
                            .to(Account::table(), Account::column(account::Column::Id))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create bill_payments table
        manager
            .create_table(
                Table::create()
                    .table(BillPayment::table())
                    .if_not_exists()
                    .col(pk_auto(BillPayment::column(bill_payment::Column::Id)))
                    .col(integer(BillPayment::column(bill_payment::Column::BillId)))
                    .col(date(BillPayment::column(bill_payment::Column::DueDate)))
                    .col(
                        decimal(BillPayment::column(bill_payment::Column::Amount))
                            .decimal_len(28, 9),
                    )
                    .col(date_time_null(BillPayment::column(
                        bill_payment::Column::PaidAt,
                    )))
                    .col(
                        boolean(BillPayment::column(bill_payment::Column::Ignored)).default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bill_payments_bill")
                            .from(
                                BillPayment::table(),
                                BillPayment::column(bill_payment::Column::BillId),
                            )
                            .to(Bill::table(), Bill::column(bill::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // (bill_id, due_date) is the natural key; generation relies on this
        // constraint for idempotency under concurrent retries.
        manager
            .create_index(
                Index::create()
                    .name("uq_bill_payments_bill_due_date")
                    .table(BillPayment::table())
                    .col(BillPayment::column(bill_payment::Column::BillId))
                    .col(BillPayment::column(bill_payment::Column::DueDate))
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillPayment::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bill::table()).to_owned())
            .await?;

        Ok(())
    }
}
