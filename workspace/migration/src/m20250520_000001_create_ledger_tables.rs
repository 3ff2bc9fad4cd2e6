use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{account, transaction};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Account::table())
                    .if_not_exists()
                    .col(pk_auto(Account::column(account::Column::Id)))
                    .col(string(Account::column(account::Column::Institution)))
                    .col(integer(Account::column(account::Column::Kind)))
                    .col(string(Account::column(account::Column::Name)))
                    .col(boolean(Account::column(account::Column::Active)).default(true))
                    .col(
                        decimal(Account::column(account::Column::OpeningBalance))
                            .decimal_len(28, 9),
                    )
                    .col(boolean(Account::column(account::Column::Interest)))
                    .col(decimal_null(Account::column(account::Column::Apy)).decimal_len(8, 5))
                    .col(date(Account::column(account::Column::OpenedOn)))
                    .to_owned(),
            )
            .await?;

        // Create transactions table
        manager
            .create_table(
                Table::create()
                    .table(Transaction::table())
                    .if_not_exists()
                    .col(pk_auto(Transaction::column(transaction::Column::Id)))
                    .col(integer(Transaction::column(transaction::Column::AccountId)))
                    .col(integer(Transaction::column(transaction::Column::SortKey)))
                    .col(boolean(Transaction::column(transaction::Column::Pending)))
                    .col(integer(Transaction::column(transaction::Column::Kind)))
                    .col(integer(Transaction::column(transaction::Column::Method)))
                    .col(integer(Transaction::column(transaction::Column::Category)))
                    .col(string(Transaction::column(transaction::Column::Payee)))
                    .col(
                        decimal(Transaction::column(transaction::Column::Amount))
                            .decimal_len(28, 9),
                    )
                    .col(
                        decimal(Transaction::column(transaction::Column::Balance))
                            .decimal_len(28, 9),
                    )
                    .col(date(Transaction::column(transaction::Column::PostedOn)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_account")
                            .from(
                                Transaction::table(),
                                Transaction::column(transaction::Column::AccountId),
                            )
                            .to(Account::table(), Account::column(account::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Balance recomputation walks rows in (sort_key, id) order per account.
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_account_order")
                    .table(Transaction::table())
                    .col(Transaction::column(transaction::Column::AccountId))
                    .col(Transaction::column(transaction::Column::SortKey))
                    .col(Transaction::column(transaction::Column::Id))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transaction::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Account::table()).to_owned())
            .await?;

        Ok(())
    }
}
