use crate::entity_iden::EntityIden;
use model::entities::pay_schedule;
use model::entities::prelude::*;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Singleton table: the application only ever writes row id 1.
        manager
            .create_table(
                Table::create()
                    .table(PaySchedule::table())
                    .if_not_exists()
                    .col(integer(PaySchedule::column(pay_schedule::Column::Id)).primary_key())
                    .col(
                        string(PaySchedule::column(pay_schedule::Column::Frequency))
                            .string_len(10),
                    )
                    .col(date(PaySchedule::column(pay_schedule::Column::AnchorDate)))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaySchedule::table()).to_owned())
            .await?;

        Ok(())
    }
}
