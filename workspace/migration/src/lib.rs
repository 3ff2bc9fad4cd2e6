pub use sea_orm_migration::prelude::*;

pub mod entity_iden;
mod m20250520_000001_create_ledger_tables;
mod m20250520_000002_create_bills;
mod m20250607_000001_create_pay_schedule;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250520_000001_create_ledger_tables::Migration),
            Box::new(m20250520_000002_create_bills::Migration),
            Box::new(m20250607_000001_create_pay_schedule::Migration),
        ]
    }
}
