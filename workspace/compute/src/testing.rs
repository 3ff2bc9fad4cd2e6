//! Shared scaffolding for engine tests.

use chrono::{NaiveDate, NaiveDateTime};
use migration::{Migrator, MigratorTrait};
use model::entities::{account, bill};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn datetime(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(12, 0, 0).unwrap()
}

pub async fn create_account(db: &DatabaseConnection, opening_balance: Decimal) -> account::Model {
    account::ActiveModel {
        institution: Set("First National".to_string()),
        kind: Set(account::AccountKind::Checking),
        name: Set("Everyday Checking".to_string()),
        active: Set(true),
        opening_balance: Set(opening_balance),
        interest: Set(false),
        apy: Set(None),
        opened_on: Set(date(2024, 6, 1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test account")
}

pub async fn create_monthly_bill(
    db: &DatabaseConnection,
    account_id: Option<i32>,
    due_day: i32,
    amount_due: Decimal,
    total_debt: Decimal,
) -> bill::Model {
    bill::ActiveModel {
        payee: Set("Hilltop Properties".to_string()),
        period: Set(bill::BillPeriod::Monthly),
        amount_due: Set(amount_due),
        total_debt: Set(total_debt),
        account_id: Set(account_id),
        due_day: Set(Some(due_day)),
        due_month: Set(None),
        due_dom: Set(None),
        active: Set(true),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test bill")
}

pub async fn create_yearly_bill(
    db: &DatabaseConnection,
    due_month: i32,
    due_dom: i32,
    amount_due: Decimal,
) -> bill::Model {
    bill::ActiveModel {
        payee: Set("Evergreen Insurance".to_string()),
        period: Set(bill::BillPeriod::Yearly),
        amount_due: Set(amount_due),
        total_debt: Set(Decimal::ZERO),
        account_id: Set(None),
        due_day: Set(None),
        due_month: Set(Some(due_month)),
        due_dom: Set(Some(due_dom)),
        active: Set(true),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test bill")
}
