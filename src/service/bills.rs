use chrono::NaiveDate;
use compute::error::{EngineError, Result};
use compute::schedule;
use model::cadence::Cadence;
use model::entities::bill::{self, BillPeriod};
use model::entities::prelude::Bill;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

fn parse_period(period: &str) -> Result<BillPeriod> {
    BillPeriod::try_from_value(&period.to_string())
        .map_err(|_| EngineError::Validation(format!("unknown bill period '{period}'")))
}

async fn load_bill(db: &DatabaseConnection, bill_id: i32) -> Result<bill::Model> {
    Bill::find_by_id(bill_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("bill {bill_id} not found")))
}

/// Request body for creating a new bill. `period` is `"Monthly"` or
/// `"Yearly"`; the matching cadence fields must be populated and the other
/// cadence's fields left empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBillRequest {
    pub payee: String,
    pub period: String,
    pub amount_due: Decimal,
    #[serde(default)]
    pub total_debt: Option<Decimal>,
    #[serde(default)]
    pub account_id: Option<i32>,
    #[serde(default)]
    pub due_day: Option<i32>,
    #[serde(default)]
    pub due_month: Option<i32>,
    #[serde(default)]
    pub due_dom: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for replacing a bill's cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCadenceRequest {
    pub period: String,
    #[serde(default)]
    pub due_day: Option<i32>,
    #[serde(default)]
    pub due_month: Option<i32>,
    #[serde(default)]
    pub due_dom: Option<i32>,
}

/// Creates a bill. The cadence fields are validated before anything is
/// written; the storage constraints back this up underneath.
#[instrument(skip(db, request), fields(payee = %request.payee))]
pub async fn create_bill(
    db: &DatabaseConnection,
    request: CreateBillRequest,
) -> Result<bill::Model> {
    let period = parse_period(&request.period)?;
    Cadence::from_columns(period, request.due_day, request.due_month, request.due_dom)?;

    let bill = bill::ActiveModel {
        payee: Set(request.payee),
        period: Set(period),
        amount_due: Set(request.amount_due),
        total_debt: Set(request.total_debt.unwrap_or(Decimal::ZERO)),
        account_id: Set(request.account_id),
        due_day: Set(request.due_day),
        due_month: Set(request.due_month),
        due_dom: Set(request.due_dom),
        active: Set(true),
        notes: Set(request.notes),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("bill {} created for {}", bill.id, bill.payee);
    Ok(bill)
}

/// Replaces a bill's cadence and regenerates its future unpaid occurrences.
/// Returns the updated bill and the regenerated due dates; paid history is
/// untouched.
#[instrument(skip(db, request))]
pub async fn update_bill_cadence(
    db: &DatabaseConnection,
    bill_id: i32,
    request: UpdateCadenceRequest,
    today: NaiveDate,
) -> Result<(bill::Model, Vec<NaiveDate>)> {
    let period = parse_period(&request.period)?;
    // Reject malformed cadences before the bill row is touched.
    Cadence::from_columns(period, request.due_day, request.due_month, request.due_dom)?;

    let bill = load_bill(db, bill_id).await?;
    let mut active = bill.into_active_model();
    active.period = Set(period);
    active.due_day = Set(request.due_day);
    active.due_month = Set(request.due_month);
    active.due_dom = Set(request.due_dom);
    let bill = active.update(db).await?;

    let regenerated = schedule::regenerate(db, &bill, today).await?;
    info!(
        "bill {} cadence updated, {} occurrences regenerated",
        bill.id,
        regenerated.len()
    );
    Ok((bill, regenerated))
}

/// Deactivates a bill: future generation stops and its not-yet-due unpaid
/// occurrences are dropped. Paid history is kept.
#[instrument(skip(db))]
pub async fn deactivate_bill(
    db: &DatabaseConnection,
    bill_id: i32,
    today: NaiveDate,
) -> Result<bill::Model> {
    let bill = load_bill(db, bill_id).await?;
    let mut active = bill.into_active_model();
    active.active = Set(false);
    let bill = active.update(db).await?;

    let pruned = schedule::prune_future_occurrences(db, bill_id, today).await?;
    info!("bill {} deactivated, {} occurrences pruned", bill.id, pruned);
    Ok(bill)
}
