use chrono::Utc;
use common::LegacyFlag;
use compute::error::{EngineError, Result};
use model::entities::account;
use rust_decimal::Decimal;
use sea_orm::{ActiveEnum, ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

// Balance projections come straight from the engine.
pub use compute::ledger::{account_balances, account_overview};

/// Request body for creating a new account.
///
/// `kind` is the account-kind lookup code. The `interest` and `active`
/// flags accept native booleans or the legacy `'YES'`/`'NO'` strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub institution: String,
    pub kind: i32,
    pub name: String,
    pub opening_balance: Decimal,
    pub interest: LegacyFlag,
    #[serde(default)]
    pub apy: Option<Decimal>,
    #[serde(default)]
    pub active: Option<LegacyFlag>,
}

/// Creates an account opened today. New accounts default to active.
#[instrument(skip(db, request), fields(name = %request.name))]
pub async fn create_account(
    db: &DatabaseConnection,
    request: CreateAccountRequest,
) -> Result<account::Model> {
    let kind = account::AccountKind::try_from_value(&request.kind)
        .map_err(|_| EngineError::Validation(format!("unknown account kind code {}", request.kind)))?;

    let account = account::ActiveModel {
        institution: Set(request.institution),
        kind: Set(kind),
        name: Set(request.name),
        active: Set(request.active.map(LegacyFlag::as_bool).unwrap_or(true)),
        opening_balance: Set(request.opening_balance),
        interest: Set(request.interest.as_bool()),
        apy: Set(request.apy),
        opened_on: Set(Utc::now().date_naive()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("account {} created at {}", account.id, account.institution);
    Ok(account)
}
