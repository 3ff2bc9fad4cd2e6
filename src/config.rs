use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

/// Shared application state handed to the service layer.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

/// Initialize application configuration and state
pub async fn initialize_app_state() -> Result<AppState> {
    // Load configuration
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://fintrack.db".to_string());

    // Connect to database
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(&database_url).await?;

    Ok(AppState { db })
}

/// Bring the schema up to date.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None).await?;
    Ok(())
}
