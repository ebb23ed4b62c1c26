use db_pool::{create_pool, DbConfig};
use sqlx::{Pool, Postgres};

pub const SERVICE_NAME: &str = "social-api";

/// Pool from `DATABASE_URL` plus the `DB_*` tuning variables
pub async fn init_pool() -> Result<Pool<Postgres>, String> {
    let config = DbConfig::from_env(SERVICE_NAME)?;
    config.log_config();
    create_pool(config).await.map_err(|e| e.to_string())
}

/// Apply the embedded migrations; idempotent
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}
