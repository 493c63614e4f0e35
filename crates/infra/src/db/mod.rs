//! Connection pool and schema setup.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::store::StoreError;
use crate::store::postgres::map_sqlx_error;

/// Idempotent DDL for every table the repositories use.
pub const SCHEMA_SQL: &str = include_str!("../../migrations/0001_init.sql");

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;
    tracing::info!("database schema ensured");
    Ok(())
}
