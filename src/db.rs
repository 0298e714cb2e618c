use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::AppConfig;
use crate::tenants::schema::{SchemaError, TenantSchema};

/// Failure of a single storage call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    /// Postgres SQLSTATE, when the failure came from the server.
    pub fn sqlstate(&self) -> Option<String> {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
            _ => None,
        }
    }
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    info!(max_connections = config.max_connections, "database pool ready");
    Ok(db)
}

/// Registry and tenant-schema access over one Postgres pool.
///
/// Registry tables live in `registry`; tenant tables in the schema named by
/// each tenant row.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) db: PgPool,
    pub(crate) registry: TenantSchema,
}

impl PgStore {
    pub fn new(db: PgPool, registry: TenantSchema) -> Self {
        Self { db, registry }
    }
}
