use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::env;

use crate::config::DatabaseConfig;
use crate::error::{EvaluationCoreError, Result};

pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Connect using `DATABASE_URL` when set, falling back to the configured
    /// url.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| config.url.clone());

        let pool = PgPoolOptions::new()
            .max_connections(config.pool)
            .connect(&database_url)
            .await
            .map_err(|e| EvaluationCoreError::database("connect", &e))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool> {
        let row = sqlx::query("SELECT 1 as health")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| EvaluationCoreError::database("health_check", &e))?;

        let health: i32 = row.get("health");
        Ok(health == 1)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
