//! Postgres-backed entity store

use std::time::Duration;

use async_trait::async_trait;
use geoset_common::NormalizedEntity;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::{debug, info};

use super::{EntityStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;

/// Postgres caps bind parameters per statement at `u16::MAX`
const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// Bound columns per entity row
const PARAMS_PER_ENTITY: usize = 10;

/// Largest chunk that fits in one statement
pub const MAX_ROWS_PER_STATEMENT: usize = MAX_BIND_PARAMS / PARAMS_PER_ENTITY;

/// Entity store writing to the `entities` table
#[derive(Debug, Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    /// Create a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        config
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database connection pool created"
        );

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }

    /// Total number of stored entities
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entities")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of stored entities read from `source_file`
    pub async fn count_by_source(&self, source_file: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entities WHERE source_file = $1")
            .bind(source_file)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_chunk(
        tx: &mut Transaction<'_, Postgres>,
        chunk: &[NormalizedEntity],
    ) -> StoreResult<()> {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            INSERT INTO entities (
                id, source_file, name, description,
                longitude, latitude, height, metadata,
                cell_id, cell_token
            )
            "#,
        );

        query_builder.push_values(chunk, |mut b, entity| {
            b.push_bind(entity.id())
                .push_bind(entity.source_file())
                .push_bind(entity.name())
                .push_bind(entity.description())
                .push_bind(entity.longitude())
                .push_bind(entity.latitude())
                .push_bind(entity.height())
                .push_bind(entity.metadata())
                .push_bind(entity.spatial_key().cell_id_i64())
                .push_bind(&entity.spatial_key().token);
        });

        query_builder.build().execute(&mut **tx).await?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn create(&self, entity: &NormalizedEntity) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO entities (
                id, source_file, name, description,
                longitude, latitude, height, metadata,
                cell_id, cell_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entity.id())
        .bind(entity.source_file())
        .bind(entity.name())
        .bind(entity.description())
        .bind(entity.longitude())
        .bind(entity.latitude())
        .bind(entity.height())
        .bind(entity.metadata())
        .bind(entity.spatial_key().cell_id_i64())
        .bind(&entity.spatial_key().token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn bulk_insert(&self, entities: &[NormalizedEntity], batch_size: usize) -> StoreResult<()> {
        if entities.is_empty() {
            return Ok(());
        }

        let chunk_size = batch_size.clamp(1, MAX_ROWS_PER_STATEMENT);
        let mut tx = self.pool.begin().await?;

        for chunk in entities.chunks(chunk_size) {
            Self::insert_chunk(&mut tx, chunk).await?;
        }

        tx.commit().await?;

        debug!(rows = entities.len(), chunk_size, "Bulk insert committed");
        Ok(())
    }
}
