//! Postgres entity store tests
//!
//! These start a Postgres container and are ignored by default:
//! `cargo test -p geoset-ingest --test postgres_store_tests -- --ignored`

mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{init_tracing, placemark_sheet, write_fixture};
use geoset_common::{NormalizedEntity, RawRecord};
use geoset_ingest::driver::{DriverConfig, FlushThreshold};
use geoset_ingest::orchestrator::{Orchestrator, OrchestratorSettings};
use geoset_ingest::registry::SourceRegistry;
use geoset_ingest::store::{EntityStore, PgEntityStore};
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;
use tempfile::TempDir;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio_util::sync::CancellationToken;
use tracing::info;

async fn start_store() -> Result<(ContainerAsync<Postgres>, PgEntityStore)> {
    let container = Postgres::default().with_tag("16-alpine").start().await?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let conn_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&conn_string)
        .await?;

    let store = PgEntityStore::from_pool(pool);
    store.migrate().await?;
    store.health_check().await?;

    Ok((container, store))
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_create_and_bulk_insert() -> Result<()> {
    init_tracing();
    let (_container, store) = start_store().await?;

    let single = NormalizedEntity::from_raw(
        RawRecord::new("Uluru", "sandstone monolith", 131.0369, -25.3444, 863.0),
        "manual",
    );
    store.create(&single).await?;

    let batch: Vec<_> = (0..25)
        .map(|i| {
            NormalizedEntity::from_raw(
                RawRecord::new(format!("site {i}"), "", i as f64, -(i as f64), 0.0),
                "bulk.csv",
            )
        })
        .collect();

    // Chunk size smaller than the batch: several statements in one transaction
    store.bulk_insert(&batch, 10).await?;

    assert_eq!(store.count().await?, 26);
    assert_eq!(store.count_by_source("bulk.csv").await?, 25);

    let (cell_id, token): (i64, String) =
        sqlx::query_as("SELECT cell_id, cell_token FROM entities WHERE id = $1")
            .bind(single.id())
            .fetch_one(store.pool())
            .await?;
    assert_eq!(cell_id as u64, single.spatial_key().cell_id);
    assert_eq!(token, single.spatial_key().token);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_duplicate_id_rolls_back_whole_batch() -> Result<()> {
    init_tracing();
    let (_container, store) = start_store().await?;

    let entity = NormalizedEntity::from_raw(RawRecord::new("a", "", 1.0, 1.0, 0.0), "dup.csv");
    let other = NormalizedEntity::from_raw(RawRecord::new("b", "", 2.0, 2.0, 0.0), "dup.csv");

    let result = store.bulk_insert(&[other, entity.clone(), entity], 1).await;
    assert!(result.is_err());
    assert_eq!(store.count().await?, 0);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_directory_ingestion_into_postgres() -> Result<()> {
    init_tracing();
    let (_container, store) = start_store().await?;

    let dir = TempDir::new()?;
    write_fixture(dir.path(), "Rank 1 Archaeology Sites.csv", &placemark_sheet(1234));

    let store = Arc::new(store);
    let orchestrator = Orchestrator::new(
        SourceRegistry::builtin()?,
        store.clone(),
        OrchestratorSettings {
            data_dir: dir.path().to_path_buf(),
            marker_file: ".gitignore".to_string(),
            relay_capacity: 50,
            driver: DriverConfig {
                batch_size: 500,
                threshold: FlushThreshold::Full,
            },
        },
    );

    let summary = orchestrator.run(CancellationToken::new()).await?;
    info!(flushed = summary.entities_flushed(), "Run finished");

    assert_eq!(summary.files[0].stats.batches_flushed, 3);
    assert_eq!(store.count_by_source("Rank 1 Archaeology Sites.csv").await?, 1234);

    Ok(())
}
