//! Geoset Ingest - geospatial dataset ingestion tool

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geoset_common::logging::{init_logging, LogConfig, LogLevel};
use geoset_common::{NormalizedEntity, RawRecord};
use geoset_ingest::config::IngestConfig;
use geoset_ingest::driver::FlushThreshold;
use geoset_ingest::orchestrator::{FileOutcome, Orchestrator, OrchestratorSettings};
use geoset_ingest::registry::SourceRegistry;
use geoset_ingest::store::{EntityStore, MemoryEntityStore, PgEntityStore};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "geoset-ingest")]
#[command(author, version, about = "Geospatial dataset ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest every supported file in the data directory
    Run {
        /// Directory scanned for dataset files
        #[arg(short, long, env = "GEOSET_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Entities per flushed batch
        #[arg(short, long, env = "GEOSET_BATCH_SIZE")]
        batch_size: Option<usize>,

        /// Batch length that triggers a flush: full or one-short
        #[arg(long, env = "GEOSET_FLUSH_THRESHOLD")]
        flush_threshold: Option<FlushThreshold>,

        /// Records buffered between the reader and the batcher
        #[arg(long, env = "GEOSET_RELAY_CAPACITY")]
        relay_capacity: Option<usize>,

        /// Keep entities in memory instead of writing to the database
        #[arg(long)]
        dry_run: bool,

        /// Do not apply database migrations before ingesting
        #[arg(long)]
        skip_migrations: bool,
    },

    /// Insert a single entity
    Add {
        #[arg(long)]
        name: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        height: f64,

        /// Recorded as the entity's source file
        #[arg(long, default_value = "manual")]
        source: String,
    },

    /// List the registered file name patterns and their formats
    Formats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("geoset-ingest")
        .filter_directives("sqlx=warn")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    match cli.command {
        Command::Run {
            data_dir,
            batch_size,
            flush_threshold,
            relay_capacity,
            dry_run,
            skip_migrations,
        } => {
            let mut config = IngestConfig::load()?;
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(size) = batch_size {
                config.batch_size = size;
            }
            if let Some(threshold) = flush_threshold {
                config.flush_threshold = threshold;
            }
            if let Some(capacity) = relay_capacity {
                config.relay_capacity = capacity;
            }
            config.validate()?;

            run(config, dry_run, skip_migrations).await?;
        },
        Command::Add {
            name,
            lat,
            lon,
            description,
            height,
            source,
        } => {
            let config = IngestConfig::load()?;
            let store = PgEntityStore::connect(&config.database).await?;

            let entity = NormalizedEntity::from_raw(
                RawRecord::new(name, description, lon, lat, height),
                source,
            );
            store.create(&entity).await.context("Failed to insert entity")?;

            info!(
                id = %entity.id(),
                cell = %entity.spatial_key(),
                "Entity created"
            );
            println!("{}", entity.id());
        },
        Command::Formats => {
            let registry = SourceRegistry::builtin()?;
            for descriptor in registry.descriptors() {
                println!("{:<22} {}", descriptor.label, descriptor.pattern);
            }
        },
    }

    Ok(())
}

async fn run(config: IngestConfig, dry_run: bool, skip_migrations: bool) -> Result<()> {
    let store: Arc<dyn EntityStore> = if dry_run {
        info!("Dry run, entities are kept in memory");
        Arc::new(MemoryEntityStore::new())
    } else {
        let store = PgEntityStore::connect(&config.database)
            .await
            .context("Failed to connect to database")?;
        store.health_check().await.context("Database health check failed")?;

        if !skip_migrations {
            info!("Running database migrations");
            store.migrate().await?;
        }
        Arc::new(store)
    };

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let orchestrator = Orchestrator::new(
        SourceRegistry::builtin()?,
        store,
        OrchestratorSettings::from_config(&config),
    );

    let summary = orchestrator.run(cancel).await?;

    for report in &summary.files {
        match &report.outcome {
            FileOutcome::Ingested => info!(
                file = %report.file_name,
                records = report.stats.records_received,
                flushed = report.stats.entities_flushed,
                failed_batches = report.stats.batches_failed,
                "File ingested"
            ),
            FileOutcome::Skipped(reason) => warn!(file = %report.file_name, %reason, "File skipped"),
            FileOutcome::Failed(reason) => error!(file = %report.file_name, %reason, "File failed"),
            FileOutcome::Cancelled => warn!(file = %report.file_name, "File cancelled"),
        }
    }

    if summary.was_cancelled() {
        warn!("Ingestion interrupted");
    } else {
        info!("Ingestion complete");
    }

    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn cancel_on_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling ingestion");
        },
        _ = terminate => {
            info!("Received terminate signal, cancelling ingestion");
        },
    }

    token.cancel();
}
