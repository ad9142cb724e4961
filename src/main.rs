use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use gfs_archive::adapters::background::{PeriodicDriver, PeriodicDriverConfig};
use gfs_archive::adapters::clock::SystemClock;
use gfs_archive::adapters::converter::Grib2JsonConverter;
use gfs_archive::adapters::http::{build_router, RetrievalAppState};
use gfs_archive::adapters::nomads::NomadsSource;
use gfs_archive::adapters::storage::LocalArtifactStore;
use gfs_archive::application::{ConvertArtifactHandler, EvictStaleHandler, RunHarvestHandler};
use gfs_archive::config::{AppConfig, LogFormat};
use gfs_archive::ports::{ArtifactStore, Clock, Converter, RemoteSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_level))?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.server.log_format() {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    config.validate()?;
    let addr = config.server.socket_addr()?;

    tracing::info!(
        environment = ?config.server.environment,
        resolution_deg = config.source.resolution.degrees(),
        max_history_days = config.harvest.max_history_days,
        max_forecast_hours = config.harvest.max_forecast_hours,
        "Starting gfs-archive"
    );

    // Ports
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn ArtifactStore> = Arc::new(LocalArtifactStore::new(
        &config.cache.raw_dir,
        &config.cache.json_dir,
    ));
    let source: Arc<dyn RemoteSource> = Arc::new(NomadsSource::new(
        config.source.query(),
        config.source.request_timeout(),
    )?);
    let converter: Arc<dyn Converter> =
        Arc::new(Grib2JsonConverter::new(config.converter.grib2json()));

    // No lineage is running yet, so any raw scratch is orphaned.
    store.ensure_dirs().await?;
    let purged = store.purge_raw().await?;
    if purged > 0 {
        tracing::info!(purged, "Removed leftover raw payloads");
    }

    // Handlers
    let convert = Arc::new(ConvertArtifactHandler::new(store.clone(), converter));
    let harvest = Arc::new(RunHarvestHandler::new(
        store.clone(),
        source,
        convert,
        clock.clone(),
        config.harvest.policy(),
    ));
    let evict = Arc::new(EvictStaleHandler::new(store.clone(), clock.clone()));

    // Background driver
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver = PeriodicDriver::new(
        harvest,
        evict,
        PeriodicDriverConfig::default()
            .with_poll_interval(config.harvest.poll_interval())
            .with_auto_cleanup(config.cache.auto_cleanup)
            .with_cleanup_threshold_days(config.cache.cleanup_threshold_days),
    );
    let driver_task = tokio::spawn(async move { driver.run(shutdown_rx).await });

    // HTTP
    let state = RetrievalAppState::new(store, clock, config.harvest.max_forecast_hours);
    let app = build_router(
        state,
        &config.server.cors_origins_list(),
        config.server.request_timeout(),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = driver_task.await {
        tracing::error!(error = %e, "Periodic driver task failed");
    }

    Ok(())
}
