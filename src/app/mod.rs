use crate::analysis;
use crate::api::{ApiCommand, ApiServer};
use crate::cloud;
use crate::config::{Config, SettingsHandle};
use crate::global;
use crate::media::{LiveMediaProvider, MediaProvider};
use crate::monitor::{MonitorMachine, MonitorStatusHandle};
use crate::store::RecordingStore;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn run_service() -> Result<()> {
    info!("Starting vigil service");

    let config = Config::load()?;
    let provider: Arc<dyn MediaProvider> = Arc::new(LiveMediaProvider);
    run_service_with(config, provider).await
}

/// Wiring split out so tests can inject a scripted media provider.
pub async fn run_service_with(config: Config, provider: Arc<dyn MediaProvider>) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<ApiCommand>(10);

    let cloud_sync = cloud::build(&config.cloud);
    let analysis_service = analysis::build(&config.analysis);
    let store = RecordingStore::new(cloud_sync, analysis_service, global::exports_dir()?);

    let status = MonitorStatusHandle::default();
    let settings = SettingsHandle::new(config.monitor);
    let mut machine = MonitorMachine::new(provider, store.clone(), status.clone());

    let api_server = ApiServer::new(tx, status, settings.clone(), store, &config);
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    info!("vigil is ready");
    info!(
        "Start monitoring with: curl -X POST http://127.0.0.1:{}/monitor/start",
        config.api.port
    );

    // The command loop owns the machine; API handlers only send commands.
    while let Some(command) = rx.recv().await {
        match command {
            ApiCommand::StartMonitoring => {
                let snapshot = settings.get().await;
                match machine.start(snapshot).await {
                    Ok(()) => info!("Monitoring started"),
                    Err(e) => error!("Failed to start monitoring: {}", e),
                }
            }
            ApiCommand::StopMonitoring => match machine.stop().await {
                Ok(()) => info!("Monitoring stopped"),
                Err(e) => error!("Failed to stop monitoring: {}", e),
            },
        }
    }

    Ok(())
}
