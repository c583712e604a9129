use anyhow::Context;
use clap::Parser;
use mockplane::admin_api::AdminApiServer;
use mockplane::config::Config;
use mockplane::engine::{EngineSlot, HttpEngineClient};
use mockplane::store::InMemoryMockStore;
use mockplane::sync::{ControlPlaneSynchronizer, SyncError};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mockplane", version, about = "Control plane for a multi-protocol mock server")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "MOCKPLANE_CONFIG")]
    config: Option<String>,

    /// Admin API port (overrides the config file)
    #[arg(short, long, env = "MOCKPLANE_PORT")]
    port: Option<u16>,

    /// Engine admin URL (overrides the config file)
    #[arg(long, env = "MOCKPLANE_ENGINE_URL")]
    engine_url: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "MOCKPLANE_LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(args.log_level.into()))
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.admin.port = port;
    }
    if let Some(url) = args.engine_url {
        config.engine.url = Some(url);
    }
    config.validate()?;

    let store = Arc::new(InMemoryMockStore::new());
    let engine = Arc::new(EngineSlot::new());
    if let Some(url) = &config.engine.url {
        let client = HttpEngineClient::new(url, config.engine.timeout())?;
        engine.connect(config.engine.id.clone(), Arc::new(client));
        info!(url = %url, "Engine gateway configured");
    } else {
        warn!("No engine URL configured, running store-only");
    }

    let sync = Arc::new(ControlPlaneSynchronizer::new(
        store,
        engine,
        config.sync_settings(),
    ));

    for workspace in config.workspaces.seed.clone() {
        let id = workspace.id.clone();
        match sync.create_workspace(workspace).await {
            Ok(ws) => info!(workspace_id = %ws.id, base_path = %ws.base_path, "Seeded workspace"),
            Err(SyncError::AlreadyExists(_)) => {}
            Err(e) => anyhow::bail!("failed to seed workspace '{}': {}", id, e),
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.admin.host, config.admin.port)
        .parse()
        .with_context(|| format!("invalid admin address {}:{}", config.admin.host, config.admin.port))?;
    let server = AdminApiServer::new(addr, sync);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
