// # aliassyncd - Alias Sync Daemon
//
// Thin integration layer: all reconciliation logic lives in aliassync-core,
// all firewall I/O in aliassync-opnsense.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the firewall client into a reconciler
// 4. Serving sync requests until SIGINT/SIGTERM
//
// ## Configuration
//
// ### Firewall (required)
// - `OPNSENSE_ADDRESS`: Base address of the firewall, e.g. `https://10.0.0.1`
// - `API_KEY`: API key
// - `API_SECRET`: API secret
//
// ### Records (required)
// - `DOMAIN_NAME`: Domain all managed hosts and aliases live in
//
// ### Daemon (optional)
// - `ALIASSYNC_LISTEN_ADDR`: Listen address (default `0.0.0.0:9657`)
// - `ALIASSYNC_HTTP_TIMEOUT_SECS`: Per-request timeout towards the firewall (default 30)
// - `ALIASSYNC_REQUEST_TIMEOUT_SECS`: How long a sync request waits (default 60)
// - `ALIASSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export OPNSENSE_ADDRESS=https://10.0.0.1
// export API_KEY=...
// export API_SECRET=...
// export DOMAIN_NAME=example.com
//
// aliassyncd
//
// curl -X POST localhost:9657/sync \
//     -d '{"host": "app.example.com", "aliases": ["api.example.com"]}'
// ```

mod server;

use aliassync_core::{Reconciler, StoreConfig, SyncConfig};
use aliassync_opnsense::OpnsenseClient;
use anyhow::Result;
use server::AppState;
use std::env;
use std::future::Future;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    sync: SyncConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let mut store = StoreConfig::new(
            required("OPNSENSE_ADDRESS")?,
            required("API_KEY")?,
            required("API_SECRET")?,
        );
        if let Some(timeout) = optional_secs("ALIASSYNC_HTTP_TIMEOUT_SECS")? {
            store.timeout_secs = timeout;
        }

        let mut sync = SyncConfig::new(store, required("DOMAIN_NAME")?);
        if let Ok(listen_addr) = env::var("ALIASSYNC_LISTEN_ADDR") {
            sync.listen_addr = listen_addr;
        }
        if let Some(timeout) = optional_secs("ALIASSYNC_REQUEST_TIMEOUT_SECS")? {
            sync.request_timeout_secs = timeout;
        }

        Ok(Self {
            sync,
            log_level: env::var("ALIASSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.sync.validate()?;

        if self.sync.listen_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "ALIASSYNC_LISTEN_ADDR '{}' is not a valid socket address. \
                Expected something like 0.0.0.0:9657",
                self.sync.listen_addr
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "ALIASSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn required(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => anyhow::bail!("{} is required. Set it via: export {}=...", name, name),
    }
}

fn optional_secs(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a number of seconds. Got: {}", name, value)),
        Err(_) => Ok(None),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    info!("Starting aliassyncd daemon");
    info!(
        "Managing domain {} on {}",
        config.sync.domain, config.sync.store.address
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            SyncExitCode::RuntimeError
        } else {
            SyncExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let client = OpnsenseClient::new(&config.sync.store)?;
    let reconciler = Reconciler::new(Arc::new(client), config.sync.domain.clone());

    let state = AppState {
        reconciler: Arc::new(reconciler),
        request_timeout: Duration::from_secs(config.sync.request_timeout_secs),
    };
    let app = server::build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let shutdown = shutdown_signal()?;
    let listener = tokio::net::TcpListener::bind(&config.sync.listen_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", config.sync.listen_addr, e))?;

    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let signal = shutdown.await;
            info!("Received shutdown signal: {}", signal);
        })
        .await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Install handlers for SIGTERM and SIGINT
///
/// Returns a future resolving to the name of the first signal received.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Fallback for non-Unix platforms: CTRL-C only
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
        }
        "SIGINT"
    })
}
