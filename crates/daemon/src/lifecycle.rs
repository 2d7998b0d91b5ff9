// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: paths, single-instance lock, startup, shutdown.
//!
//! Startup order matters: acquire the lock before touching state, repair
//! the store against the runtime (one synchronous reaper pass) before any
//! assignment can be served, and only then start the loops and the
//! listener.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use idepool_core::{FleetConfig, SystemClock};
use idepool_engine::{
    Fleet, FleetDeps, HttpProber, LifecycleStats, LoopHeartbeats, ResourceProbe,
};
use idepool_storage::{StatsStore, WorkspaceStore};
use idepool_adapters::{DockerOrchestrator, S3BucketValidator};

use crate::env;
use crate::handlers::DaemonCtx;

/// Filesystem layout of a daemon instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/idepool)
    pub state_dir: PathBuf,
    /// Path to the Unix socket
    pub socket_path: PathBuf,
    /// Path to the lock/PID file
    pub lock_path: PathBuf,
    /// Path to the daemon log file
    pub log_path: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the fleet config file
    pub config_path: PathBuf,
}

impl Config {
    /// Resolve paths under the state directory, honoring env overrides.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            socket_path: env::socket_path_override()
                .unwrap_or_else(|| state_dir.join("daemon.sock")),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            db_path: state_dir.join("fleet.db"),
            config_path: env::config_path_override()
                .unwrap_or_else(|| state_dir.join("fleet.toml")),
            state_dir,
        })
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] idepool_core::config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] idepool_storage::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running daemon state.
pub struct DaemonState {
    pub config: Config,
    pub ctx: Arc<DaemonCtx<SystemClock>>,
    pub listener: UnixListener,
    pub loop_handles: Vec<JoinHandle<()>>,
    // NOTE(lifetime): held to maintain the exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Bring the daemon up: lock, store, adapters, fleet, startup reconcile,
/// loops, listener.
pub async fn startup(config: Config) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let lock_file = File::create(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    std::fs::write(&config.lock_path, std::process::id().to_string())?;

    let fleet_config = FleetConfig::load_or_default(&config.config_path)?;
    info!(
        target_pool_size = fleet_config.target_pool_size,
        domain = %fleet_config.domain,
        "fleet configuration loaded"
    );

    let store = Arc::new(WorkspaceStore::open(&config.db_path)?);

    // Stats share the database file; if they cannot be opened the rest of
    // the daemon still runs.
    let stats = match StatsStore::open(&config.db_path) {
        Ok(backend) => Arc::new(LifecycleStats::new(Arc::new(backend))),
        Err(e) => {
            warn!(error = %e, "stats backend unavailable");
            Arc::new(LifecycleStats::disabled())
        }
    };

    let admission = Arc::new(ResourceProbe::new(
        Arc::clone(&store),
        fleet_config.mem_threshold_pct,
        fleet_config.cpu_threshold_pct,
    ));

    let fleet = Fleet::assemble(
        fleet_config,
        FleetDeps {
            orchestrator: Arc::new(DockerOrchestrator::new()),
            validator: Arc::new(S3BucketValidator::new()),
            prober: Arc::new(HttpProber::new()),
            admission,
            store,
            stats,
            clock: SystemClock,
        },
    );

    // Repair drift between the store and the runtime before serving
    // anything or filling the pool.
    info!("running startup reconciliation");
    fleet.reaper.tick().await;

    let shutdown = CancellationToken::new();
    let heartbeats = LoopHeartbeats::new();
    let loop_handles = fleet.spawn_loops(&shutdown, &heartbeats);

    // A stale socket from an unclean exit would make bind fail.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;
    info!(socket = %config.socket_path.display(), "daemon listening");

    let ctx = Arc::new(DaemonCtx {
        fleet,
        heartbeats,
        shutdown,
        start_time: Instant::now(),
        version: env::PROTOCOL_VERSION.to_string(),
    });

    Ok(DaemonState { config, ctx, listener, loop_handles, lock_file })
}

impl DaemonState {
    /// Serve until a shutdown request or SIGINT, then tear down: loops stop
    /// at their next boundary, the socket and pid files are removed.
    pub async fn run(self) {
        let DaemonState { config, ctx, listener, loop_handles, lock_file } = self;

        let serve = crate::listener::serve(listener, Arc::clone(&ctx));
        tokio::select! {
            // serve() returns once the shutdown token fires (Shutdown request).
            _ = serve => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                ctx.shutdown.cancel();
            }
        }

        info!("shutting down daemon");
        for handle in loop_handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background loop did not join cleanly");
            }
        }

        for path in [&config.socket_path, &config.lock_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to remove file at shutdown");
                }
            }
        }

        // Lock released on drop.
        drop(lock_file);
        info!("daemon shutdown complete");
    }
}
