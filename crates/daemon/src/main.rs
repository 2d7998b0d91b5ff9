// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! idepoold — the workspace fleet control-plane daemon.

use tracing::error;
use tracing_subscriber::EnvFilter;

use idepool_daemon::{lifecycle, Config};

/// Log to the daemon log file, falling back to stderr when the path cannot
/// be split into directory + file name.
fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match (config.log_path.parent(), config.log_path.file_name()) {
        (Some(parent), Some(file_name)) => {
            let appender = tracing_appender::rolling::never(parent, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("idepoold: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = std::fs::create_dir_all(&config.state_dir) {
        eprintln!("idepoold: cannot create state dir: {e}");
        std::process::exit(1);
    }

    let _log_guard = init_tracing(&config);

    let state = match lifecycle::startup(config).await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("idepoold: {e}");
            std::process::exit(1);
        }
    };

    // Tell wrappers we are ready to accept connections.
    println!("READY");

    state.run().await;
}
