// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve state directory: IDEPOOL_STATE_DIR > XDG_STATE_HOME/idepool >
/// ~/.local/state/idepool
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("IDEPOOL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("idepool"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/idepool"))
}

/// Socket path override for clients and the daemon.
pub fn socket_path_override() -> Option<PathBuf> {
    std::env::var("IDEPOOL_SOCKET").ok().map(PathBuf::from)
}

/// Fleet config file override.
pub fn config_path_override() -> Option<PathBuf> {
    std::env::var("IDEPOOL_CONFIG").ok().map(PathBuf::from)
}
