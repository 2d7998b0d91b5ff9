// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: one request, one response, over the Unix socket.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::net::UnixStream;

use idepool_wire::{read_message, write_message, Request, Response};

/// Resolve the daemon socket: IDEPOOL_SOCKET > state dir default.
pub fn socket_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("IDEPOOL_SOCKET") {
        return Ok(PathBuf::from(path));
    }
    if let Ok(dir) = std::env::var("IDEPOOL_STATE_DIR") {
        return Ok(PathBuf::from(dir).join("daemon.sock"));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("idepool/daemon.sock"));
    }
    let home = std::env::var("HOME").context("HOME not set")?;
    Ok(PathBuf::from(home).join(".local/state/idepool/daemon.sock"))
}

/// Send one request and wait for the response.
pub async fn send(request: Request) -> Result<Response> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .await
        .with_context(|| format!("cannot reach daemon at {} (is idepoold running?)", path.display()))?;

    write_message(&mut stream, &request).await.context("failed to send request")?;
    let response: Response = read_message(&mut stream).await.context("failed to read response")?;

    if let Response::Error { kind, http_status, message } = &response {
        bail!("{kind} ({http_status}): {message}");
    }
    Ok(response)
}
