// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for socket I/O.
//!
//! Accepts connections and serves framed request/response pairs until the
//! client hangs up or the daemon shuts down. Handlers never panic the
//! listener: a failed dispatch becomes an error response, a failed write
//! just drops the connection.

use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use idepool_core::Clock;
use idepool_wire::{read_message, write_message, ProtocolError, Request};

use crate::handlers::{handle, DaemonCtx};

/// Accept connections until the shutdown token fires.
pub async fn serve<C: Clock>(listener: UnixListener, ctx: Arc<DaemonCtx<C>>) {
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        handle_connection(stream, ctx).await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                }
            },
        }
    }
    debug!("listener stopped");
}

async fn handle_connection<C: Clock>(mut stream: UnixStream, ctx: Arc<DaemonCtx<C>>) {
    loop {
        let request: Request = match read_message(&mut stream).await {
            Ok(request) => request,
            Err(ProtocolError::Closed) => return,
            Err(e) => {
                debug!(error = %e, "dropping connection after protocol error");
                return;
            }
        };

        debug!(?request, "handling request");
        let shutting_down = matches!(request, Request::Shutdown);
        let response = handle(&ctx, request).await;

        if let Err(e) = write_message(&mut stream, &response).await {
            debug!(error = %e, "dropping connection after write error");
            return;
        }
        if shutting_down {
            return;
        }
    }
}
