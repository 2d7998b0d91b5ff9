// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! idepool — CLI for the workspace fleet control plane.

mod client;
mod render;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use idepool_wire::{Request, Response};

#[derive(Parser)]
#[command(name = "idepool", about = "Manage browser-accessible developer workspaces", version)]
struct Cli {
    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a workspace bound to an object-storage bucket
    Start {
        /// Bucket name (3-63 lowercase alphanumerics, '.', '-')
        bucket: String,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        access_key_id: Option<String>,
        #[arg(long)]
        secret_access_key: Option<String>,
        #[arg(long)]
        vnc_password: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// List workspaces
    List {
        /// Filter by status (starting|running|stopping|stopped|failed)
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Show one workspace
    Get { id: String },
    /// Stop a workspace
    Stop { id: String },
    /// Show pool, resource, and loop status
    Status,
    /// Stop the daemon
    Shutdown,
}

impl Command {
    fn into_request(self) -> Request {
        match self {
            Command::Start {
                bucket,
                region,
                access_key_id,
                secret_access_key,
                vnc_password,
                user_id,
            } => Request::Start { bucket, region, access_key_id, secret_access_key, vnc_password, user_id },
            Command::List { status, limit, offset } => Request::List {
                status,
                limit: limit.map(|n| n.to_string()),
                offset: offset.map(|n| n.to_string()),
            },
            Command::Get { id } => Request::Get { id },
            Command::Stop { id } => Request::Stop { id },
            Command::Status => Request::PoolStatus,
            Command::Shutdown => Request::Shutdown,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let response = client::send(cli.command.into_request()).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        Response::Started { workspace, message } => {
            println!("{message}");
            render::workspace(&workspace);
        }
        Response::Workspaces { workspaces, total } => {
            render::workspace_table(&workspaces);
            println!("{total} total");
        }
        Response::Workspace { workspace } => render::workspace(&workspace),
        Response::Stopped { id } => println!("stopped {id}"),
        Response::Pool { report } => render::pool(&report),
        Response::ShuttingDown => println!("daemon shutting down"),
        Response::Pong => println!("pong"),
        Response::Ok | Response::Hello { .. } => println!("ok"),
        Response::Error { .. } => bail!("unreachable: errors are raised by the client"),
    }
    Ok(())
}
