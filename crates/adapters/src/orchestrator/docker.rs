// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker orchestrator — drives workspace services through the `docker` CLI.
//!
//! Workspaces run as docker services so the reverse proxy can discover them
//! from labels and the runtime's own restart policy handles crashed
//! containers. Environment mutation for bucket attachment uses
//! `docker service update --env-add`, which the runtime applies by rolling
//! the task, and the in-container agent re-reads its environment on start.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use idepool_core::{Clock, Credentials, ServiceUrls, SystemClock, WorkspaceId, SERVICE_PREFIX};

use super::labels;
use super::{CreateOptions, CreatedService, Orchestrator, OrchestratorError, ServiceRecord, StopOutcome};

/// Environment keys the in-container agent reads.
const ENV_BUCKET: &str = "IDE_BUCKET";
const ENV_REGION: &str = "IDE_REGION";
const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const ENV_VNC_PASSWORD: &str = "VNC_PW";

/// Orchestrator over the `docker` CLI.
#[derive(Clone)]
pub struct DockerOrchestrator {
    image: String,
    network: String,
    clock: SystemClock,
}

impl DockerOrchestrator {
    pub fn new() -> Self {
        let image = std::env::var("IDEPOOL_IMAGE")
            .unwrap_or_else(|_| "idepool/workspace:latest".to_string());
        let network =
            std::env::var("IDEPOOL_NETWORK").unwrap_or_else(|_| "idepool".to_string());
        Self { image, network, clock: SystemClock }
    }

    /// Generate an id no live service already uses.
    async fn fresh_id(&self) -> Result<WorkspaceId, OrchestratorError> {
        loop {
            let id = WorkspaceId::generate();
            if self.get(&id).await?.is_none() {
                return Ok(id);
            }
            tracing::debug!(%id, "generated id collides with live service, retrying");
        }
    }

    /// Inspect one service; `None` when the runtime does not know it.
    async fn inspect(
        &self,
        service_name: &str,
    ) -> Result<Option<InspectedService>, OrchestratorError> {
        let out =
            run_docker(&["service", "inspect", "--format", "{{json .}}", service_name]).await;
        match out {
            Ok(json) => {
                let parsed = parse_inspect(&json).ok_or_else(|| {
                    OrchestratorError::Runtime(format!("unparseable inspect for {service_name}"))
                })?;
                Ok(Some(parsed))
            }
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(OrchestratorError::Runtime(e)),
        }
    }

    /// Runtime-reported status string for a service's current task.
    async fn task_status(&self, service_name: &str) -> String {
        let out = run_docker(&[
            "service",
            "ps",
            service_name,
            "--format",
            "{{.CurrentState}}",
            "--filter",
            "desired-state=running",
        ])
        .await;
        match out {
            Ok(states) => {
                let first = states.lines().next().unwrap_or_default();
                if first.starts_with("Running") {
                    "running".to_string()
                } else {
                    "starting".to_string()
                }
            }
            Err(_) => "unknown".to_string(),
        }
    }

    fn record_from(&self, inspected: InspectedService, status: String) -> Option<ServiceRecord> {
        let (_, id) = labels::domain_and_id(&inspected.labels)?;
        let created_at_ms =
            labels::created_at_ms(&inspected.labels).unwrap_or(inspected.created_at_ms);
        Some(ServiceRecord {
            service_name: id.service_name(),
            bucket: labels::bucket(&inspected.labels),
            id,
            status,
            created_at_ms,
        })
    }
}

impl Default for DockerOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Orchestrator for DockerOrchestrator {
    async fn create(&self, opts: CreateOptions) -> Result<CreatedService, OrchestratorError> {
        let id = self.fresh_id().await?;
        let service_name = id.service_name();
        let created_at_ms = self.clock.epoch_ms();
        let bucket = if opts.skip_bucket_attachment {
            String::new()
        } else {
            opts.bucket.clone().unwrap_or_default()
        };

        let cpu = format!("{}", opts.cpu_cores);
        let memory = format!("{}", opts.memory_bytes);
        let mut args: Vec<String> = vec![
            "service".into(),
            "create".into(),
            "--detach".into(),
            "--quiet".into(),
            "--name".into(),
            service_name.clone(),
            "--network".into(),
            self.network.clone(),
            "--restart-condition".into(),
            "any".into(),
            "--limit-cpu".into(),
            cpu,
            "--limit-memory".into(),
            memory,
        ];

        for (key, value) in
            labels::service_labels(&opts.domain, &id, &bucket, opts.skip_bucket_attachment, created_at_ms)
        {
            args.push("--label".into());
            args.push(format!("{key}={value}"));
        }

        let mut env: Vec<(String, String)> = Vec::new();
        if !bucket.is_empty() {
            env.push((ENV_BUCKET.into(), bucket.clone()));
            let region = opts.region.clone().unwrap_or_default();
            env.push((ENV_REGION.into(), region));
        }
        if let Some(creds) = &opts.credentials {
            env.push((ENV_ACCESS_KEY.into(), creds.access_key_id.clone()));
            env.push((ENV_SECRET_KEY.into(), creds.secret_access_key.clone()));
        }
        if let Some(password) = &opts.vnc_password {
            env.push((ENV_VNC_PASSWORD.into(), password.clone()));
        }
        for (key, value) in &env {
            args.push("--env".into());
            args.push(format!("{key}={value}"));
        }
        args.push(self.image.clone());

        tracing::info!(%id, %service_name, prewarm = opts.skip_bucket_attachment, "creating workspace service");

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        run_docker(&arg_refs).await.map_err(OrchestratorError::LaunchFailed)?;

        let urls = ServiceUrls::for_workspace(&opts.domain, &id);
        Ok(CreatedService { id, service_name, urls, created_at_ms })
    }

    async fn attach_bucket(
        &self,
        id: &WorkspaceId,
        bucket: &str,
        region: &str,
        credentials: Option<&Credentials>,
    ) -> Result<(), OrchestratorError> {
        let service_name = id.service_name();
        let mut args: Vec<String> = vec![
            "service".into(),
            "update".into(),
            "--detach".into(),
            "--env-add".into(),
            format!("{ENV_BUCKET}={bucket}"),
            "--env-add".into(),
            format!("{ENV_REGION}={region}"),
            "--label-add".into(),
            format!("{}={}", labels::LABEL_BUCKET, bucket),
        ];
        if let Some(creds) = credentials {
            args.push("--env-add".into());
            args.push(format!("{ENV_ACCESS_KEY}={}", creds.access_key_id));
            args.push("--env-add".into());
            args.push(format!("{ENV_SECRET_KEY}={}", creds.secret_access_key));
        }
        args.push(service_name.clone());

        tracing::info!(%id, %bucket, "attaching bucket to workspace service");

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        run_docker(&arg_refs).await.map(|_| ()).map_err(OrchestratorError::AttachFailed)
    }

    async fn stop(&self, id: &WorkspaceId) -> Result<StopOutcome, OrchestratorError> {
        let service_name = id.service_name();
        tracing::info!(%id, "removing workspace service");
        match run_docker(&["service", "rm", &service_name]).await {
            Ok(_) => Ok(StopOutcome::Removed),
            Err(e) if is_not_found(&e) => Ok(StopOutcome::NotFound),
            Err(e) => Err(OrchestratorError::Runtime(e)),
        }
    }

    async fn list(&self) -> Result<Vec<ServiceRecord>, OrchestratorError> {
        let names = run_docker(&[
            "service",
            "ls",
            "--filter",
            &format!("label={}", labels::LABEL_ID),
            "--format",
            "{{.Name}}",
        ])
        .await
        .map_err(OrchestratorError::Runtime)?;

        let mut records = Vec::new();
        for name in names.lines().filter(|n| n.starts_with(SERVICE_PREFIX)) {
            // A service may vanish between ls and inspect; skip it.
            let Some(inspected) = self.inspect(name).await? else {
                continue;
            };
            let status = self.task_status(name).await;
            match self.record_from(inspected, status) {
                Some(record) => records.push(record),
                None => tracing::warn!(service = name, "service missing idepool labels, skipping"),
            }
        }
        Ok(records)
    }

    async fn get(&self, id: &WorkspaceId) -> Result<Option<ServiceRecord>, OrchestratorError> {
        let service_name = id.service_name();
        let Some(inspected) = self.inspect(&service_name).await? else {
            return Ok(None);
        };
        let status = self.task_status(&service_name).await;
        Ok(self.record_from(inspected, status))
    }
}

struct InspectedService {
    labels: HashMap<String, String>,
    created_at_ms: u64,
}

fn parse_inspect(json: &str) -> Option<InspectedService> {
    let value: Value = serde_json::from_str(json.trim()).ok()?;
    let labels = value
        .pointer("/Spec/Labels")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                .collect::<HashMap<_, _>>()
        })
        .unwrap_or_default();
    let created_at_ms = value
        .pointer("/CreatedAt")
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp_millis().max(0) as u64)
        .unwrap_or(0);
    Some(InspectedService { labels, created_at_ms })
}

fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("no such service") || lower.contains("not found")
}

/// Run a docker CLI command and return stdout on success.
async fn run_docker(args: &[&str]) -> Result<String, String> {
    let output = tokio::process::Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| format!("failed to exec docker: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("docker {} failed: {}", args.first().unwrap_or(&""), stderr.trim()))
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
