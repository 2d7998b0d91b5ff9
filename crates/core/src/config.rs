// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet configuration.
//!
//! Loaded from a TOML file; every field has a default so a missing or partial
//! file still yields a working local setup. The recognized options are
//! exactly the knobs the control plane consults; unknown keys are rejected
//! so typos surface at startup instead of silently using defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Object-storage credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Tick cadence of the three background loops, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoopPeriods {
    #[serde(default = "default_queue_secs")]
    pub queue_secs: u64,
    #[serde(default = "default_health_secs")]
    pub health_secs: u64,
    #[serde(default = "default_cleanup_secs")]
    pub cleanup_secs: u64,
}

impl Default for LoopPeriods {
    fn default() -> Self {
        Self {
            queue_secs: default_queue_secs(),
            health_secs: default_health_secs(),
            cleanup_secs: default_cleanup_secs(),
        }
    }
}

fn default_queue_secs() -> u64 {
    30
}
fn default_health_secs() -> u64 {
    5
}
fn default_cleanup_secs() -> u64 {
    60
}

/// All recognized control-plane options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    /// Desired number of pre-warmed workspaces
    #[serde(default = "default_target_pool_size")]
    pub target_pool_size: usize,
    /// Per-workspace CPU cap in cores
    #[serde(default = "default_cpu_cores_limit")]
    pub cpu_cores_limit: f64,
    /// Per-workspace memory cap in bytes
    #[serde(default = "default_memory_bytes_limit")]
    pub memory_bytes_limit: u64,
    /// Admission gate: refuse launches at or above this memory usage
    #[serde(default = "default_mem_threshold_pct")]
    pub mem_threshold_pct: f32,
    /// Logged (not blocking) CPU usage threshold
    #[serde(default = "default_cpu_threshold_pct")]
    pub cpu_threshold_pct: f32,
    /// Public domain the reverse proxy serves workspaces under
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Region used when a request does not name one
    #[serde(default = "default_region")]
    pub region_default: String,
    /// Credentials used when a request does not carry any
    #[serde(default)]
    pub credentials_default: Option<Credentials>,
    #[serde(default)]
    pub loop_periods: LoopPeriods,
    /// Consecutive probe failures before recovery fires
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Hard cap on the post-spawn readiness wait, in seconds
    #[serde(default = "default_readiness_wait_cap_secs")]
    pub readiness_wait_cap_secs: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        match toml::from_str("") {
            Ok(config) => config,
            // An empty document always satisfies the field defaults.
            Err(_) => unreachable!("empty config failed to parse"),
        }
    }
}

fn default_target_pool_size() -> usize {
    2
}
fn default_cpu_cores_limit() -> f64 {
    2.0
}
fn default_memory_bytes_limit() -> u64 {
    4 * 1024 * 1024 * 1024
}
fn default_mem_threshold_pct() -> f32 {
    90.0
}
fn default_cpu_threshold_pct() -> f32 {
    90.0
}
fn default_domain() -> String {
    "localhost".to_string()
}
fn default_region() -> String {
    "us-east-1".to_string()
}
fn default_max_consecutive_failures() -> u32 {
    3
}
fn default_readiness_wait_cap_secs() -> u64 {
    120
}

/// Config load failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl FleetConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a file, or defaults when the file does not exist.
    pub fn load_or_default(path: &std::path::Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
