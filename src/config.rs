// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{names, poll};
use crate::error::{ProxyAddonError, Result};
use crate::kubernetes::PollOptions;
use crate::reconcilers::{EnsurePolicy, EnsureStrategy};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ProxyAddonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ProxyAddonError::ConfigError(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Run configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Kubeconfig granting access to the hub cluster
    pub hub_kubeconfig: PathBuf,
    /// Name of the ManagedCluster to enable the proxy for
    pub managed_cluster: String,
    pub managed_service_account_name: String,
    pub poll: PollOptions,
    pub ensure: EnsurePolicy,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ProxyAddonError::ConfigError(format!("{} environment variable not set", key))
                })
        };

        let hub_kubeconfig = PathBuf::from(required("HUB_KUBECONFIG")?);
        let managed_cluster = required("MANAGED_CLUSTER")?;

        let interval_ms = parse_or(&lookup, "POLL_INTERVAL_MS", poll::DEFAULT_INTERVAL_MS)?;
        let timeout_secs = parse_or(&lookup, "ADDON_TIMEOUT_SECS", poll::DEFAULT_TIMEOUT_SECS)?;

        let strategy = match lookup("ENSURE_STRATEGY").as_deref() {
            None | Some("read-first") => EnsureStrategy::ReadFirst,
            Some("create-first") => EnsureStrategy::CreateFirst,
            Some(other) => {
                return Err(ProxyAddonError::ConfigError(format!(
                    "ENSURE_STRATEGY must be 'read-first' or 'create-first', got '{}'",
                    other
                )))
            }
        };

        let managed_service_account_name = match lookup("MANAGED_SERVICE_ACCOUNT_NAME") {
            Some(_) => required("MANAGED_SERVICE_ACCOUNT_NAME")?,
            None => names::DEFAULT_MANAGED_SERVICE_ACCOUNT.to_string(),
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(v) => v.parse()?,
            None => LogFormat::Text,
        };

        Ok(Config {
            hub_kubeconfig,
            managed_cluster,
            managed_service_account_name,
            poll: PollOptions {
                interval: Duration::from_millis(interval_ms),
                timeout: Duration::from_secs(timeout_secs),
            },
            ensure: EnsurePolicy {
                strategy,
                ..Default::default()
            },
            log_format,
        })
    }
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ProxyAddonError::ConfigError(format!(
                "{} must be a positive integer, got '{}'",
                key, raw
            ))),
        },
        None => Ok(default),
    }
}
