// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hub cluster client creation

use crate::error::{ProxyAddonError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::path::Path;
use tracing::{info, instrument};

/// Create a Kubernetes client for the hub from a kubeconfig file
#[instrument(fields(path = %path.display()))]
pub async fn create_hub_client(path: &Path) -> Result<Client> {
    info!("Loading hub kubeconfig from {}", path.display());

    let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
        ProxyAddonError::KubeconfigError(format!(
            "Failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })?;

    create_client_from_kubeconfig(kubeconfig).await
}

/// Create a Kubernetes client from an already parsed kubeconfig
pub async fn create_client_from_kubeconfig(kubeconfig: Kubeconfig) -> Result<Client> {
    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                ProxyAddonError::KubeconfigError(format!("Failed to create config: {}", e))
            })?;

    Client::try_from(client_config)
        .map_err(|e| ProxyAddonError::KubeconfigError(format!("Failed to create client: {}", e)))
}
