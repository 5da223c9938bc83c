// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Managed cluster lookup and per-cluster addon requests.

use crate::error::{ProxyAddonError, Result};
use crate::kubernetes::{poll_until_ready, PollOptions, ResourceClient};
use crate::manifests::{templates, Param, Params};
use crate::reconcilers::ensure::{ensure_resource, EnsurePolicy, Ensured};
use crate::types::{addon_readiness, MANAGED_CLUSTER, MANAGED_CLUSTER_ADDON};
use kube::api::DynamicObject;
use kube::ResourceExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Look up a cluster in the hub registry, `None` when it is not registered
#[instrument(skip(client))]
pub async fn get_managed_cluster<C: ResourceClient>(
    client: &C,
    name: &str,
) -> Result<Option<DynamicObject>> {
    match client.get(&MANAGED_CLUSTER, name, None).await {
        Ok(cluster) => Ok(Some(cluster)),
        Err(e) if e.is_not_found() => {
            debug!("ManagedCluster {} is not registered", name);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Request `addon_name` for a managed cluster
#[instrument(skip(client, policy))]
pub async fn ensure_addon_enabled<C: ResourceClient>(
    client: &C,
    addon_name: &str,
    managed_cluster: &str,
    policy: EnsurePolicy,
) -> Result<Ensured> {
    let params = Params::new()
        .set(Param::AddonName, addon_name)
        .set(Param::ManagedClusterName, managed_cluster);

    ensure_resource(client, &templates::ADDON, &params, policy).await
}

/// Wait until the addon reports `Available=True` and return the ready snapshot
#[instrument(skip(client, addon, options, cancel), fields(addon = %addon.name_any()))]
pub async fn wait_for_addon_available<C: ResourceClient>(
    client: &C,
    addon: &DynamicObject,
    options: PollOptions,
    cancel: &CancellationToken,
) -> Result<DynamicObject> {
    let name = addon.name_any();
    let namespace = addon.namespace().ok_or_else(|| {
        ProxyAddonError::PreconditionViolation(format!("addon {} has no namespace", name))
    })?;
    let what = MANAGED_CLUSTER_ADDON.key(&name, Some(namespace.as_str())).to_string();

    info!("Waiting up to {:?} for {} to become available", options.timeout, what);
    let ready = poll_until_ready(
        &what,
        || client.get(&MANAGED_CLUSTER_ADDON, &name, Some(namespace.as_str())),
        addon_readiness,
        options,
        cancel,
    )
    .await?;
    info!("{} is available", what);

    Ok(ready)
}
