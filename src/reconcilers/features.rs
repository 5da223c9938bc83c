// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hub-wide feature gates for the cluster proxy and delegated identities.

use crate::constants::{names, CLUSTER_PROXY_FEATURE_FIELD};
use crate::error::{ProxyAddonError, Result};
use crate::kubernetes::ResourceClient;
use crate::reconcilers::ensure::{Change, Ensured};
use crate::types::{ResourceKey, CLUSTER_MANAGEMENT_ADDON, MULTI_CLUSTER_HUB};
use kube::api::DynamicObject;
use kube::ResourceExt;
use serde_json::json;
use tracing::{info, instrument, warn};

/// Result of looking up the hub's single feature flag record
#[derive(Debug, Clone)]
pub enum FeatureFlagLookup {
    Found(DynamicObject),
    NotFoundAnomaly,
    MultipleAnomaly(Vec<ResourceKey>),
}

impl FeatureFlagLookup {
    /// The record, or a precondition violation when there is not exactly one
    pub fn into_record(self) -> Result<DynamicObject> {
        match self {
            FeatureFlagLookup::Found(record) => Ok(record),
            FeatureFlagLookup::NotFoundAnomaly => Err(ProxyAddonError::PreconditionViolation(
                "no MultiClusterHub found on the hub".to_string(),
            )),
            FeatureFlagLookup::MultipleAnomaly(keys) => {
                let found: Vec<String> = keys.iter().map(ToString::to_string).collect();
                Err(ProxyAddonError::PreconditionViolation(format!(
                    "expected exactly one MultiClusterHub, found {}: {}",
                    keys.len(),
                    found.join(", ")
                )))
            }
        }
    }
}

/// List MultiClusterHubs across all namespaces
pub async fn find_feature_flag_record<C: ResourceClient>(client: &C) -> Result<FeatureFlagLookup> {
    let mut hubs = client.list(&MULTI_CLUSTER_HUB, None).await?;

    Ok(match hubs.len() {
        0 => FeatureFlagLookup::NotFoundAnomaly,
        1 => FeatureFlagLookup::Found(hubs.remove(0)),
        _ => FeatureFlagLookup::MultipleAnomaly(
            hubs.iter().map(|h| MULTI_CLUSTER_HUB.key_of(h)).collect(),
        ),
    })
}

pub fn is_cluster_proxy_enabled(hub: &DynamicObject) -> bool {
    hub.data
        .get("spec")
        .and_then(|spec| spec.get(CLUSTER_PROXY_FEATURE_FIELD))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Turn on the cluster proxy feature on the MultiClusterHub, patching only
/// the feature field when it is not already set
#[instrument(skip(client))]
pub async fn ensure_cluster_proxy_feature_enabled<C: ResourceClient>(client: &C) -> Result<Ensured> {
    let lookup = find_feature_flag_record(client).await?;
    if !matches!(lookup, FeatureFlagLookup::Found(_)) {
        warn!("Feature flag record is not unique: {:?}", lookup);
    }
    let hub = lookup.into_record()?;
    let key = MULTI_CLUSTER_HUB.key_of(&hub);

    if is_cluster_proxy_enabled(&hub) {
        info!("Cluster proxy feature already enabled on {}", key);
        return Ok(Ensured {
            key,
            object: hub,
            change: Change::Unchanged,
        });
    }

    info!("Enabling cluster proxy feature on {}", key);
    let patch = json!({ "spec": { CLUSTER_PROXY_FEATURE_FIELD: true } });
    let patched = client
        .patch(&MULTI_CLUSTER_HUB, &hub.name_any(), hub.namespace().as_deref(), &patch)
        .await?;

    Ok(Ensured {
        key,
        object: patched,
        change: Change::Patched,
    })
}

/// Check that the managed-serviceaccount addon is registered hub-wide.
///
/// The feature cannot be switched on through the hub API yet, so this only
/// reads the registration.
#[instrument(skip(client))]
pub async fn check_managed_service_account_feature<C: ResourceClient>(
    client: &C,
) -> Result<DynamicObject> {
    match client
        .get(&CLUSTER_MANAGEMENT_ADDON, names::MANAGED_SERVICE_ACCOUNT_ADDON, None)
        .await
    {
        Ok(registration) => Ok(registration),
        Err(e) if e.is_not_found() => Err(ProxyAddonError::PreconditionViolation(format!(
            "ClusterManagementAddOn {} is not installed on the hub",
            names::MANAGED_SERVICE_ACCOUNT_ADDON
        ))),
        Err(e) => Err(e),
    }
}
