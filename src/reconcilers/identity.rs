// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Delegated identity on the managed cluster: the ManagedServiceAccount
//! request and the ManifestWorks granting it permissions.

use crate::error::{ProxyAddonError, Result};
use crate::kubernetes::ResourceClient;
use crate::manifests::{templates, Param, Params};
use crate::reconcilers::ensure::{ensure_resource, EnsurePolicy, Ensured};
use crate::types::ManagedClusterAddOn;
use kube::api::DynamicObject;
use kube::ResourceExt;
use tracing::instrument;

/// Namespace of an addon, which is the managed cluster's namespace on the hub
fn cluster_namespace(addon: &DynamicObject) -> Result<String> {
    addon.namespace().ok_or_else(|| {
        ProxyAddonError::PreconditionViolation(format!(
            "addon {} has no cluster namespace",
            addon.name_any()
        ))
    })
}

/// Request a delegated identity named `name` in the cluster the ready
/// managed-serviceaccount addon belongs to
#[instrument(skip(client, addon, policy), fields(cluster = ?addon.namespace()))]
pub async fn ensure_managed_service_account<C: ResourceClient>(
    client: &C,
    addon: &DynamicObject,
    name: &str,
    policy: EnsurePolicy,
) -> Result<Ensured> {
    let params = Params::new()
        .set(Param::ManagedServiceAccountName, name)
        .set(Param::ClusterName, cluster_namespace(addon)?);

    ensure_resource(client, &templates::MANAGED_SERVICE_ACCOUNT_REQUEST, &params, policy).await
}

/// Bind the delegated identity to cluster-admin on the managed cluster.
///
/// The service account lives in the addon's install namespace, so `addon`
/// must be the snapshot returned once the addon became available.
#[instrument(skip(client, managed_service_account, addon, policy), fields(identity = %managed_service_account.name_any()))]
pub async fn ensure_managed_service_account_rbac<C: ResourceClient>(
    client: &C,
    managed_service_account: &DynamicObject,
    addon: &DynamicObject,
    policy: EnsurePolicy,
) -> Result<Ensured> {
    let install_namespace = ManagedClusterAddOn::from_dynamic(addon)?.install_namespace();
    let params = Params::new()
        .set(Param::ClusterName, cluster_namespace(addon)?)
        .set(Param::ManagedServiceAccountName, managed_service_account.name_any())
        .set(Param::ManagedServiceAccountNamespace, install_namespace);

    ensure_resource(client, &templates::MANAGED_SERVICE_ACCOUNT_RBAC_WORK, &params, policy).await
}

/// Ask the work agent on `cluster` to create a service account with a token
/// secret and a cluster-admin binding
#[instrument(skip(client, policy))]
pub async fn ensure_remote_service_account<C: ResourceClient>(
    client: &C,
    cluster: &str,
    name: &str,
    namespace: &str,
    policy: EnsurePolicy,
) -> Result<Ensured> {
    let params = Params::new()
        .set(Param::ClusterName, cluster)
        .set(Param::ServiceAccountName, name)
        .set(Param::ServiceAccountNamespace, namespace);

    ensure_resource(client, &templates::SERVICE_ACCOUNT_WORK, &params, policy).await
}
