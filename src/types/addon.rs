// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{conditions, names};
use crate::error::Result;
use kube::api::DynamicObject;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "addon.open-cluster-management.io",
    version = "v1alpha1",
    kind = "ManagedClusterAddOn"
)]
#[kube(namespaced)]
#[kube(status = "ManagedClusterAddOnStatus")]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAddOnSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_namespace: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterAddOnStatus {
    /// Namespace the addon agent was actually installed into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of evaluating a readiness predicate against one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady,
    /// The resource will never become ready; stop waiting
    Failed(String),
}

impl ManagedClusterAddOn {
    pub fn from_dynamic(obj: &DynamicObject) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::to_value(obj)?)?)
    }

    /// Readiness is the status of the `Available` condition. A missing
    /// condition means the addon is still being provisioned.
    pub fn readiness(&self) -> Readiness {
        let available = self
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conditions| {
                conditions
                    .iter()
                    .find(|c| c.condition_type == conditions::AVAILABLE)
            });

        match available {
            Some(c) if c.status == conditions::STATUS_TRUE => Readiness::Ready,
            _ => Readiness::NotReady,
        }
    }

    /// Namespace the addon agent lives in on the managed cluster
    pub fn install_namespace(&self) -> String {
        self.status
            .as_ref()
            .and_then(|s| s.namespace.clone())
            .or_else(|| self.spec.install_namespace.clone())
            .unwrap_or_else(|| names::DEFAULT_INSTALL_NAMESPACE.to_string())
    }
}

/// Readiness predicate for addon snapshots fetched as dynamic objects
pub fn addon_readiness(obj: &DynamicObject) -> Readiness {
    match ManagedClusterAddOn::from_dynamic(obj) {
        Ok(addon) => addon.readiness(),
        Err(e) => Readiness::Failed(format!("unreadable addon status: {}", e)),
    }
}
