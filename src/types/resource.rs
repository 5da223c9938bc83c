// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Static descriptors for the hub API kinds this crate touches.

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use kube::discovery::ApiResource;
use kube::ResourceExt;
use serde::Serialize;
use std::fmt;

/// An API kind identified by group, version and kind, plus what is needed
/// to address it over REST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub namespaced: bool,
}

impl ResourceKind {
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(self.group, self.version, self.kind),
            self.plural,
        )
    }

    /// Key of an object of this kind
    pub fn key(&self, name: &str, namespace: Option<&str>) -> ResourceKey {
        ResourceKey {
            api_version: self.api_version(),
            kind: self.kind.to_string(),
            name: name.to_string(),
            namespace: if self.namespaced {
                namespace.map(str::to_string)
            } else {
                None
            },
        }
    }

    pub fn key_of(&self, obj: &DynamicObject) -> ResourceKey {
        self.key(&obj.name_any(), obj.namespace().as_deref())
    }
}

/// Hub cluster registry entry for a managed cluster
pub const MANAGED_CLUSTER: ResourceKind = ResourceKind {
    group: "cluster.open-cluster-management.io",
    version: "v1",
    kind: "ManagedCluster",
    plural: "managedclusters",
    namespaced: false,
};

/// Hub-wide feature flag record
pub const MULTI_CLUSTER_HUB: ResourceKind = ResourceKind {
    group: "operator.open-cluster-management.io",
    version: "v1",
    kind: "MultiClusterHub",
    plural: "multiclusterhubs",
    namespaced: true,
};

pub const CLUSTER_MANAGEMENT_ADDON: ResourceKind = ResourceKind {
    group: "addon.open-cluster-management.io",
    version: "v1alpha1",
    kind: "ClusterManagementAddOn",
    plural: "clustermanagementaddons",
    namespaced: false,
};

pub const MANAGED_CLUSTER_ADDON: ResourceKind = ResourceKind {
    group: "addon.open-cluster-management.io",
    version: "v1alpha1",
    kind: "ManagedClusterAddOn",
    plural: "managedclusteraddons",
    namespaced: true,
};

pub const MANAGED_SERVICE_ACCOUNT: ResourceKind = ResourceKind {
    group: "authentication.open-cluster-management.io",
    version: "v1alpha1",
    kind: "ManagedServiceAccount",
    plural: "managedserviceaccounts",
    namespaced: true,
};

pub const MANIFEST_WORK: ResourceKind = ResourceKind {
    group: "work.open-cluster-management.io",
    version: "v1",
    kind: "ManifestWork",
    plural: "manifestworks",
    namespaced: true,
};

/// Natural key of a hub object, used for reporting and error messages
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceKey {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}
