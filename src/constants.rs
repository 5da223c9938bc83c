// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Well-known object names on the hub
pub mod names {
    /// Addon providing the cluster proxy tunnel
    pub const CLUSTER_PROXY_ADDON: &str = "cluster-proxy";
    /// Addon provisioning delegated service accounts on managed clusters
    pub const MANAGED_SERVICE_ACCOUNT_ADDON: &str = "managed-serviceaccount";
    /// Default name of the ManagedServiceAccount requested for the proxy
    pub const DEFAULT_MANAGED_SERVICE_ACCOUNT: &str = "cluster-proxy";
    /// Namespace addon agents are installed into unless the addon reports otherwise
    pub const DEFAULT_INSTALL_NAMESPACE: &str = "open-cluster-management-agent-addon";
}

/// Condition types reported by addon controllers
pub mod conditions {
    pub const AVAILABLE: &str = "Available";
    pub const STATUS_TRUE: &str = "True";
}

/// Field manager recorded on every write to the hub
pub const FIELD_MANAGER: &str = "cluster-proxy-addon";

/// Field on the MultiClusterHub spec that gates the cluster proxy
pub const CLUSTER_PROXY_FEATURE_FIELD: &str = "enableClusterProxyAddon";

/// Addon readiness polling configuration
pub mod poll {
    /// Delay between two reads of an addon
    pub const DEFAULT_INTERVAL_MS: u64 = 100;
    /// Upper bound on the wait for a single addon
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
}
