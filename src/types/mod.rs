// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hub API kinds and the typed views this crate reads from them.

pub mod addon;
pub mod resource;

pub use addon::{addon_readiness, Condition, ManagedClusterAddOn, Readiness};
pub use resource::{
    ResourceKey, ResourceKind, CLUSTER_MANAGEMENT_ADDON, MANAGED_CLUSTER, MANAGED_CLUSTER_ADDON,
    MANAGED_SERVICE_ACCOUNT, MANIFEST_WORK, MULTI_CLUSTER_HUB,
};
