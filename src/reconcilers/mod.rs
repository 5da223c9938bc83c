// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation steps that bring a managed cluster behind the cluster
//! proxy, and the orchestrator that sequences them.

pub mod addons;
pub mod ensure;
pub mod features;
pub mod identity;
pub mod orchestrator;

pub use addons::{ensure_addon_enabled, get_managed_cluster, wait_for_addon_available};
pub use ensure::{
    ensure_resource, Change, DeferredStep, EnsurePolicy, EnsureStrategy, Ensured, ExistingPolicy,
};
pub use features::{
    check_managed_service_account_feature, ensure_cluster_proxy_feature_enabled,
    find_feature_flag_record, FeatureFlagLookup,
};
pub use identity::{
    ensure_managed_service_account, ensure_managed_service_account_rbac,
    ensure_remote_service_account,
};
pub use orchestrator::{Orchestrator, ResourceChange, RunOptions, RunOutcome, RunReport, Stage};
