// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Drives a managed cluster from "registered" to "reachable through the
//! cluster proxy with a delegated identity".

use crate::config::Config;
use crate::constants::names;
use crate::error::{ProxyAddonError, Result};
use crate::kubernetes::{PollOptions, ResourceClient};
use crate::reconcilers::addons::{ensure_addon_enabled, get_managed_cluster, wait_for_addon_available};
use crate::reconcilers::ensure::{Change, DeferredStep, EnsurePolicy, Ensured};
use crate::reconcilers::features::{
    check_managed_service_account_feature, ensure_cluster_proxy_feature_enabled,
};
use crate::reconcilers::identity::{
    ensure_managed_service_account, ensure_managed_service_account_rbac,
};
use crate::types::ResourceKey;
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Pipeline position, each stage is reached once the step named by it succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Start,
    ClusterResolved,
    ProxyFeatureEnabled,
    ProxyAddonRequested,
    IdentityFeatureChecked,
    IdentityAddonRequested,
    ProxyAddonReady,
    IdentityAddonReady,
    IdentityRequested,
    IdentityRbacRequested,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "camelCase")]
pub enum RunOutcome {
    Succeeded,
    PreconditionViolation(String),
    TimedOut(String),
    Cancelled(String),
    Failed(String),
}

impl From<&ProxyAddonError> for RunOutcome {
    fn from(err: &ProxyAddonError) -> Self {
        match err {
            ProxyAddonError::PreconditionViolation(msg) => RunOutcome::PreconditionViolation(msg.clone()),
            ProxyAddonError::Timeout { .. } => RunOutcome::TimedOut(err.to_string()),
            ProxyAddonError::Cancelled(_) => RunOutcome::Cancelled(err.to_string()),
            other => RunOutcome::Failed(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceChange {
    pub resource: ResourceKey,
    pub change: Change,
}

/// Everything a caller needs to know about one run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub cluster: String,
    pub stage: Stage,
    pub outcome: RunOutcome,
    pub changes: Vec<ResourceChange>,
    /// Follow-up steps this pipeline knows about but does not perform
    pub deferred: Vec<DeferredStep>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }

    /// Resources that were created or modified
    pub fn modified(&self) -> impl Iterator<Item = &ResourceChange> {
        self.changes.iter().filter(|c| c.change != Change::Unchanged)
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub poll: PollOptions,
    pub ensure: EnsurePolicy,
    pub managed_service_account_name: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll: PollOptions::default(),
            ensure: EnsurePolicy::default(),
            managed_service_account_name: names::DEFAULT_MANAGED_SERVICE_ACCOUNT.to_string(),
        }
    }
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            poll: config.poll,
            ensure: config.ensure,
            managed_service_account_name: config.managed_service_account_name.clone(),
        }
    }
}

struct Progress {
    cluster: String,
    stage: Stage,
    changes: Vec<ResourceChange>,
}

impl Progress {
    fn advance(&mut self, stage: Stage) {
        info!(cluster = %self.cluster, "{} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn record(&mut self, ensured: &Ensured) {
        self.changes.push(ResourceChange {
            resource: ensured.key.clone(),
            change: ensured.change,
        });
    }
}

/// Runs the reconciliation pipeline for one managed cluster at a time.
///
/// Runs for different clusters touch disjoint objects and may proceed
/// concurrently on clones of the same orchestrator.
#[derive(Clone)]
pub struct Orchestrator<C> {
    client: C,
    options: RunOptions,
    cancel: CancellationToken,
}

impl<C: ResourceClient> Orchestrator<C> {
    pub fn new(client: C, options: RunOptions) -> Self {
        Self {
            client,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight waits when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the pipeline, returning the report on success and the first
    /// error otherwise
    pub async fn run(&self, cluster: &str) -> Result<RunReport> {
        let mut progress = self.progress(cluster);
        self.drive(cluster, &mut progress).await?;
        Ok(self.report(progress, RunOutcome::Succeeded))
    }

    /// Run the pipeline and fold any failure into the report
    pub async fn execute(&self, cluster: &str) -> RunReport {
        let mut progress = self.progress(cluster);
        let outcome = match self.drive(cluster, &mut progress).await {
            Ok(()) => RunOutcome::Succeeded,
            Err(e) => {
                error!(cluster = %cluster, stage = %progress.stage, "Run failed: {}", e);
                RunOutcome::from(&e)
            }
        };
        self.report(progress, outcome)
    }

    fn progress(&self, cluster: &str) -> Progress {
        Progress {
            cluster: cluster.to_string(),
            stage: Stage::Start,
            changes: Vec::new(),
        }
    }

    fn report(&self, progress: Progress, outcome: RunOutcome) -> RunReport {
        RunReport {
            cluster: progress.cluster,
            stage: progress.stage,
            outcome,
            changes: progress.changes,
            deferred: vec![DeferredStep::AwaitWorkApplied, DeferredStep::GenerateCredentials],
        }
    }

    #[instrument(skip(self, progress))]
    async fn drive(&self, cluster: &str, progress: &mut Progress) -> Result<()> {
        let client = &self.client;
        let policy = self.options.ensure;

        if get_managed_cluster(client, cluster).await?.is_none() {
            progress.advance(Stage::Done);
            return Err(ProxyAddonError::PreconditionViolation(format!(
                "managed cluster {} not found",
                cluster
            )));
        }
        progress.advance(Stage::ClusterResolved);

        let feature = ensure_cluster_proxy_feature_enabled(client).await?;
        progress.record(&feature);
        progress.advance(Stage::ProxyFeatureEnabled);

        let proxy_addon =
            ensure_addon_enabled(client, names::CLUSTER_PROXY_ADDON, cluster, policy).await?;
        progress.record(&proxy_addon);
        progress.advance(Stage::ProxyAddonRequested);

        check_managed_service_account_feature(client).await?;
        progress.advance(Stage::IdentityFeatureChecked);

        let identity_addon =
            ensure_addon_enabled(client, names::MANAGED_SERVICE_ACCOUNT_ADDON, cluster, policy)
                .await?;
        progress.record(&identity_addon);
        progress.advance(Stage::IdentityAddonRequested);

        wait_for_addon_available(client, &proxy_addon.object, self.options.poll, &self.cancel)
            .await?;
        progress.advance(Stage::ProxyAddonReady);

        // Readiness may have filled in the install namespace, so only the
        // ready snapshot is used from here on.
        let identity_addon =
            wait_for_addon_available(client, &identity_addon.object, self.options.poll, &self.cancel)
                .await?;
        progress.advance(Stage::IdentityAddonReady);

        let identity = ensure_managed_service_account(
            client,
            &identity_addon,
            &self.options.managed_service_account_name,
            policy,
        )
        .await?;
        progress.record(&identity);
        progress.advance(Stage::IdentityRequested);

        let rbac =
            ensure_managed_service_account_rbac(client, &identity.object, &identity_addon, policy)
                .await?;
        progress.record(&rbac);
        progress.advance(Stage::IdentityRbacRequested);

        progress.advance(Stage::Done);
        Ok(())
    }
}
