// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotent get-or-create for a single hub object.

use crate::error::{ProxyAddonError, Result};
use crate::kubernetes::ResourceClient;
use crate::manifests::{ManifestTemplate, Params};
use crate::types::{ResourceKey, ResourceKind};
use kube::api::DynamicObject;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, instrument};

/// Order of operations when making sure an object exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnsureStrategy {
    /// Read, and only create when the read reports not found. An object that
    /// already exists is never written to.
    #[default]
    ReadFirst,
    /// Create, and read the stored object back when the create conflicts.
    CreateFirst,
}

/// What to do with an object that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingPolicy {
    /// Return the stored object as-is
    #[default]
    Accept,
    /// Compare the stored object with the rendered one before accepting it
    ValidateAgainstDesired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnsurePolicy {
    pub strategy: EnsureStrategy,
    pub existing: ExistingPolicy,
}

/// Follow-up work that is known to be needed but not performed yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeferredStep {
    /// Diff an existing object against the desired state and update it
    ValidateExisting,
    /// Wait for the work agent to report a ManifestWork as applied
    AwaitWorkApplied,
    /// Produce a kubeconfig (token plus CA data) for the delegated identity
    GenerateCredentials,
}

impl fmt::Display for DeferredStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            DeferredStep::ValidateExisting => "validating existing resources",
            DeferredStep::AwaitWorkApplied => "waiting for manifest work to be applied",
            DeferredStep::GenerateCredentials => "generating credentials for the delegated identity",
        };
        f.write_str(step)
    }
}

/// What a step did to the object it is responsible for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Change {
    Created,
    Patched,
    Unchanged,
}

/// Outcome of a reconciliation step on one object
#[derive(Debug, Clone)]
pub struct Ensured {
    pub key: ResourceKey,
    pub object: DynamicObject,
    pub change: Change,
}

impl Ensured {
    pub fn is_changed(&self) -> bool {
        self.change != Change::Unchanged
    }
}

/// Make sure the object described by `template` exists and return it.
///
/// The template is rendered up front because the lookup key is the rendered
/// name and namespace. An `AlreadyExists` from the create is a lost race
/// with another writer and resolves to the stored object.
#[instrument(skip(client, template, params, policy), fields(kind = template.kind.kind))]
pub async fn ensure_resource<C: ResourceClient>(
    client: &C,
    template: &ManifestTemplate,
    params: &Params,
    policy: EnsurePolicy,
) -> Result<Ensured> {
    let kind = template.kind;
    let desired = template.render(params)?;
    let key = kind.key_of(&desired);

    match policy.strategy {
        EnsureStrategy::ReadFirst => {
            match client.get(kind, &key.name, key.namespace.as_deref()).await {
                Ok(existing) => {
                    debug!("{} already exists", key);
                    accept_existing(key, existing, policy)
                }
                Err(e) if e.is_not_found() => create_or_adopt(client, kind, key, &desired, policy).await,
                Err(e) => Err(e),
            }
        }
        EnsureStrategy::CreateFirst => create_or_adopt(client, kind, key, &desired, policy).await,
    }
}

async fn create_or_adopt<C: ResourceClient>(
    client: &C,
    kind: &ResourceKind,
    key: ResourceKey,
    desired: &DynamicObject,
    policy: EnsurePolicy,
) -> Result<Ensured> {
    match client.create(kind, desired).await {
        Ok(created) => {
            info!("Created {}", key);
            Ok(Ensured {
                key,
                object: created,
                change: Change::Created,
            })
        }
        Err(e) if e.is_already_exists() => {
            debug!("{} was created concurrently, reading it back", key);
            let existing = client
                .get(kind, &key.name, key.namespace.as_deref())
                .await?;
            accept_existing(key, existing, policy)
        }
        Err(e) => Err(e),
    }
}

fn accept_existing(key: ResourceKey, existing: DynamicObject, policy: EnsurePolicy) -> Result<Ensured> {
    match policy.existing {
        ExistingPolicy::Accept => Ok(Ensured {
            key,
            object: existing,
            change: Change::Unchanged,
        }),
        ExistingPolicy::ValidateAgainstDesired => {
            Err(ProxyAddonError::NotImplemented(DeferredStep::ValidateExisting))
        }
    }
}
