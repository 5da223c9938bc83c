// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed CRUD access to arbitrary hub kinds

use crate::constants::FIELD_MANAGER;
use crate::error::{ProxyAddonError, Result};
use crate::types::{ResourceKey, ResourceKind};
use kube::api::{DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use std::future::Future;
use tracing::{debug, instrument};

/// The operations reconciliation steps need from the hub API server.
///
/// Implementations must report a missing object as
/// [`ProxyAddonError::NotFound`] and a create that lost a race as
/// [`ProxyAddonError::AlreadyExists`]; everything else is passed through.
pub trait ResourceClient: Send + Sync {
    fn get(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> impl Future<Output = Result<DynamicObject>> + Send;

    /// List objects of a kind, across all namespaces when `namespace` is `None`
    fn list(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
    ) -> impl Future<Output = Result<Vec<DynamicObject>>> + Send;

    fn create(
        &self,
        kind: &ResourceKind,
        body: &DynamicObject,
    ) -> impl Future<Output = Result<DynamicObject>> + Send;

    /// Apply a JSON merge patch containing only the fields to change
    fn patch(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<DynamicObject>> + Send;
}

/// [`ResourceClient`] backed by a kube client talking to the hub
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl KubeResourceClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match namespace {
            Some(ns) if kind.namespaced => Api::namespaced_with(self.client.clone(), ns, &ar),
            _ => Api::all_with(self.client.clone(), &ar),
        }
    }
}

/// Translate the API statuses callers branch on into dedicated variants
fn classify(err: kube::Error, key: ResourceKey) -> ProxyAddonError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => ProxyAddonError::NotFound(key),
        kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
            ProxyAddonError::AlreadyExists(key)
        }
        e => ProxyAddonError::KubeError(e),
    }
}

impl ResourceClient for KubeResourceClient {
    #[instrument(skip(self, kind), fields(kind = kind.kind))]
    async fn get(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<DynamicObject> {
        debug!("Getting {} {:?}/{}", kind.kind, namespace, name);
        self.api(kind, namespace)
            .get(name)
            .await
            .map_err(|e| classify(e, kind.key(name, namespace)))
    }

    #[instrument(skip(self, kind), fields(kind = kind.kind))]
    async fn list(&self, kind: &ResourceKind, namespace: Option<&str>) -> Result<Vec<DynamicObject>> {
        let list = self.api(kind, namespace).list(&ListParams::default()).await?;
        Ok(list.items)
    }

    #[instrument(skip(self, kind, body), fields(kind = kind.kind, name = %body.name_any()))]
    async fn create(&self, kind: &ResourceKind, body: &DynamicObject) -> Result<DynamicObject> {
        let namespace = body.namespace();
        if kind.namespaced && namespace.is_none() {
            return Err(ProxyAddonError::TemplateError(format!(
                "{} {} has no namespace",
                kind.kind,
                body.name_any()
            )));
        }

        self.api(kind, namespace.as_deref())
            .create(
                &PostParams {
                    field_manager: Some(FIELD_MANAGER.to_string()),
                    ..Default::default()
                },
                body,
            )
            .await
            .map_err(|e| classify(e, kind.key_of(body)))
    }

    #[instrument(skip(self, kind, body), fields(kind = kind.kind))]
    async fn patch(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<DynamicObject> {
        self.api(kind, namespace)
            .patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(body))
            .await
            .map_err(|e| classify(e, kind.key(name, namespace)))
    }
}
