// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an HTTP-level mock for the kube client and an in-memory
//! hub for reconciliation tests.

use crate::error::{ProxyAddonError, Result};
use crate::kubernetes::ResourceClient;
use crate::types::{
    ResourceKey, ResourceKind, CLUSTER_MANAGEMENT_ADDON, MANAGED_CLUSTER, MULTI_CLUSTER_HUB,
};
use http::{Request, Response};
use kube::api::DynamicObject;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::Client;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
    content_types: Arc<Mutex<Vec<String>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            content_types: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PATCH requests matching the exact path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Method and path of every request received so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Content-Type headers of every request that carried one
    pub fn content_types(&self) -> Vec<String> {
        self.content_types.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        if let Some(ct) = req
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            self.content_types.lock().unwrap().push(ct.to_string());
        }
        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Create a 409 already exists response
pub fn already_exists_json(resource: &str, name: &str) -> String {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" already exists", resource, name),
        "reason": "AlreadyExists",
        "code": 409
    })
    .to_string()
}

/// A write observed by the [`FakeResourceClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Create(ResourceKey),
    Patch(ResourceKey, Value),
}

type Reactor = Arc<dyn Fn(&mut DynamicObject) + Send + Sync>;

#[derive(Default)]
struct FakeState {
    objects: BTreeMap<ResourceKey, DynamicObject>,
    writes: Vec<Write>,
    reads: usize,
    reactors: Vec<(String, Reactor)>,
    transient_get_failures: usize,
    next_uid: u64,
}

/// In-memory hub implementing [`ResourceClient`].
///
/// Reads yield once before returning so that concurrent callers interleave
/// between a read and the write that follows it.
#[derive(Clone, Default)]
pub struct FakeResourceClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakeResourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a write
    pub fn with_object(self, kind: &ResourceKind, obj: DynamicObject) -> Self {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(kind.key_of(&obj), obj);
        self
    }

    /// Run `react` on stored objects of `kind` every time one is read,
    /// standing in for the external controller that owns their status
    pub fn with_reactor(
        self,
        kind: &ResourceKind,
        react: impl Fn(&mut DynamicObject) + Send + Sync + 'static,
    ) -> Self {
        let react: Reactor = Arc::new(react);
        self.state
            .lock()
            .unwrap()
            .reactors
            .push((kind.kind.to_string(), react));
        self
    }

    /// Fail the next `count` reads with a 503
    pub fn with_transient_get_failures(self, count: usize) -> Self {
        self.state.lock().unwrap().transient_get_failures = count;
        self
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn stored(&self, kind: &ResourceKind, name: &str, namespace: Option<&str>) -> Option<DynamicObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&kind.key(name, namespace))
            .cloned()
    }

    pub fn count(&self, kind: &ResourceKind) -> usize {
        self.state
            .lock()
            .unwrap()
            .objects
            .keys()
            .filter(|k| k.kind == kind.kind)
            .count()
    }

    fn read(&self, kind: &ResourceKind, name: &str, namespace: Option<&str>) -> Result<DynamicObject> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;

        if state.transient_get_failures > 0 {
            state.transient_get_failures -= 1;
            return Err(ProxyAddonError::KubeError(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: "the server is currently unable to handle the request".to_string(),
                reason: "ServiceUnavailable".to_string(),
                code: 503,
            })));
        }

        let key = kind.key(name, namespace);
        let reactors: Vec<Reactor> = state
            .reactors
            .iter()
            .filter(|(k, _)| k == kind.kind)
            .map(|(_, r)| r.clone())
            .collect();

        match state.objects.get_mut(&key) {
            Some(obj) => {
                for react in &reactors {
                    react(obj);
                }
                Ok(obj.clone())
            }
            None => Err(ProxyAddonError::NotFound(key)),
        }
    }
}

impl ResourceClient for FakeResourceClient {
    async fn get(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<DynamicObject> {
        let result = self.read(kind, name, namespace);
        tokio::task::yield_now().await;
        result
    }

    async fn list(&self, kind: &ResourceKind, namespace: Option<&str>) -> Result<Vec<DynamicObject>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .iter()
            .filter(|(k, _)| k.kind == kind.kind)
            .filter(|(k, _)| namespace.is_none() || k.namespace.as_deref() == namespace)
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn create(&self, kind: &ResourceKind, body: &DynamicObject) -> Result<DynamicObject> {
        let mut state = self.state.lock().unwrap();
        let key = kind.key_of(body);
        if state.objects.contains_key(&key) {
            return Err(ProxyAddonError::AlreadyExists(key));
        }

        state.next_uid += 1;
        let mut created = body.clone();
        created.metadata.uid = Some(format!("uid-{}", state.next_uid));
        created.metadata.resource_version = Some("1".to_string());

        state.writes.push(Write::Create(key.clone()));
        state.objects.insert(key, created.clone());
        Ok(created)
    }

    async fn patch(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
        body: &Value,
    ) -> Result<DynamicObject> {
        let mut state = self.state.lock().unwrap();
        let key = kind.key(name, namespace);
        let Some(existing) = state.objects.get(&key) else {
            return Err(ProxyAddonError::NotFound(key));
        };

        let mut doc = serde_json::to_value(existing)?;
        json_patch::merge(&mut doc, body);
        let patched: DynamicObject = serde_json::from_value(doc)?;

        state.writes.push(Write::Patch(key.clone(), body.clone()));
        state.objects.insert(key, patched.clone());
        Ok(patched)
    }
}

/// A registered managed cluster
pub fn managed_cluster(name: &str) -> DynamicObject {
    DynamicObject::new(name, &MANAGED_CLUSTER.api_resource()).data(json!({
        "spec": { "hubAcceptsClient": true }
    }))
}

/// A MultiClusterHub with the cluster proxy feature in the given state
pub fn multicluster_hub(name: &str, proxy_enabled: bool) -> DynamicObject {
    DynamicObject::new(name, &MULTI_CLUSTER_HUB.api_resource())
        .within("open-cluster-management")
        .data(json!({
            "spec": {
                "availabilityConfig": "High",
                "enableClusterProxyAddon": proxy_enabled,
            }
        }))
}

pub fn cluster_management_addon(name: &str) -> DynamicObject {
    DynamicObject::new(name, &CLUSTER_MANAGEMENT_ADDON.api_resource()).data(json!({
        "spec": { "addOnMeta": { "displayName": name } }
    }))
}

/// Mark an addon Available and record the namespace its agent runs in
pub fn make_available(install_namespace: &str) -> impl Fn(&mut DynamicObject) + Send + Sync + 'static {
    let install_namespace = install_namespace.to_string();
    move |obj: &mut DynamicObject| {
        obj.data["status"] = json!({
            "namespace": install_namespace,
            "conditions": [{ "type": "Available", "status": "True", "reason": "ProbeAvailable" }]
        });
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_patch_merges_into_stored_object() {
        let client = FakeResourceClient::new()
            .with_object(&MULTI_CLUSTER_HUB, multicluster_hub("multiclusterhub", false));

        let patched = client
            .patch(
                &MULTI_CLUSTER_HUB,
                "multiclusterhub",
                Some("open-cluster-management"),
                &json!({ "spec": { "enableClusterProxyAddon": true, "availabilityConfig": null } }),
            )
            .await
            .unwrap();

        assert_eq!(patched.data["spec"]["enableClusterProxyAddon"], true);
        assert!(patched.data["spec"].get("availabilityConfig").is_none());
        assert_eq!(patched.metadata.namespace.as_deref(), Some("open-cluster-management"));
    }
}
