// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Manifest templates for the objects created on the hub.
//!
//! Templates are YAML documents whose string scalars may contain
//! `{{ param }}` placeholders. The YAML is parsed first and each scalar is
//! then rendered through minijinja, so a parameter value can never change
//! the document structure.

use crate::error::{ProxyAddonError, Result};
use crate::types::ResourceKind;
use kube::api::DynamicObject;
use kube::ResourceExt;
use minijinja::{Environment, UndefinedBehavior};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Named parameters understood by the templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Param {
    AddonName,
    ManagedClusterName,
    ServiceAccountName,
    ServiceAccountNamespace,
    ClusterName,
    ManagedServiceAccountName,
    ManagedServiceAccountNamespace,
}

impl Param {
    pub fn as_str(&self) -> &'static str {
        match self {
            Param::AddonName => "addon_name",
            Param::ManagedClusterName => "managed_cluster_name",
            Param::ServiceAccountName => "service_account_name",
            Param::ServiceAccountNamespace => "service_account_namespace",
            Param::ClusterName => "cluster_name",
            Param::ManagedServiceAccountName => "managed_service_account_name",
            Param::ManagedServiceAccountNamespace => "managed_service_account_namespace",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values for a single render
#[derive(Debug, Clone, Default)]
pub struct Params(BTreeMap<Param, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, param: Param, value: impl Into<String>) -> Self {
        self.0.insert(param, value.into());
        self
    }

    pub fn get(&self, param: Param) -> Option<&str> {
        self.0.get(&param).map(String::as_str)
    }

    /// Render context keyed by placeholder name
    fn context(&self) -> BTreeMap<&'static str, &str> {
        self.0.iter().map(|(p, v)| (p.as_str(), v.as_str())).collect()
    }
}

/// A desired-state document for one kind
#[derive(Debug, Clone, Copy)]
pub struct ManifestTemplate {
    pub kind: &'static ResourceKind,
    source: &'static str,
}

impl ManifestTemplate {
    pub const fn new(kind: &'static ResourceKind, source: &'static str) -> Self {
        Self { kind, source }
    }

    /// Substitute `params` and parse the result into an object of this
    /// template's kind. Unknown or unset placeholders are errors.
    pub fn render(&self, params: &Params) -> Result<DynamicObject> {
        let mut doc: Value = serde_yaml::from_str(self.source).map_err(|e| {
            ProxyAddonError::TemplateError(format!("{} template is not valid YAML: {}", self.kind.kind, e))
        })?;
        substitute(&mut doc, &params.context())?;

        let obj: DynamicObject = serde_json::from_value(doc)?;
        let types = obj.types.as_ref().ok_or_else(|| {
            ProxyAddonError::TemplateError(format!("{} template has no apiVersion/kind", self.kind.kind))
        })?;
        if types.kind != self.kind.kind || types.api_version != self.kind.api_version() {
            return Err(ProxyAddonError::TemplateError(format!(
                "template renders {} {} but {} {} was expected",
                types.api_version,
                types.kind,
                self.kind.api_version(),
                self.kind.kind
            )));
        }
        if obj.metadata.name.as_deref().unwrap_or_default().is_empty() {
            return Err(ProxyAddonError::TemplateError(format!(
                "{} template renders an object without a name",
                self.kind.kind
            )));
        }
        if self.kind.namespaced && obj.namespace().is_none() {
            return Err(ProxyAddonError::TemplateError(format!(
                "{} {} rendered without a namespace",
                self.kind.kind,
                obj.name_any()
            )));
        }

        Ok(obj)
    }
}

/// Shared environment; an undefined placeholder fails the render
fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    })
}

fn substitute(value: &mut Value, context: &BTreeMap<&'static str, &str>) -> Result<()> {
    match value {
        Value::String(s) if s.contains("{{") => {
            *s = substitute_str(s, context)?;
        }
        Value::Array(items) => {
            for item in items {
                substitute(item, context)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                substitute(item, context)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn substitute_str(input: &str, context: &BTreeMap<&'static str, &str>) -> Result<String> {
    environment()
        .render_str(input, context)
        .map_err(|e| ProxyAddonError::TemplateError(format!("cannot render '{}': {}", input, e)))
}

pub mod templates {
    use super::ManifestTemplate;
    use crate::types::{MANAGED_CLUSTER_ADDON, MANAGED_SERVICE_ACCOUNT, MANIFEST_WORK};

    /// Per-cluster addon request (`addon_name`, `managed_cluster_name`)
    pub const ADDON: ManifestTemplate = ManifestTemplate::new(
        &MANAGED_CLUSTER_ADDON,
        r#"
apiVersion: addon.open-cluster-management.io/v1alpha1
kind: ManagedClusterAddOn
metadata:
  name: "{{ addon_name }}"
  namespace: "{{ managed_cluster_name }}"
spec:
  installNamespace: open-cluster-management-agent-addon
"#,
    );

    /// Delegated identity request (`managed_service_account_name`, `cluster_name`)
    pub const MANAGED_SERVICE_ACCOUNT_REQUEST: ManifestTemplate = ManifestTemplate::new(
        &MANAGED_SERVICE_ACCOUNT,
        r#"
apiVersion: authentication.open-cluster-management.io/v1alpha1
kind: ManagedServiceAccount
metadata:
  name: "{{ managed_service_account_name }}"
  namespace: "{{ cluster_name }}"
spec:
  projected:
    type: None
  rotation: {}
"#,
    );

    /// Work order creating a service account, its token secret and a
    /// cluster-admin binding (`service_account_name`,
    /// `service_account_namespace`, `cluster_name`)
    pub const SERVICE_ACCOUNT_WORK: ManifestTemplate = ManifestTemplate::new(
        &MANIFEST_WORK,
        r#"
apiVersion: work.open-cluster-management.io/v1
kind: ManifestWork
metadata:
  name: "{{ service_account_name }}.serviceaccount"
  namespace: "{{ cluster_name }}"
spec:
  workload:
    manifests:
    - apiVersion: v1
      kind: ServiceAccount
      metadata:
        name: "{{ service_account_name }}"
        namespace: "{{ service_account_namespace }}"
    - apiVersion: v1
      kind: Secret
      metadata:
        name: "{{ service_account_name }}"
        namespace: "{{ service_account_namespace }}"
        annotations:
          kubernetes.io/service-account.name: "{{ service_account_name }}"
      type: kubernetes.io/service-account-token
    - apiVersion: rbac.authorization.k8s.io/v1
      kind: ClusterRoleBinding
      metadata:
        name: "{{ service_account_name }}"
      roleRef:
        apiGroup: rbac.authorization.k8s.io
        kind: ClusterRole
        name: cluster-admin
      subjects:
        - kind: ServiceAccount
          name: "{{ service_account_name }}"
          namespace: "{{ service_account_namespace }}"
"#,
    );

    /// Work order binding the delegated identity to cluster-admin
    /// (`managed_service_account_name`, `managed_service_account_namespace`,
    /// `cluster_name`)
    pub const MANAGED_SERVICE_ACCOUNT_RBAC_WORK: ManifestTemplate = ManifestTemplate::new(
        &MANIFEST_WORK,
        r#"
apiVersion: work.open-cluster-management.io/v1
kind: ManifestWork
metadata:
  name: "{{ managed_service_account_name }}.cluster-role-binding"
  namespace: "{{ cluster_name }}"
spec:
  workload:
    manifests:
    - apiVersion: rbac.authorization.k8s.io/v1
      kind: ClusterRoleBinding
      metadata:
        name: "{{ managed_service_account_name }}"
      roleRef:
        apiGroup: rbac.authorization.k8s.io
        kind: ClusterRole
        name: cluster-admin
      subjects:
        - kind: ServiceAccount
          name: "{{ managed_service_account_name }}"
          namespace: "{{ managed_service_account_namespace }}"
"#,
    );
}
