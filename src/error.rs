// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::reconcilers::DeferredStep;
use crate::types::ResourceKey;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyAddonError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("{0} not found")]
    NotFound(ResourceKey),

    #[error("{0} already exists")]
    AlreadyExists(ResourceKey),

    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("{0} disappeared while waiting for it to become ready")]
    ResourceGone(ResourceKey),

    #[error("{what} reported a terminal failure: {reason}")]
    ReadinessFailed { what: String, reason: String },

    #[error("Wait for {0} was cancelled")]
    Cancelled(String),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Failed to render manifest: {0}")]
    TemplateError(String),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0} is not implemented yet")]
    NotImplemented(DeferredStep),
}

impl ProxyAddonError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProxyAddonError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ProxyAddonError::AlreadyExists(_))
    }

    /// Errors worth retrying while waiting: server-side hiccups, throttling
    /// and transport failures. Permission and validation errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ProxyAddonError::KubeError(kube::Error::Api(resp)) => {
                resp.code >= 500 || resp.code == 429
            }
            ProxyAddonError::KubeError(kube::Error::HyperError(_))
            | ProxyAddonError::KubeError(kube::Error::Service(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyAddonError>;
