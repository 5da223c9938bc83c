// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cluster_proxy_addon::config::{Config, LogFormat};
use cluster_proxy_addon::kubernetes::{create_hub_client, KubeResourceClient};
use cluster_proxy_addon::reconcilers::{Orchestrator, RunOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration decides the log format, so it is loaded first
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!(
        "Enabling cluster proxy for {} using hub kubeconfig {}",
        config.managed_cluster,
        config.hub_kubeconfig.display()
    );

    let client = create_hub_client(&config.hub_kubeconfig).await?;
    info!("Connected to hub cluster");

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("Received interrupt, cancelling run");
                cancel.cancel();
            }
        }
    });

    let orchestrator = Orchestrator::new(KubeResourceClient::new(client), RunOptions::from(&config))
        .with_cancellation(cancel);
    let report = orchestrator.execute(&config.managed_cluster).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_success() {
        bail!("run for {} stopped at stage {}", report.cluster, report.stage);
    }
    for step in &report.deferred {
        info!("Not performed: {}", step);
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kube=warn,hyper=warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
