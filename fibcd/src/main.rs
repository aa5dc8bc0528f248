/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;

use crate::config::Config;
use anyhow::Context;
use clap::Parser;
use fabric_static_file::{FabricConfigStaticFile, PortSnapshotFile};
use fibc_broker::{ApLogLayer, Broker};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter};

#[derive(Parser)]
#[command()]
struct FibcdArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Unable to read config file {path}"))?;
    json5::from_str(&contents).with_context(|| format!("Unable to parse config file {path}"))
}

/// Builds the broker and hooks its AP log layer into the running subscriber.
fn start_broker<S>(
    config: &Config,
    ap_log: &reload::Handle<Option<ApLogLayer>, S>,
) -> anyhow::Result<Broker> {
    let snapshot = Arc::new(PortSnapshotFile::new(&config.port_snapshot.file_path));
    let broker = Broker::new(config.broker_config.clone(), snapshot)
        .context("Unable to create broker")?;
    ap_log
        .reload(Some(broker.ap_log_layer()))
        .context("Unable to attach AP log layer")?;
    Ok(broker)
}

#[cfg(unix)]
async fn hangup(signal: &mut Option<tokio::signal::unix::Signal>) {
    match signal {
        Some(signal) => {
            signal.recv().await;
        }
        None => std::future::pending().await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = FibcdArgs::parse();
    let config = load_config(&args.config)?;

    // AP sessions live in the broker; their layer is attached once it exists.
    let (ap_log, ap_log_handle) = reload::Layer::new(None::<ApLogLayer>);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ap_log)
        .try_init()
        .context("Unable to install tracing subscriber")?;

    let broker = start_broker(&config, &ap_log_handle)?;

    info!("Started fibcd");

    let fabric = FabricConfigStaticFile::new(config.fabric_config.file_path.clone());
    let report = broker
        .reload(&fabric)
        .await
        .context("Unable to load fabric configuration")?;
    info!(
        identities = report.identities,
        ports = report.ports,
        "fabric configuration loaded"
    );

    #[cfg(unix)]
    let mut sighup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
        Ok(signal) => Some(signal),
        Err(err) => {
            warn!("SIGHUP reload disabled: {err}");
            None
        }
    };

    loop {
        #[cfg(unix)]
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Unable to listen for Ctrl-C")?;
                break;
            }
            _ = hangup(&mut sighup) => {
                match broker.reload(&fabric).await {
                    Ok(report) => info!(
                        identities = report.identities,
                        ports = report.ports,
                        removed_ports = report.removed_ports.len(),
                        "fabric configuration reloaded"
                    ),
                    Err(err) => warn!("fabric configuration kept: {err}"),
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .context("Unable to listen for Ctrl-C")?;
            break;
        }
    }

    info!("Stopping fibcd");
    Ok(())
}
