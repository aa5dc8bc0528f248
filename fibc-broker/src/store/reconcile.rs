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

//! Epoch-based application of a fabric configuration to the store.

use super::{DevicePortView, IdConflict, IdEntry, IdentityPortStore, PortEntry, PortKey};
use crate::config::FabricConfig;
use crate::message::DeviceId;
use crate::observability::events;
use tracing::{debug, info, warn};

const COMPONENT: &str = "reconcile";

/// Outcome of one reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Port epoch stamped on every surviving entry.
    pub version: u64,
    pub identities: usize,
    pub ports: usize,
    pub removed_identities: Vec<IdEntry>,
    pub removed_ports: Vec<PortKey>,
    pub rejected: Vec<IdConflict>,
    /// Routers naming a datapath that the configuration does not define.
    pub missing_datapaths: Vec<String>,
}

struct ConfiguredPort {
    key: PortKey,
    dp_id: DeviceId,
    dp_port: u32,
}

impl IdentityPortStore {
    /// Applies `config`: swaps in the identity bindings it implies, touches
    /// every configured physical port in a new epoch and sweeps the rest.
    ///
    /// Router-created virtual ports survive as long as their router is still
    /// bound. Views of untouched entries are left as they are, so reloading
    /// an identical configuration changes nothing observable.
    pub async fn reconcile(&self, config: &FabricConfig) -> ReconcileReport {
        let _guard = self.reconcile_lock.lock().await;
        info!(
            event = events::RECONCILE_START,
            component = COMPONENT,
            routers = config.routers.len(),
            datapaths = config.datapaths.len(),
            "reconcile started"
        );

        let mut identities = Vec::with_capacity(config.routers.len());
        let mut planned = Vec::new();
        let mut missing_datapaths = Vec::new();
        for router in &config.routers {
            let Some(datapath) = config.datapath(&router.datapath) else {
                warn!(
                    event = events::RECONCILE_DATAPATH_MISSING,
                    component = COMPONENT,
                    re_id = %router.re_id,
                    datapath = %router.datapath,
                    "router skipped, datapath not defined"
                );
                missing_datapaths.push(router.datapath.clone());
                continue;
            };
            identities.push(IdEntry::new(router.re_id.clone(), datapath.dp_id));
            planned.extend(router.ports.iter().map(|port| ConfiguredPort {
                key: PortKey::new(router.re_id.clone(), port.name.clone()),
                dp_id: datapath.dp_id,
                dp_port: port.port,
            }));
        }

        let id_report = self.ids.replace(identities).await;
        for removed in &id_report.removed {
            debug!(
                event = events::RECONCILE_GC_IDENTITY,
                component = COMPONENT,
                re_id = %removed.re_id,
                dp_id = removed.dp_id,
                "identity binding removed"
            );
        }

        let version = self.ports.ver_up().await;
        let mut ports = 0;
        for port in planned {
            if self.ids.device_by_router(&port.key.re_id) != Some(port.dp_id) {
                continue;
            }
            let ConfiguredPort {
                key,
                dp_id,
                dp_port,
            } = port;
            self.ports
                .upsert(PortEntry::physical(key, dp_id, dp_port), |entry| {
                    let unchanged = entry
                        .dp_view
                        .as_ref()
                        .is_some_and(|view| view.id == dp_id && view.port_id == dp_port);
                    if !unchanged {
                        entry.dp_view = Some(DevicePortView::new(dp_id, dp_port, false));
                    }
                    if entry.vs_view.is_none() {
                        entry.vs_view = Some(DevicePortView::default());
                    }
                })
                .await;
            ports += 1;
        }

        let ids = &self.ids;
        let removed_ports: Vec<PortKey> = self
            .ports
            .gc(|entry| entry.is_virtual() && ids.device_by_router(&entry.key.re_id).is_some())
            .await
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        for key in &removed_ports {
            debug!(
                event = events::RECONCILE_GC_PORT,
                component = COMPONENT,
                port_key = %key,
                "stale port removed"
            );
        }

        let report = ReconcileReport {
            version,
            identities: id_report.bound.len(),
            ports,
            removed_identities: id_report.removed,
            removed_ports,
            rejected: id_report.rejected,
            missing_datapaths,
        };
        info!(
            event = events::RECONCILE_OK,
            component = COMPONENT,
            version,
            identities = report.identities,
            ports = report.ports,
            removed_identities = report.removed_identities.len(),
            removed_ports = report.removed_ports.len(),
            "reconcile finished"
        );
        report
    }
}
