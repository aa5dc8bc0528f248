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

//! Administrative (AP) plane: table dumps, statistics and audits.

use crate::broker::{forwarded, BrokerContext};
use crate::correlation::{AuditSummary, AuditWaiter, MultipartWaiter, ReplySource, WaiterError};
use crate::error::BrokerError;
use crate::message::{
    ApMonitorEvent, DeviceId, DpMonitorEvent, MultipartReplyBody, MultipartRequest,
    MultipartRequestBody, OamRequest, OamRequestBody, PortStats, VmMonitorEvent, Xid,
};
use crate::observability::events;
use crate::plane::Plane;
use crate::session::{MonitorStream, SessionEntry};
use crate::stats::{StatsEntry, StatsGroup};
use crate::store::{IdEntry, PortEntry, ViewKey};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "ap_controller";

/// Counters requested when a port statistics query names none.
pub const DEFAULT_PORT_STATS_NAMES: &[&str] = &[
    "ifInOctets",
    "ifInUcastPkts",
    "ifInNUcastPkts",
    "ifInDiscards",
    "ifInErrors",
    "ifOutOctets",
    "ifOutUcastPkts",
    "ifOutNUcastPkts",
    "ifOutDiscards",
    "ifOutErrors",
];

const IF_OPER_STATUS_UP: u64 = 1;
const IF_OPER_STATUS_DOWN: u64 = 2;

pub const STATS_GROUP: &str = "apctl";
pub(crate) const STATS_COUNTERS: &[&str] = &[
    "monitor",
    "monitor/err",
    "getportentries",
    "getidentries",
    "getdpentries",
    "getportstats",
    "getportstats/err",
    "getstats",
    "audit",
    "audit/err",
];

#[derive(Clone)]
pub struct ApController {
    context: Arc<BrokerContext>,
    stats: Arc<StatsGroup>,
}

fn waiter_failed(xid: Xid, err: WaiterError) -> BrokerError {
    match err {
        WaiterError::Timeout(after) => {
            debug!(
                event = events::WAITER_TIMEOUT,
                component = COMPONENT,
                xid,
                after = ?after,
                "no reply in time"
            );
            BrokerError::Timeout { xid, after }
        }
        other => other.into(),
    }
}

impl ApController {
    pub(crate) fn new(context: Arc<BrokerContext>, stats: Arc<StatsGroup>) -> Self {
        Self { context, stats }
    }

    /// Streams log lines to an administrative client until it disconnects.
    /// Every connection gets its own session id as entry id.
    pub async fn monitor(
        &self,
        stream: Arc<dyn MonitorStream<ApMonitorEvent>>,
        transport: CancellationToken,
    ) -> Result<(), BrokerError> {
        self.stats.inc("monitor");
        let entry_id = uuid::Uuid::new_v4().hyphenated().to_string();
        let sessions = self.context.ap_sessions();
        let handle = match sessions.open(entry_id, stream, &transport).await {
            Ok(handle) => handle,
            Err(err) => {
                self.stats.inc("monitor/err");
                return Err(err);
            }
        };

        handle.cancelled().await;
        sessions.close(&handle).await;
        Ok(())
    }

    pub async fn port_entries(&self) -> Vec<PortEntry> {
        self.stats.inc("getportentries");
        self.context.store().ports().entries().await
    }

    pub fn id_entries(&self) -> Vec<IdEntry> {
        self.stats.inc("getidentries");
        self.context.store().ids().entries()
    }

    /// Registered monitor sessions of one plane, or of all of them.
    pub async fn session_entries(&self, plane: Option<Plane>) -> Vec<SessionEntry> {
        self.stats.inc("getdpentries");
        let wanted = |candidate: Plane| plane.map_or(true, |plane| plane == candidate);

        let mut entries = Vec::new();
        if wanted(Plane::Ap) {
            entries.extend(self.context.ap_sessions().entries().await);
        }
        if wanted(Plane::Vm) {
            entries.extend(self.context.vm_sessions().entries().await);
        }
        if wanted(Plane::Dp) {
            entries.extend(self.context.dp_sessions().entries().await);
        }
        if wanted(Plane::Vs) {
            entries.extend(self.context.vs_sessions().entries().await);
        }
        entries
    }

    pub fn stats(&self) -> Vec<StatsEntry> {
        self.stats.inc("getstats");
        self.context.stats().entries()
    }

    /// Queries the counters of one device port and waits for the answer.
    ///
    /// Fails with not-found, before any waiter exists, when the device has no
    /// monitor session.
    pub async fn port_stats(
        &self,
        dp_id: DeviceId,
        port_no: u32,
        names: Vec<String>,
    ) -> Result<Vec<PortStats>, BrokerError> {
        self.stats.inc("getportstats");
        let result = self.query_port_stats(dp_id, port_no, names).await;
        if let Err(err) = &result {
            self.stats.inc("getportstats/err");
            warn!(
                event = events::PORT_STATS_FAILED,
                component = COMPONENT,
                dp_id,
                port_id = port_no,
                err = %err,
                "port statistics query failed"
            );
        }
        result
    }

    async fn query_port_stats(
        &self,
        dp_id: DeviceId,
        port_no: u32,
        names: Vec<String>,
    ) -> Result<Vec<PortStats>, BrokerError> {
        if !self.context.dp_sessions().contains(&dp_id.to_string()).await {
            return Err(BrokerError::not_found(format!("dp session {dp_id}")));
        }
        let names = if names.is_empty() {
            DEFAULT_PORT_STATS_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect()
        } else {
            names
        };

        let waiter = Arc::new(MultipartWaiter::new(ReplySource::Dp(dp_id)));
        let waiters = self.context.waiters();
        let xid = waiters.register(waiter.clone()).await;
        debug!(
            event = events::PORT_STATS_REQUEST,
            component = COMPONENT,
            dp_id,
            port_id = port_no,
            xid,
            "port statistics requested"
        );

        let request = DpMonitorEvent::Multipart {
            xid,
            request: MultipartRequest {
                dp_id,
                body: MultipartRequestBody::Port { port_no, names },
            },
        };
        let delivery = self.context.send_dp(dp_id, request).await;
        let reply = match forwarded(Plane::Dp, dp_id, delivery) {
            Ok(()) => waiter
                .wait(self.context.config().port_stats_timeout())
                .await
                .map_err(|err| waiter_failed(xid, err)),
            Err(err) => Err(err),
        };
        waiters.unregister(xid).await;

        let reply = reply?;
        let kind = reply.kind_name();
        let MultipartReplyBody::Port(mut port_stats) = reply.body else {
            return Err(WaiterError::InvalidReply(format!(
                "expected port statistics for xid {xid}, got {kind}"
            ))
            .into());
        };
        self.extend_port_stats(dp_id, &mut port_stats).await;
        Ok(port_stats)
    }

    async fn extend_port_stats(&self, dp_id: DeviceId, port_stats: &mut [PortStats]) {
        for stats in port_stats {
            stats
                .values
                .insert("port_no".to_string(), u64::from(stats.port_no));
            let entry = self
                .context
                .store()
                .lookup_by_view(&ViewKey::dp(dp_id, stats.port_no))
                .await;
            let (ifname, entered) = match entry {
                Some(entry) => {
                    let entered = entry.dp_view.is_some_and(|view| view.entered);
                    (entry.key.ifname, entered)
                }
                None => (String::new(), false),
            };
            let oper_status = if entered {
                IF_OPER_STATUS_UP
            } else {
                IF_OPER_STATUS_DOWN
            };
            stats.svalues.insert("ifName".to_string(), ifname);
            stats.values.insert("ifOperStatus".to_string(), oper_status);
        }
    }

    /// Asks every router and data plane connected right now for its route
    /// count and waits for all of them.
    ///
    /// The participant set is fixed when the request is issued: a session
    /// opened later is not asked, and one that drops out after its request
    /// was queued keeps the audit pending until the timeout. A request that
    /// cannot be queued fails the audit with [`BrokerError::Undelivered`].
    pub async fn audit_route_count(&self) -> Result<AuditSummary, BrokerError> {
        self.stats.inc("audit");
        let vm_ids = self.context.vm_sessions().ids().await;
        let dp_ids: Vec<DeviceId> = self
            .context
            .dp_sessions()
            .ids()
            .await
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect();

        let expected = vm_ids
            .iter()
            .cloned()
            .map(ReplySource::Vm)
            .chain(dp_ids.iter().copied().map(ReplySource::Dp));
        let waiter = Arc::new(AuditWaiter::new(expected));
        let waiters = self.context.waiters();
        let xid = waiters.register(waiter.clone()).await;
        info!(
            event = events::AUDIT_REQUEST,
            component = COMPONENT,
            xid,
            routers = vm_ids.len(),
            devices = dp_ids.len(),
            "route count audit issued"
        );

        let result = match self.send_audit_requests(xid, &vm_ids, &dp_ids).await {
            Ok(()) => waiter
                .wait(self.context.config().audit_timeout())
                .await
                .map_err(|err| waiter_failed(xid, err)),
            Err(err) => Err(err),
        };
        waiters.unregister(xid).await;

        if let Err(err) = &result {
            self.stats.inc("audit/err");
            let remaining = waiter.remaining().await;
            warn!(
                event = events::AUDIT_FAILED,
                component = COMPONENT,
                xid,
                remaining,
                err = %err,
                "route count audit incomplete"
            );
        }
        result
    }

    /// Stops at the first participant whose request is dropped; its reply
    /// could never arrive.
    async fn send_audit_requests(
        &self,
        xid: Xid,
        vm_ids: &[String],
        dp_ids: &[DeviceId],
    ) -> Result<(), BrokerError> {
        for re_id in vm_ids {
            let request = VmMonitorEvent::OamRequest {
                xid,
                request: OamRequest {
                    dp_id: 0,
                    body: OamRequestBody::AuditRouteCnt,
                },
            };
            let delivery = self.context.send_vm(re_id, request).await;
            forwarded(Plane::Vm, re_id, delivery)?;
        }
        for dp_id in dp_ids {
            let request = DpMonitorEvent::OamRequest {
                xid,
                request: OamRequest {
                    dp_id: *dp_id,
                    body: OamRequestBody::AuditRouteCnt,
                },
            };
            let delivery = self.context.send_dp(*dp_id, request).await;
            forwarded(Plane::Dp, dp_id, delivery)?;
        }
        Ok(())
    }
}
