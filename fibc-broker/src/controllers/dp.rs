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

//! Data-plane (DP) controller.
//!
//! A device enters when its monitor session opens: the broker immediately
//! asks it for its port descriptions with xid `0`. The reply to that request is
//! consumed here to mark ports entered and is never offered to the waiter
//! table. Replies to other xids are handed to their waiters.

use crate::broker::{forwarded, BrokerContext};
use crate::correlation::{ReplySource, WaiterReply};
use crate::error::BrokerError;
use crate::message::{
    DeviceId, DevicePort, DpMonitorEvent, DpType, L2Addr, MultipartReply, MultipartReplyBody,
    MultipartRequest, MultipartRequestBody, OamReply, PortStatus, VmMonitorEvent, VsMonitorEvent,
    Xid,
};
use crate::observability::events;
use crate::plane::Plane;
use crate::session::MonitorStream;
use crate::snapshot::SnapshotPort;
use crate::stats::StatsGroup;
use crate::store::ViewKey;
use crate::translate::Translator;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "dp_controller";

/// Transaction id of the port-description request sent on enter.
pub const INTERNAL_XID: Xid = 0;

pub const STATS_GROUP: &str = "dpctl";
pub(crate) const STATS_COUNTERS: &[&str] = &[
    "hello",
    "monitor",
    "monitor/err",
    "enter/dp",
    "enter/dp/err",
    "leave/dp",
    "enter/port",
    "enter/port/err",
    "leave/port",
    "mp",
    "mp/portdesc",
    "pktin",
    "pktin/err",
    "portstatus",
    "portstatus/err",
    "l2addrstatus",
    "l2addrstatus/err",
    "oamreply",
];

#[derive(Clone)]
pub struct DpController {
    context: Arc<BrokerContext>,
    stats: Arc<StatsGroup>,
}

impl DpController {
    pub(crate) fn new(context: Arc<BrokerContext>, stats: Arc<StatsGroup>) -> Self {
        Self { context, stats }
    }

    fn translator(&self) -> Translator<'_> {
        Translator::new(self.context.store())
    }

    fn failed(
        &self,
        counter: &str,
        dp_id: DeviceId,
        op: &'static str,
        err: BrokerError,
    ) -> BrokerError {
        self.stats.inc(counter);
        warn!(
            event = events::FORWARD_FAILED,
            component = COMPONENT,
            dp_id,
            op,
            err = %err,
            "device message not forwarded"
        );
        err
    }

    pub async fn hello(&self, dp_id: DeviceId, dp_type: DpType) -> Result<(), BrokerError> {
        self.stats.inc("hello");
        debug!(
            event = events::HELLO,
            component = COMPONENT,
            dp_id,
            dp_type = ?dp_type,
            "device hello"
        );
        Ok(())
    }

    /// Serves the monitor stream of `dp_id` until the transport goes away.
    pub async fn monitor(
        &self,
        dp_id: DeviceId,
        stream: Arc<dyn MonitorStream<DpMonitorEvent>>,
        transport: CancellationToken,
    ) -> Result<(), BrokerError> {
        self.stats.inc("monitor");
        if let Err(err) = self.translator().device_to_router(dp_id) {
            self.stats.inc("monitor/err");
            warn!(
                event = events::SESSION_ENTER_FAILED,
                component = COMPONENT,
                dp_id,
                err = %err,
                "device is not bound to a router"
            );
            return Err(err.into());
        }

        let sessions = self.context.dp_sessions();
        let handle = match sessions.open(dp_id.to_string(), stream, &transport).await {
            Ok(handle) => handle,
            Err(err) => {
                self.stats.inc("monitor/err");
                return Err(err);
            }
        };

        let entered = self.enter_dp(dp_id).await;
        if entered.is_ok() {
            handle.cancelled().await;
        }
        if sessions.close(&handle).await {
            self.leave_dp(dp_id).await;
        }
        entered
    }

    async fn enter_dp(&self, dp_id: DeviceId) -> Result<(), BrokerError> {
        self.stats.inc("enter/dp");
        let request = DpMonitorEvent::Multipart {
            xid: INTERNAL_XID,
            request: MultipartRequest {
                dp_id,
                body: MultipartRequestBody::PortDesc { internal: true },
            },
        };
        let delivery = self.context.send_dp(dp_id, request).await;
        if let Err(err) = forwarded(Plane::Dp, dp_id, delivery) {
            self.stats.inc("enter/dp/err");
            warn!(
                event = events::SESSION_ENTER_FAILED,
                component = COMPONENT,
                dp_id,
                err = %err,
                "port description request not sent"
            );
            return Err(err);
        }
        info!(
            event = events::PLANE_ENTER,
            component = COMPONENT,
            dp_id,
            "device entered"
        );
        Ok(())
    }

    /// Marks every port of the device left and tells the routers.
    async fn leave_dp(&self, dp_id: DeviceId) {
        self.stats.inc("leave/dp");
        let left = self
            .context
            .store()
            .ports()
            .update_all(
                |entry| entry.dp_view.as_ref().is_some_and(|view| view.id == dp_id),
                |entry| {
                    if let Some(view) = entry.vs_view.as_mut() {
                        view.reset();
                    }
                    if let Some(view) = entry.dp_view.as_mut() {
                        view.set_entered(false);
                    }
                },
            )
            .await;

        for entry in &left {
            self.stats.inc("leave/port");
            self.context
                .send_vm_port_status(&entry.key, entry.vm_view.port_id, PortStatus::Down)
                .await;
        }
        info!(
            event = events::PLANE_LEAVE,
            component = COMPONENT,
            dp_id,
            ports = left.len(),
            "device left"
        );
    }

    async fn enter_port(&self, dp_id: DeviceId, port: &DevicePort) {
        self.stats.inc("enter/port");
        let entered = self
            .context
            .store()
            .ports()
            .update_by_view(&ViewKey::dp(dp_id, port.port_no), |entry| {
                if let Some(view) = entry.dp_view.as_mut() {
                    view.set_entered(true);
                }
                entry.clone()
            })
            .await;
        let Some(entry) = entered else {
            self.stats.inc("enter/port/err");
            warn!(
                event = events::PORT_ENTER_FAILED,
                component = COMPONENT,
                dp_id,
                port_id = port.port_no,
                "no port bound to device port"
            );
            return;
        };

        debug!(
            event = events::PORT_ENTER,
            component = COMPONENT,
            dp_id,
            port_id = port.port_no,
            port_key = %entry.key,
            "device port entered"
        );
        let status = PortStatus::from_device_state(port.state);
        self.context.send_vm_port_status_all(&entry, status).await;
    }

    async fn store_snapshot(&self, dp_id: DeviceId, ports: &[DevicePort]) {
        let mut snapshot = Vec::with_capacity(ports.len());
        for port in ports {
            let name = if port.name.is_empty() {
                self.context
                    .store()
                    .lookup_by_view(&ViewKey::dp(dp_id, port.port_no))
                    .await
                    .map(|entry| entry.key.ifname)
                    .unwrap_or_default()
            } else {
                port.name.clone()
            };
            snapshot.push(SnapshotPort {
                name,
                hw_addr: port.hw_addr.clone(),
                port_no: port.port_no,
            });
        }

        if let Err(err) = self.context.snapshot_sink().store_ports(dp_id, snapshot).await {
            warn!(
                event = events::PORT_SNAPSHOT_FAILED,
                component = COMPONENT,
                dp_id,
                err = %err,
                "port snapshot not stored"
            );
        }
    }

    pub async fn multipart_reply(
        &self,
        xid: Xid,
        reply: MultipartReply,
    ) -> Result<(), BrokerError> {
        self.stats.inc("mp");
        debug!(
            event = events::MULTIPART_REPLY,
            component = COMPONENT,
            dp_id = reply.dp_id,
            xid,
            kind = reply.kind_name(),
            "multipart reply"
        );

        if let MultipartReplyBody::PortDesc { internal, ports } = &reply.body {
            self.stats.inc("mp/portdesc");
            if *internal {
                for port in ports {
                    self.enter_port(reply.dp_id, port).await;
                }
                self.store_snapshot(reply.dp_id, ports).await;
                return Ok(());
            }
        }

        let source = ReplySource::Dp(reply.dp_id);
        self.context
            .waiters()
            .resolve(xid, source, WaiterReply::Multipart(reply))
            .await;
        Ok(())
    }

    /// Relays a punted packet to the VS port snooping `port_id`.
    pub async fn packet_in(
        &self,
        dp_id: DeviceId,
        port_id: u32,
        data: Vec<u8>,
    ) -> Result<(), BrokerError> {
        self.stats.inc("pktin");
        let (vs_id, vs_port) = self
            .translator()
            .dp_port_to_vs(dp_id, port_id)
            .await
            .map_err(|err| self.failed("pktin/err", dp_id, "packet_in", err.into()))?;

        let event = VsMonitorEvent::PacketOut {
            vs_id,
            port_id: vs_port,
            data,
        };
        let delivery = self.context.send_vs(vs_id, event).await;
        forwarded(Plane::Vs, vs_id, delivery)
            .map_err(|err| self.failed("pktin/err", dp_id, "packet_in", err))
    }

    /// Mirrors a device port state change onto the VS port snooping it.
    pub async fn port_status(
        &self,
        dp_id: DeviceId,
        port_no: u32,
        state: u32,
    ) -> Result<(), BrokerError> {
        self.stats.inc("portstatus");
        let status = PortStatus::from_device_state(state);
        let (vs_id, vs_port) = self
            .translator()
            .dp_port_to_vs(dp_id, port_no)
            .await
            .map_err(|err| self.failed("portstatus/err", dp_id, "port_status", err.into()))?;

        let event = VsMonitorEvent::PortMod {
            vs_id,
            port_id: vs_port,
            status,
        };
        let delivery = self.context.send_vs(vs_id, event).await;
        forwarded(Plane::Vs, vs_id, delivery)
            .map_err(|err| self.failed("portstatus/err", dp_id, "port_status", err))
    }

    /// Reports learned L2 addresses to the router owning the device.
    pub async fn l2addr_status(
        &self,
        dp_id: DeviceId,
        addrs: Vec<L2Addr>,
    ) -> Result<(), BrokerError> {
        self.stats.inc("l2addrstatus");
        let (re_id, addrs) = self
            .translator()
            .l2addrs_to_vm(dp_id, addrs)
            .await
            .map_err(|err| self.failed("l2addrstatus/err", dp_id, "l2addr_status", err.into()))?;

        let event = VmMonitorEvent::L2AddrStatus {
            re_id: re_id.clone(),
            addrs,
        };
        let delivery = self.context.send_vm(&re_id, event).await;
        forwarded(Plane::Vm, re_id, delivery)
            .map_err(|err| self.failed("l2addrstatus/err", dp_id, "l2addr_status", err))
    }

    pub async fn oam_reply(&self, xid: Xid, reply: OamReply) -> Result<(), BrokerError> {
        self.stats.inc("oamreply");
        debug!(
            event = events::OAM_REPLY,
            component = COMPONENT,
            xid,
            dp_id = reply.dp_id,
            "oam reply"
        );
        let source = ReplySource::Dp(reply.dp_id);
        self.context
            .waiters()
            .resolve(xid, source, WaiterReply::Oam(reply))
            .await;
        Ok(())
    }
}
