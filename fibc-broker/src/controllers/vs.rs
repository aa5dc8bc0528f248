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

//! Virtual switch (VS) plane: packet relay and port discovery.

use crate::broker::{forwarded, BrokerContext};
use crate::correlation::{ReplySource, WaiterReply};
use crate::error::BrokerError;
use crate::message::{DeviceId, DpMonitorEvent, DpType, OamReply, PortStatus, VsMonitorEvent, Xid};
use crate::observability::events;
use crate::plane::Plane;
use crate::session::MonitorStream;
use crate::stats::StatsGroup;
use crate::store::PortKey;
use crate::translate::Translator;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "vs_controller";

pub const STATS_GROUP: &str = "vsctl";
pub(crate) const STATS_COUNTERS: &[&str] = &[
    "hello",
    "hello/err",
    "monitor",
    "monitor/err",
    "leave/vs",
    "pktin",
    "pktin/err",
    "ffpkt",
    "ffpkt/upd",
    "ffpkt/err",
    "oamreply",
];

#[derive(Clone)]
pub struct VsController {
    context: Arc<BrokerContext>,
    stats: Arc<StatsGroup>,
}

impl VsController {
    pub(crate) fn new(context: Arc<BrokerContext>, stats: Arc<StatsGroup>) -> Self {
        Self { context, stats }
    }

    /// Only peers announcing themselves as virtual switches are accepted.
    pub async fn hello(&self, vs_id: DeviceId, dp_type: DpType) -> Result<(), BrokerError> {
        self.stats.inc("hello");
        if dp_type != DpType::Ffvs {
            self.stats.inc("hello/err");
            warn!(
                event = events::HELLO_REJECTED,
                component = COMPONENT,
                vs_id,
                dp_type = ?dp_type,
                "peer is not a virtual switch"
            );
            return Err(BrokerError::InvalidArgument(format!(
                "vs {vs_id} announced type {dp_type:?}"
            )));
        }
        info!(event = events::HELLO, component = COMPONENT, vs_id, "vs hello");
        Ok(())
    }

    /// Serves the monitor stream of `vs_id` until the transport goes away.
    pub async fn monitor(
        &self,
        vs_id: DeviceId,
        stream: Arc<dyn MonitorStream<VsMonitorEvent>>,
        transport: CancellationToken,
    ) -> Result<(), BrokerError> {
        self.stats.inc("monitor");
        let sessions = self.context.vs_sessions();
        let handle = match sessions.open(vs_id.to_string(), stream, &transport).await {
            Ok(handle) => handle,
            Err(err) => {
                self.stats.inc("monitor/err");
                return Err(err);
            }
        };

        handle.cancelled().await;
        if sessions.close(&handle).await {
            self.leave_vs(vs_id).await;
        }
        Ok(())
    }

    /// Forgets every port discovered through `vs_id`; the entries stay.
    async fn leave_vs(&self, vs_id: DeviceId) {
        self.stats.inc("leave/vs");
        let reset = self
            .context
            .store()
            .ports()
            .update_all(
                |entry| entry.vs_view.as_ref().is_some_and(|view| view.id == vs_id),
                |entry| {
                    if let Some(view) = entry.vs_view.as_mut() {
                        view.reset();
                    }
                },
            )
            .await;
        info!(
            event = events::PLANE_LEAVE,
            component = COMPONENT,
            vs_id,
            ports = reset.len(),
            "vs left"
        );
    }

    /// Relays a packet from the VS to the device port it snoops.
    pub async fn packet_in(
        &self,
        vs_id: DeviceId,
        port_id: u32,
        data: Vec<u8>,
    ) -> Result<(), BrokerError> {
        self.stats.inc("pktin");
        let result = self.relay_packet(vs_id, port_id, data).await;
        if let Err(err) = &result {
            self.stats.inc("pktin/err");
            warn!(
                event = events::FORWARD_FAILED,
                component = COMPONENT,
                vs_id,
                port_id,
                err = %err,
                "vs packet not forwarded"
            );
        }
        result
    }

    async fn relay_packet(
        &self,
        vs_id: DeviceId,
        port_id: u32,
        data: Vec<u8>,
    ) -> Result<(), BrokerError> {
        let (dp_id, dp_port) = Translator::new(self.context.store())
            .vs_port_to_dp(vs_id, port_id)
            .await?;
        let event = DpMonitorEvent::PacketOut {
            dp_id,
            port_id: dp_port,
            data,
        };
        forwarded(Plane::Dp, dp_id, self.context.send_dp(dp_id, event).await)
    }

    /// Binds `(vs_id, port_id)` into the VS view of the router port named by
    /// `re_id`/`ifname`. The first binding announces the port UP.
    pub async fn ff_packet(
        &self,
        vs_id: DeviceId,
        port_id: u32,
        re_id: &str,
        ifname: &str,
    ) -> Result<(), BrokerError> {
        self.stats.inc("ffpkt");
        let key = PortKey::new(re_id, ifname);

        let updated = self
            .context
            .store()
            .update_view(&key, |entry| {
                let view = entry.vs_view.as_mut()?;
                view.set_entered(true);
                let changed = view.update(vs_id, port_id);
                Some((changed, entry.clone()))
            })
            .await;

        let (changed, entry) = match updated {
            Some(Some(updated)) => updated,
            Some(None) => {
                self.stats.inc("ffpkt/err");
                return Err(BrokerError::InvalidArgument(format!(
                    "port {key} has no vs view, vs {vs_id} port {port_id}"
                )));
            }
            None => {
                self.stats.inc("ffpkt/err");
                return Err(BrokerError::not_found(format!("port {key}")));
            }
        };

        if changed {
            self.stats.inc("ffpkt/upd");
            debug!(
                event = events::PORT_ENTER,
                component = COMPONENT,
                port_key = %key,
                vs_id,
                port_id,
                "vs port discovered"
            );
            self.context
                .send_vm_port_status_all(&entry, PortStatus::Up)
                .await;
        }
        Ok(())
    }

    pub async fn oam_reply(&self, xid: Xid, reply: OamReply) -> Result<(), BrokerError> {
        self.stats.inc("oamreply");
        let source = ReplySource::Vs(reply.dp_id);
        self.context
            .waiters()
            .resolve(xid, source, WaiterReply::Oam(reply))
            .await;
        Ok(())
    }
}
