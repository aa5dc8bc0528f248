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

//! Router (VM) plane: port lifecycle and flow/group programming.

use crate::broker::{forwarded, BrokerContext};
use crate::correlation::{ReplySource, WaiterReply};
use crate::error::BrokerError;
use crate::message::{
    DeviceId, DpMonitorEvent, FlowMod, GroupMod, OamReply, PortCommand, PortConfig, PortStatus,
    VmMonitorEvent, Xid,
};
use crate::observability::{events, fields};
use crate::plane::Plane;
use crate::session::MonitorStream;
use crate::stats::StatsGroup;
use crate::store::{DevicePortView, PortEntry, PortKey};
use crate::translate::{TranslateError, Translator};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "vm_controller";

pub const STATS_GROUP: &str = "vmctl";
pub(crate) const STATS_COUNTERS: &[&str] = &[
    "hello",
    "hello/err",
    "monitor",
    "monitor/err",
    "portcfg",
    "portcfg/err",
    "enter/port/phy",
    "enter/port/phy/upd",
    "enter/port/phy/err",
    "leave/port/phy",
    "leave/port/phy/upd",
    "leave/port/phy/err",
    "enter/port/vir",
    "enter/port/vir/upd",
    "leave/port/vir",
    "leave/port/vir/err",
    "leave/vm",
    "flowmod",
    "flowmod/err",
    "groupmod",
    "groupmod/err",
    "oamreply",
];

#[derive(Clone)]
pub struct VmController {
    context: Arc<BrokerContext>,
    stats: Arc<StatsGroup>,
}

impl VmController {
    pub(crate) fn new(context: Arc<BrokerContext>, stats: Arc<StatsGroup>) -> Self {
        Self { context, stats }
    }

    fn translator(&self) -> Translator<'_> {
        Translator::new(self.context.store())
    }

    /// Accepts a router only when it is bound to a device.
    pub async fn hello(&self, re_id: &str) -> Result<(), BrokerError> {
        self.stats.inc("hello");
        match self.translator().router_to_device(re_id) {
            Ok(dp_id) => {
                debug!(
                    event = events::HELLO,
                    component = COMPONENT,
                    re_id,
                    dp_id,
                    "router hello"
                );
                Ok(())
            }
            Err(err) => {
                self.stats.inc("hello/err");
                warn!(
                    event = events::HELLO_REJECTED,
                    component = COMPONENT,
                    re_id,
                    err = %err,
                    "router hello rejected"
                );
                Err(err.into())
            }
        }
    }

    /// Serves the monitor stream of `re_id` until the transport goes away.
    pub async fn monitor(
        &self,
        re_id: &str,
        stream: Arc<dyn MonitorStream<VmMonitorEvent>>,
        transport: CancellationToken,
    ) -> Result<(), BrokerError> {
        self.stats.inc("monitor");
        if let Err(err) = self.translator().router_to_device(re_id) {
            self.stats.inc("monitor/err");
            warn!(
                event = events::SESSION_ENTER_FAILED,
                component = COMPONENT,
                re_id,
                err = %err,
                "router is not bound to a device"
            );
            return Err(err.into());
        }

        let sessions = self.context.vm_sessions();
        let handle = match sessions.open(re_id, stream, &transport).await {
            Ok(handle) => handle,
            Err(err) => {
                self.stats.inc("monitor/err");
                return Err(err);
            }
        };

        handle.cancelled().await;
        if sessions.close(&handle).await {
            self.leave_vm(re_id).await;
        }
        Ok(())
    }

    pub async fn port_config(&self, config: PortConfig) -> Result<(), BrokerError> {
        self.stats.inc("portcfg");
        debug!(
            event = events::PORT_CONFIG,
            component = COMPONENT,
            re_id = config.re_id.as_str(),
            ifname = config.ifname.as_str(),
            port_id = config.port_id,
            dp_port = config.dp_port,
            cmd = ?config.cmd,
            "port config"
        );

        let result = self.apply_port_config(config).await;
        match &result {
            Ok(()) => {}
            Err(err @ BrokerError::Unsupported(_)) => {
                self.stats.inc("portcfg/err");
                error!(
                    event = events::UNSUPPORTED_KIND,
                    component = COMPONENT,
                    err = %err,
                    "port config not handled"
                );
            }
            Err(err) => {
                self.stats.inc("portcfg/err");
                warn!(
                    event = events::PORT_CONFIG_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "port config failed"
                );
            }
        }
        result
    }

    async fn apply_port_config(&self, config: PortConfig) -> Result<(), BrokerError> {
        let dp_id = self.translator().router_to_device(&config.re_id)?;
        let physical = config.is_physical();
        match (config.cmd, physical) {
            (PortCommand::Add | PortCommand::Modify, true) => self.enter_port_phy(config).await,
            (PortCommand::Delete, true) => self.leave_port_phy(config).await,
            (PortCommand::Add | PortCommand::Modify, false) => {
                self.enter_port_virt(config, dp_id).await;
                Ok(())
            }
            (PortCommand::Delete, false) => self.leave_port_virt(config).await,
            (PortCommand::Nop, _) => Err(BrokerError::Unsupported(format!(
                "port command {:?}",
                config.cmd
            ))),
        }
    }

    async fn enter_port_phy(&self, config: PortConfig) -> Result<(), BrokerError> {
        self.stats.inc("enter/port/phy");
        let key = PortKey::new(config.re_id.as_str(), config.ifname.as_str());
        let master_key = config
            .master
            .as_deref()
            .map(|master| PortKey::new(config.re_id.as_str(), master));

        let updated = self
            .context
            .store()
            .update_view(&key, |entry| {
                let changed = entry.vm_view.update_port(config.port_id);
                entry.vm_view.set_entered(true);
                entry.master_key = master_key;
                (changed, entry.clone())
            })
            .await;
        let Some((changed, entry)) = updated else {
            self.stats.inc("enter/port/phy/err");
            return Err(BrokerError::not_found(format!("port {key}")));
        };

        info!(
            event = events::PORT_ENTER,
            component = COMPONENT,
            port_key = %key,
            port_id = config.port_id,
            "vm port entered"
        );
        if changed {
            self.stats.inc("enter/port/phy/upd");
            self.context
                .send_vm_port_status_all(&entry, PortStatus::Up)
                .await;
        }
        self.send_dp_port_mod(&entry, config.status).await;
        Ok(())
    }

    async fn leave_port_phy(&self, config: PortConfig) -> Result<(), BrokerError> {
        self.stats.inc("leave/port/phy");
        let key = PortKey::new(config.re_id.as_str(), config.ifname.as_str());

        let updated = self
            .context
            .store()
            .update_view(&key, |entry| {
                let previous = entry.clone();
                entry.master_key = None;
                if let Some(view) = entry.vs_view.as_mut() {
                    view.reset();
                }
                entry.vm_view.set_entered(false);
                let changed = entry.vm_view.update_port(0);
                (changed, previous)
            })
            .await;
        let Some((changed, previous)) = updated else {
            self.stats.inc("leave/port/phy/err");
            return Err(BrokerError::not_found(format!("port {key}")));
        };

        info!(
            event = events::PORT_LEAVE,
            component = COMPONENT,
            port_key = %key,
            port_id = previous.vm_view.port_id,
            "vm port left"
        );
        if changed {
            self.stats.inc("leave/port/phy/upd");
            self.context
                .send_vm_port_status(&previous.key, previous.vm_view.port_id, PortStatus::Down)
                .await;
        }
        self.send_dp_port_mod(&previous, config.status).await;
        Ok(())
    }

    async fn enter_port_virt(&self, config: PortConfig, dp_id: DeviceId) {
        self.stats.inc("enter/port/vir");
        let re_id = config.re_id.as_str();
        let key = PortKey::new(re_id, config.ifname.as_str());
        let dp_view =
            (config.dp_port != 0).then(|| DevicePortView::new(dp_id, config.dp_port, true));
        let parent_key = config.link.as_deref().map(|link| PortKey::new(re_id, link));
        let master_key = config.master.as_deref().map(|master| PortKey::new(re_id, master));

        let (changed, entry) = self
            .context
            .store()
            .ports()
            .upsert(PortEntry::new(key.clone()), |entry| {
                let changed = entry.vm_view.update(re_id.to_string(), config.port_id);
                entry.vm_view.set_entered(true);
                entry.dp_view = dp_view;
                entry.parent_key = parent_key;
                entry.master_key = master_key;
                (changed, entry.clone())
            })
            .await;

        info!(
            event = events::PORT_ENTER,
            component = COMPONENT,
            port_key = %key,
            port_id = config.port_id,
            "vm virtual port entered"
        );
        if changed {
            self.stats.inc("enter/port/vir/upd");
            self.context
                .send_vm_port_status(&entry.key, entry.vm_view.port_id, PortStatus::Up)
                .await;
        }
    }

    async fn leave_port_virt(&self, config: PortConfig) -> Result<(), BrokerError> {
        self.stats.inc("leave/port/vir");
        let key = PortKey::new(config.re_id.as_str(), config.ifname.as_str());

        let Some(removed) = self.context.store().unregister(&key).await else {
            self.stats.inc("leave/port/vir/err");
            return Err(BrokerError::not_found(format!("port {key}")));
        };

        info!(
            event = events::PORT_LEAVE,
            component = COMPONENT,
            port_key = %key,
            port_id = removed.vm_view.port_id,
            "vm virtual port left"
        );
        self.context
            .send_vm_port_status(&removed.key, removed.vm_view.port_id, PortStatus::Down)
            .await;
        Ok(())
    }

    // Failures only matter to the device; the router request still succeeds.
    async fn send_dp_port_mod(&self, entry: &PortEntry, status: PortStatus) {
        let Some(view) = entry.dp_view.as_ref().filter(|view| view.is_bound()) else {
            return;
        };
        let event = DpMonitorEvent::PortMod {
            dp_id: view.id,
            port_no: view.port_id,
            status,
        };
        let delivery = self.context.send_dp(view.id, event).await;
        if let Err(err) = forwarded(Plane::Dp, view.id, delivery) {
            debug!(
                event = events::FORWARD_FAILED,
                component = COMPONENT,
                port_key = %entry.key,
                dp_id = view.id,
                err = %err,
                "port mod not forwarded"
            );
        }
    }

    /// Deletes the router's virtual ports and resets its physical ones.
    async fn leave_vm(&self, re_id: &str) {
        self.stats.inc("leave/vm");
        let ports = self.context.store().ports();

        let virtual_ports: Vec<PortEntry> = ports
            .list_by_vm(re_id)
            .await
            .into_iter()
            .filter(|entry| entry.is_virtual())
            .collect();
        for entry in &virtual_ports {
            ports.unregister(&entry.key).await;
        }

        let reset = ports
            .update_all(
                |entry| entry.vm_view.id == re_id && !entry.is_virtual(),
                |entry| {
                    entry.vm_view.set_entered(false);
                    entry.vm_view.update_port(0);
                    entry.master_key = None;
                },
            )
            .await;

        info!(
            event = events::PLANE_LEAVE,
            component = COMPONENT,
            re_id,
            removed = virtual_ports.len(),
            reset = reset.len(),
            "router left"
        );
    }

    pub async fn flow_mod(&self, mut flow_mod: FlowMod) -> Result<(), BrokerError> {
        self.stats.inc("flowmod");
        let kind = fields::format_flow_kind(&flow_mod);
        let translated = self.translator().flow_mod_to_dp(&mut flow_mod).await;
        let result = self
            .forward(translated, kind, flow_mod.re_id.clone(), || {
                DpMonitorEvent::FlowMod(flow_mod)
            })
            .await;
        if result.is_err() {
            self.stats.inc("flowmod/err");
        }
        result
    }

    pub async fn group_mod(&self, mut group_mod: GroupMod) -> Result<(), BrokerError> {
        self.stats.inc("groupmod");
        let kind = fields::format_group_kind(&group_mod);
        let translated = self.translator().group_mod_to_dp(&mut group_mod).await;
        let result = self
            .forward(translated, kind, group_mod.re_id.clone(), || {
                DpMonitorEvent::GroupMod(group_mod)
            })
            .await;
        if result.is_err() {
            self.stats.inc("groupmod/err");
        }
        result
    }

    async fn forward(
        &self,
        translated: Result<DeviceId, TranslateError>,
        kind: String,
        re_id: String,
        event: impl FnOnce() -> DpMonitorEvent,
    ) -> Result<(), BrokerError> {
        let kind = kind.as_str();
        let dp_id = match translated.map_err(BrokerError::from) {
            Ok(dp_id) => dp_id,
            Err(BrokerError::NoEffect) => {
                debug!(
                    event = events::TRANSLATE_NO_EFFECT,
                    component = COMPONENT,
                    re_id = re_id.as_str(),
                    kind,
                    "nothing to forward"
                );
                return Ok(());
            }
            Err(err) => {
                warn!(
                    event = events::TRANSLATE_FAILED,
                    component = COMPONENT,
                    re_id = re_id.as_str(),
                    kind,
                    err = %err,
                    "translation failed"
                );
                return Err(err);
            }
        };
        debug!(
            event = events::TRANSLATE_OK,
            component = COMPONENT,
            re_id = re_id.as_str(),
            dp_id,
            kind,
            "translated for device"
        );

        let delivery = self.context.send_dp(dp_id, event()).await;
        match forwarded(Plane::Dp, dp_id, delivery) {
            Ok(()) => {
                debug!(
                    event = events::FORWARD_OK,
                    component = COMPONENT,
                    re_id = re_id.as_str(),
                    dp_id,
                    kind,
                    "forwarded to device"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::FORWARD_FAILED,
                    component = COMPONENT,
                    re_id = re_id.as_str(),
                    dp_id,
                    kind,
                    err = %err,
                    "not forwarded to device"
                );
                Err(err)
            }
        }
    }

    /// Hands an audit reply from a router to the waiter of `xid`.
    pub async fn oam_reply(&self, xid: Xid, reply: OamReply) -> Result<(), BrokerError> {
        self.stats.inc("oamreply");
        debug!(
            event = events::OAM_REPLY,
            component = COMPONENT,
            xid,
            re_id = reply.re_id.as_str(),
            "oam reply"
        );
        let source = ReplySource::Vm(reply.re_id.clone());
        self.context
            .waiters()
            .resolve(xid, source, WaiterReply::Oam(reply))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::broker::Broker;
    use crate::config::BrokerConfig;
    use crate::error::BrokerError;
    use crate::message::{
        ActionName, FlowAction, FlowCommand, FlowEntry, FlowMod, PolicyAclFlow, PolicyAclMatch,
        PortCommand, PortConfig, PortStatus,
    };
    use crate::snapshot::NoopSnapshotSink;
    use crate::store::{PortEntry, PortKey, ViewKey};
    use std::sync::Arc;

    async fn bound_broker() -> Broker {
        let broker =
            Broker::new(BrokerConfig::default(), Arc::new(NoopSnapshotSink)).expect("broker");
        let store = broker.context().store();
        store.bind_identity(1234, "1.1.1.1").await.expect("bind");
        store
            .upsert_port(PortEntry::physical(PortKey::new("1.1.1.1", "eth1"), 1234, 5))
            .await;
        broker
    }

    fn port_config(cmd: PortCommand, ifname: &str, port_id: u32) -> PortConfig {
        PortConfig {
            cmd,
            re_id: "1.1.1.1".to_string(),
            ifname: ifname.to_string(),
            port_id,
            dp_port: 0,
            link: None,
            master: None,
            status: PortStatus::Up,
        }
    }

    #[tokio::test]
    async fn hello_requires_a_bound_router() {
        let broker = bound_broker().await;

        assert!(broker.vm().hello("1.1.1.1").await.is_ok());
        assert!(broker
            .vm()
            .hello("9.9.9.9")
            .await
            .is_err_and(|err| err.is_not_found()));
    }

    #[tokio::test]
    async fn physical_port_add_then_delete() {
        let broker = bound_broker().await;
        let store = broker.context().store();
        let key = PortKey::new("1.1.1.1", "eth1");

        broker
            .vm()
            .port_config(port_config(PortCommand::Add, "eth1", 5))
            .await
            .expect("add");
        let entry = store.lookup_by_key(&key).await.expect("entry");
        assert!(entry.vm_view.entered);
        assert_eq!(entry.vm_view.port_id, 5);
        assert!(store.lookup_by_view(&ViewKey::vm("1.1.1.1", 5)).await.is_some());

        broker
            .vm()
            .port_config(port_config(PortCommand::Delete, "eth1", 5))
            .await
            .expect("delete");
        let entry = store.lookup_by_key(&key).await.expect("entry kept");
        assert!(!entry.vm_view.entered);
        assert_eq!(entry.vm_view.port_id, 0);
        assert!(store.lookup_by_view(&ViewKey::vm("1.1.1.1", 5)).await.is_none());
    }

    #[tokio::test]
    async fn unknown_physical_port_is_not_found() {
        let broker = bound_broker().await;

        assert!(broker
            .vm()
            .port_config(port_config(PortCommand::Add, "eth9", 9))
            .await
            .is_err_and(|err| err.is_not_found()));
    }

    #[tokio::test]
    async fn virtual_port_is_created_and_unregistered() {
        let broker = bound_broker().await;
        let store = broker.context().store();
        let mut vlan = port_config(PortCommand::Add, "eth1.10", 20);
        vlan.link = Some("eth1".to_string());

        broker.vm().port_config(vlan.clone()).await.expect("add");
        let entry = store
            .lookup_by_key(&PortKey::new("1.1.1.1", "eth1.10"))
            .await
            .expect("created");
        assert!(entry.is_virtual());
        assert_eq!(entry.parent_key, Some(PortKey::new("1.1.1.1", "eth1")));

        vlan.cmd = PortCommand::Delete;
        broker.vm().port_config(vlan.clone()).await.expect("delete");
        assert!(store
            .lookup_by_key(&PortKey::new("1.1.1.1", "eth1.10"))
            .await
            .is_none());
        assert!(broker
            .vm()
            .port_config(vlan)
            .await
            .is_err_and(|err| err.is_not_found()));
    }

    #[tokio::test]
    async fn nop_command_is_unsupported() {
        let broker = bound_broker().await;

        let err = broker
            .vm()
            .port_config(port_config(PortCommand::Nop, "eth1", 5))
            .await
            .expect_err("nop");
        assert!(matches!(err, BrokerError::Unsupported(_)));
        assert!(!err.is_not_found());
        assert_eq!(
            broker
                .stats()
                .into_iter()
                .find(|entry| entry.group == "vmctl" && entry.name == "portcfg/err")
                .map(|entry| entry.value),
            Some(1)
        );
    }

    #[tokio::test]
    async fn acl_flow_without_in_port_is_skipped() {
        let broker = bound_broker().await;
        let flow_mod = FlowMod {
            cmd: FlowCommand::Add,
            re_id: "1.1.1.1".to_string(),
            entry: FlowEntry::Acl(PolicyAclFlow {
                matches: PolicyAclMatch::default(),
                action: FlowAction {
                    name: ActionName::Output,
                    value: 0,
                },
            }),
        };

        // No device session is connected, so anything forwarded would fail.
        assert!(broker.vm().flow_mod(flow_mod).await.is_ok());
        assert_eq!(
            broker
                .stats()
                .into_iter()
                .find(|entry| entry.group == "vmctl" && entry.name == "flowmod/err")
                .map(|entry| entry.value),
            Some(0)
        );
    }

    #[tokio::test]
    async fn leave_vm_drops_virtual_and_resets_physical_ports() {
        let broker = bound_broker().await;
        let store = broker.context().store();
        let mut vlan = port_config(PortCommand::Add, "eth1.10", 20);
        vlan.link = Some("eth1".to_string());
        broker
            .vm()
            .port_config(port_config(PortCommand::Add, "eth1", 5))
            .await
            .expect("phy");
        broker.vm().port_config(vlan).await.expect("vlan");

        broker.vm().leave_vm("1.1.1.1").await;

        assert!(store
            .lookup_by_key(&PortKey::new("1.1.1.1", "eth1.10"))
            .await
            .is_none());
        let eth1 = store
            .lookup_by_key(&PortKey::new("1.1.1.1", "eth1"))
            .await
            .expect("physical kept");
        assert!(!eth1.vm_view.entered);
        assert_eq!(eth1.vm_view.port_id, 0);
        assert_eq!(eth1.dp_view.map(|view| view.port_id), Some(5));
    }
}
