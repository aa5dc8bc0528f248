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

//! Shared broker state and the façade handed to transport adapters.

use crate::config::{BrokerConfig, FabricConfig, FabricConfigSource};
use crate::controllers::{ap, dp, vm, vs, ApController, DpController, VmController, VsController};
use crate::correlation::WaiterTable;
use crate::error::BrokerError;
use crate::message::{
    ApMonitorEvent, DeviceId, DpMonitorEvent, PortStatus, VmMonitorEvent, VsMonitorEvent,
};
use crate::observability::{events, ApLogLayer};
use crate::plane::Plane;
use crate::session::{Delivery, SessionSet};
use crate::snapshot::PortSnapshotSink;
use crate::stats::{StatsEntry, StatsGroup, StatsTable};
use crate::store::{IdentityPortStore, PortEntry, PortKey, ReconcileReport};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "broker";

pub(crate) const STATS_GROUP: &str = "broker";
pub(crate) const STATS_COUNTERS: &[&str] = &[
    "reconcile",
    "reload",
    "reload/err",
    "delivery/dropped",
    "portstatus/up",
    "portstatus/down",
    "portstatus/skip",
];

/// State shared by every controller of one broker.
pub struct BrokerContext {
    config: BrokerConfig,
    store: IdentityPortStore,
    waiters: WaiterTable,
    ap_sessions: Arc<SessionSet<ApMonitorEvent>>,
    vm_sessions: SessionSet<VmMonitorEvent>,
    dp_sessions: SessionSet<DpMonitorEvent>,
    vs_sessions: SessionSet<VsMonitorEvent>,
    stats: StatsTable,
    counters: Arc<StatsGroup>,
    snapshot_sink: Arc<dyn PortSnapshotSink>,
}

impl BrokerContext {
    fn new(
        config: BrokerConfig,
        mut stats: StatsTable,
        snapshot_sink: Arc<dyn PortSnapshotSink>,
    ) -> Self {
        let queue_size = config.message_queue_size;
        let counters = stats.register(STATS_GROUP, STATS_COUNTERS);
        Self {
            store: IdentityPortStore::new(),
            waiters: WaiterTable::new(),
            ap_sessions: Arc::new(SessionSet::new(Plane::Ap, queue_size)),
            vm_sessions: SessionSet::new(Plane::Vm, queue_size),
            dp_sessions: SessionSet::new(Plane::Dp, queue_size),
            vs_sessions: SessionSet::new(Plane::Vs, queue_size),
            config,
            stats,
            counters,
            snapshot_sink,
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn store(&self) -> &IdentityPortStore {
        &self.store
    }

    pub fn waiters(&self) -> &WaiterTable {
        &self.waiters
    }

    pub fn ap_sessions(&self) -> &Arc<SessionSet<ApMonitorEvent>> {
        &self.ap_sessions
    }

    pub fn vm_sessions(&self) -> &SessionSet<VmMonitorEvent> {
        &self.vm_sessions
    }

    pub fn dp_sessions(&self) -> &SessionSet<DpMonitorEvent> {
        &self.dp_sessions
    }

    pub fn vs_sessions(&self) -> &SessionSet<VsMonitorEvent> {
        &self.vs_sessions
    }

    pub fn stats(&self) -> &StatsTable {
        &self.stats
    }

    pub(crate) fn snapshot_sink(&self) -> &dyn PortSnapshotSink {
        self.snapshot_sink.as_ref()
    }

    fn account(&self, delivery: Delivery) -> Delivery {
        if !delivery.is_delivered() {
            self.counters.inc("delivery/dropped");
        }
        delivery
    }

    pub async fn send_vm(&self, re_id: &str, event: VmMonitorEvent) -> Delivery {
        self.account(self.vm_sessions.send(re_id, event).await)
    }

    pub async fn send_dp(&self, dp_id: DeviceId, event: DpMonitorEvent) -> Delivery {
        self.account(self.dp_sessions.send(&dp_id.to_string(), event).await)
    }

    pub async fn send_vs(&self, vs_id: DeviceId, event: VsMonitorEvent) -> Delivery {
        self.account(self.vs_sessions.send(&vs_id.to_string(), event).await)
    }

    /// Pushes a port status to the router owning `key`.
    ///
    /// UP is only pushed once the physical port behind `key` is associated;
    /// `None` means it was withheld. DOWN is always pushed.
    pub async fn send_vm_port_status(
        &self,
        key: &PortKey,
        port_id: u32,
        status: PortStatus,
    ) -> Option<Delivery> {
        let associated = self.store.ports().is_associated(key).await == Some(true);
        if status != PortStatus::Down && !associated {
            self.counters.inc("portstatus/skip");
            debug!(
                event = events::PORT_STATUS_NOT_ASSOCIATED,
                component = COMPONENT,
                port_key = %key,
                port_id,
                "port not associated, status withheld"
            );
            return None;
        }

        match status {
            PortStatus::Down => self.counters.inc("portstatus/down"),
            _ => self.counters.inc("portstatus/up"),
        }
        info!(
            event = events::PORT_STATUS_SEND,
            component = COMPONENT,
            port_key = %key,
            port_id,
            status = ?status,
            "port status"
        );
        let event = VmMonitorEvent::PortStatus {
            re_id: key.re_id.clone(),
            port_id,
            ifname: key.ifname.clone(),
            status,
        };
        Some(self.send_vm(&key.re_id, event).await)
    }

    /// Pushes `status` for `entry` and for every port riding on it.
    pub async fn send_vm_port_status_all(&self, entry: &PortEntry, status: PortStatus) {
        let mut targets = vec![(entry.key.clone(), entry.vm_view.port_id)];
        targets.extend(
            self.store
                .ports()
                .list_by_parent(&entry.key)
                .await
                .into_iter()
                .map(|child| (child.key, child.vm_view.port_id)),
        );

        for (key, port_id) in targets {
            self.send_vm_port_status(&key, port_id, status).await;
        }
    }
}

/// Maps a forwarding outcome to the caller-facing result.
pub(crate) fn forwarded(
    plane: Plane,
    entry_id: impl ToString,
    delivery: Delivery,
) -> Result<(), BrokerError> {
    match delivery {
        Delivery::Delivered => Ok(()),
        Delivery::Dropped(reason) => Err(BrokerError::Undelivered {
            plane,
            entry_id: entry_id.to_string(),
            reason,
        }),
    }
}

/// Entry point of the library: owns the shared context and one controller
/// per plane.
pub struct Broker {
    context: Arc<BrokerContext>,
    ap: ApController,
    vm: VmController,
    dp: DpController,
    vs: VsController,
}

impl Broker {
    pub fn new(
        config: BrokerConfig,
        snapshot_sink: Arc<dyn PortSnapshotSink>,
    ) -> Result<Self, BrokerError> {
        config.validate()?;

        let mut stats = StatsTable::new();
        let ap_stats = stats.register(ap::STATS_GROUP, ap::STATS_COUNTERS);
        let vm_stats = stats.register(vm::STATS_GROUP, vm::STATS_COUNTERS);
        let dp_stats = stats.register(dp::STATS_GROUP, dp::STATS_COUNTERS);
        let vs_stats = stats.register(vs::STATS_GROUP, vs::STATS_COUNTERS);
        let context = Arc::new(BrokerContext::new(config, stats, snapshot_sink));

        info!(
            event = events::BROKER_START,
            component = COMPONENT,
            message_queue_size = context.config().message_queue_size,
            "broker created"
        );
        Ok(Self {
            ap: ApController::new(Arc::clone(&context), ap_stats),
            vm: VmController::new(Arc::clone(&context), vm_stats),
            dp: DpController::new(Arc::clone(&context), dp_stats),
            vs: VsController::new(Arc::clone(&context), vs_stats),
            context,
        })
    }

    pub fn context(&self) -> &Arc<BrokerContext> {
        &self.context
    }

    pub fn ap(&self) -> &ApController {
        &self.ap
    }

    pub fn vm(&self) -> &VmController {
        &self.vm
    }

    pub fn dp(&self) -> &DpController {
        &self.dp
    }

    pub fn vs(&self) -> &VsController {
        &self.vs
    }

    /// Layer forwarding log records to the AP monitor sessions of this broker.
    pub fn ap_log_layer(&self) -> ApLogLayer {
        ApLogLayer::new(Arc::clone(self.context.ap_sessions()))
    }

    pub async fn reconcile(&self, config: &FabricConfig) -> ReconcileReport {
        self.context.counters.inc("reconcile");
        self.context.store().reconcile(config).await
    }

    /// Fetches the fabric configuration from `source` and reconciles it.
    pub async fn reload(
        &self,
        source: &dyn FabricConfigSource,
    ) -> Result<ReconcileReport, BrokerError> {
        self.context.counters.inc("reload");
        let config = match source.fetch_config().await {
            Ok(config) => config,
            Err(err) => {
                self.context.counters.inc("reload/err");
                warn!(
                    event = events::RELOAD_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "fabric configuration not loaded"
                );
                return Err(err.into());
            }
        };
        Ok(self.reconcile(&config).await)
    }

    pub fn stats(&self) -> Vec<StatsEntry> {
        self.context.stats().entries()
    }
}

#[cfg(test)]
mod tests {
    use super::{forwarded, Broker};
    use crate::config::{BrokerConfig, FabricConfig, FabricConfigSource};
    use crate::error::ConfigError;
    use crate::message::{PortStatus, VmMonitorEvent};
    use crate::plane::Plane;
    use crate::session::{Delivery, DropReason, MonitorStream, StreamError};
    use crate::snapshot::NoopSnapshotSink;
    use crate::store::{PortEntry, PortKey};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    struct FailingSource;

    #[async_trait]
    impl FabricConfigSource for FailingSource {
        async fn fetch_config(&self) -> Result<FabricConfig, ConfigError> {
            Err(ConfigError::new("unreadable"))
        }
    }

    #[derive(Default)]
    struct Sink {
        events: Mutex<Vec<VmMonitorEvent>>,
    }

    #[async_trait]
    impl MonitorStream<VmMonitorEvent> for Sink {
        async fn send(&self, event: VmMonitorEvent) -> Result<(), StreamError> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    fn broker() -> Broker {
        Broker::new(BrokerConfig::default(), Arc::new(NoopSnapshotSink)).expect("broker")
    }

    #[test]
    fn zero_queue_size_is_rejected() {
        let config = BrokerConfig {
            message_queue_size: 0,
            ..BrokerConfig::default()
        };

        assert!(Broker::new(config, Arc::new(NoopSnapshotSink)).is_err());
    }

    #[test]
    fn every_controller_group_is_registered() {
        let groups: Vec<String> = broker()
            .stats()
            .into_iter()
            .map(|entry| entry.group)
            .collect();

        for group in ["apctl", "broker", "dpctl", "vmctl", "vsctl"] {
            assert!(groups.iter().any(|name| name == group), "missing {group}");
        }
    }

    #[test]
    fn dropped_forward_becomes_undelivered() {
        assert!(forwarded(Plane::Dp, 1234u64, Delivery::Delivered).is_ok());
        assert!(forwarded(Plane::Dp, 1234u64, Delivery::Dropped(DropReason::NoSession))
            .is_err_and(|err| err.is_not_found()));
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_store() {
        let broker = broker();
        broker
            .context()
            .store()
            .bind_identity(1234, "1.1.1.1")
            .await
            .expect("bind");

        assert!(broker.reload(&FailingSource).await.is_err());
        assert_eq!(
            broker.context().store().lookup_device_by_router("1.1.1.1"),
            Some(1234)
        );
    }

    #[tokio::test]
    async fn up_status_waits_for_association_but_down_does_not() {
        let broker = broker();
        let context = broker.context();
        let key = PortKey::new("1.1.1.1", "eth1");
        context
            .store()
            .upsert_port(PortEntry::physical(key.clone(), 1234, 5))
            .await;
        let sink = Arc::new(Sink::default());
        context
            .vm_sessions()
            .open("1.1.1.1", sink, &CancellationToken::new())
            .await
            .expect("session");

        assert_eq!(
            context.send_vm_port_status(&key, 5, PortStatus::Up).await,
            None
        );
        assert_eq!(
            context.send_vm_port_status(&key, 5, PortStatus::Down).await,
            Some(Delivery::Delivered)
        );
    }
}
