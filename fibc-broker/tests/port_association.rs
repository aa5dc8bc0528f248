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

mod support;

use fibc_broker::message::{
    DevicePort, DpMonitorEvent, MultipartReply, MultipartReplyBody, PortCommand, PortConfig,
    PortStatus, VmMonitorEvent,
};
use fibc_broker::store::PortKey;
use fibc_broker::translate::Translator;
use fibc_broker::BrokerConfig;
use support::{make_broker, single_leaf, wait_for_events, wait_until, RecordingStream, DP_ID, RE_ID};
use tokio_util::sync::CancellationToken;

fn add_eth1(port_id: u32) -> PortConfig {
    PortConfig {
        cmd: PortCommand::Add,
        re_id: RE_ID.to_string(),
        ifname: "eth1".to_string(),
        port_id,
        dp_port: 0,
        link: None,
        master: None,
        status: PortStatus::Up,
    }
}

fn port_status(events: &[VmMonitorEvent], wanted: PortStatus) -> Option<(u32, String)> {
    events.iter().find_map(|event| match event {
        VmMonitorEvent::PortStatus {
            port_id,
            ifname,
            status,
            ..
        } if *status == wanted => Some((*port_id, ifname.clone())),
        _ => None,
    })
}

fn is_internal_port_desc(event: &DpMonitorEvent) -> bool {
    matches!(event, DpMonitorEvent::Multipart { xid: 0, request } if request.dp_id == DP_ID)
}

#[tokio::test(flavor = "multi_thread")]
async fn device_port_entry_announces_router_port_up() {
    let broker = make_broker(BrokerConfig::default());
    broker.reconcile(&single_leaf()).await;

    broker
        .vm()
        .port_config(add_eth1(5))
        .await
        .expect("configured physical port");
    let key = PortKey::new(RE_ID, "eth1");
    let entry = broker
        .context()
        .store()
        .lookup_by_key(&key)
        .await
        .expect("configured entry");
    assert!(entry.vm_view.entered);
    assert_eq!(entry.vm_view.port_id, 5);
    assert!(!entry.is_associated());

    let vm_stream = RecordingStream::<VmMonitorEvent>::new();
    let dp_stream = RecordingStream::<DpMonitorEvent>::new();
    let vm_transport = CancellationToken::new();
    let dp_transport = CancellationToken::new();

    let vm = broker.vm().clone();
    let vm_monitor = {
        let stream = vm_stream.clone();
        let transport = vm_transport.clone();
        tokio::spawn(async move { vm.monitor(RE_ID, stream, transport).await })
    };
    let vm_sessions = broker.context().vm_sessions();
    assert!(wait_until(move || vm_sessions.contains(RE_ID)).await);

    let dp = broker.dp().clone();
    let dp_monitor = {
        let stream = dp_stream.clone();
        let transport = dp_transport.clone();
        tokio::spawn(async move { dp.monitor(DP_ID, stream, transport).await })
    };
    let requests =
        wait_for_events(&dp_stream, |events| events.iter().any(is_internal_port_desc)).await;
    assert!(requests.iter().any(is_internal_port_desc));

    broker
        .dp()
        .multipart_reply(
            0,
            MultipartReply {
                dp_id: DP_ID,
                body: MultipartReplyBody::PortDesc {
                    internal: true,
                    ports: vec![DevicePort {
                        port_no: 5,
                        hw_addr: "00:11:22:33:44:55".to_string(),
                        name: "eth1".to_string(),
                        state: 0,
                    }],
                },
            },
        )
        .await
        .expect("internal port description consumed");

    let events = wait_for_events(&vm_stream, |events| {
        port_status(events, PortStatus::Up).is_some()
    })
    .await;
    assert_eq!(
        port_status(&events, PortStatus::Up),
        Some((5, "eth1".to_string()))
    );
    assert!(broker.context().waiters().is_empty().await);
    assert_eq!(
        Translator::new(broker.context().store())
            .vm_port_to_dp(RE_ID, 5)
            .await,
        Ok((DP_ID, 5))
    );

    dp_transport.cancel();
    assert!(dp_monitor.await.expect("dp monitor task").is_ok());
    let events = wait_for_events(&vm_stream, |events| {
        port_status(events, PortStatus::Down).is_some()
    })
    .await;
    assert_eq!(
        port_status(&events, PortStatus::Down),
        Some((5, "eth1".to_string()))
    );

    vm_transport.cancel();
    assert!(vm_monitor.await.expect("vm monitor task").is_ok());
}

#[tokio::test]
async fn port_config_for_unconfigured_port_is_not_found() {
    let broker = make_broker(BrokerConfig::default());
    broker.reconcile(&single_leaf()).await;

    let mut config = add_eth1(7);
    config.ifname = "eth7".to_string();

    assert!(broker
        .vm()
        .port_config(config)
        .await
        .is_err_and(|err| err.is_not_found()));
}

#[tokio::test]
async fn reload_keeps_entered_views() {
    let broker = make_broker(BrokerConfig::default());
    broker.reconcile(&single_leaf()).await;
    broker
        .vm()
        .port_config(add_eth1(5))
        .await
        .expect("configured physical port");

    let report = broker.reconcile(&single_leaf()).await;

    assert!(report.removed_ports.is_empty());
    let entry = broker
        .context()
        .store()
        .lookup_by_key(&PortKey::new(RE_ID, "eth1"))
        .await
        .expect("entry survives reload");
    assert!(entry.vm_view.entered);
    assert_eq!(entry.vm_view.port_id, 5);
}
