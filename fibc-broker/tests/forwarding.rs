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
    DpMonitorEvent, FlowCommand, FlowEntry, FlowMod, PortCommand, PortConfig, PortStatus,
    VlanFlow, VlanMatch, VsMonitorEvent,
};
use fibc_broker::BrokerConfig;
use support::{
    make_broker, single_leaf, wait_for_events, wait_until, RecordingStream, DP_ID, RE_ID,
};
use tokio_util::sync::CancellationToken;

const VS_ID: u64 = 99;

fn vlan_flow(in_port: u32) -> FlowMod {
    FlowMod {
        cmd: FlowCommand::Add,
        re_id: RE_ID.to_string(),
        entry: FlowEntry::Vlan(VlanFlow {
            matches: VlanMatch {
                in_port,
                vid: 10,
                vid_mask: 0x1fff,
            },
            actions: Vec::new(),
            goto_table: 20,
        }),
    }
}

/// Binds router port 12 on `eth1`, device port 5.
async fn bound_broker() -> fibc_broker::Broker {
    let broker = make_broker(BrokerConfig::default());
    broker.reconcile(&single_leaf()).await;
    broker
        .vm()
        .port_config(PortConfig {
            cmd: PortCommand::Add,
            re_id: RE_ID.to_string(),
            ifname: "eth1".to_string(),
            port_id: 12,
            dp_port: 0,
            link: None,
            master: None,
            status: PortStatus::Up,
        })
        .await
        .expect("configured physical port");
    broker
}

#[tokio::test(flavor = "multi_thread")]
async fn flow_mod_reaches_the_device_in_its_numbering() {
    let broker = bound_broker().await;
    let stream = RecordingStream::<DpMonitorEvent>::new();
    let transport = CancellationToken::new();
    let dp = broker.dp().clone();
    let monitor = {
        let (stream, transport) = (stream.clone(), transport.clone());
        tokio::spawn(async move { dp.monitor(DP_ID, stream, transport).await })
    };
    let dp_sessions = broker.context().dp_sessions();
    assert!(wait_until(move || dp_sessions.contains("1234")).await);

    broker
        .vm()
        .flow_mod(vlan_flow(12))
        .await
        .expect("flow forwarded");

    let events = wait_for_events(&stream, |events| {
        events
            .iter()
            .any(|event| matches!(event, DpMonitorEvent::FlowMod(_)))
    })
    .await;
    let forwarded = events.iter().find_map(|event| match event {
        DpMonitorEvent::FlowMod(flow_mod) => Some(flow_mod.clone()),
        _ => None,
    });
    assert_eq!(forwarded, Some(vlan_flow(5)));

    transport.cancel();
    assert!(monitor.await.expect("monitor task").is_ok());
}

#[tokio::test]
async fn flow_mod_without_device_session_is_not_found() {
    let broker = bound_broker().await;

    assert!(broker
        .vm()
        .flow_mod(vlan_flow(12))
        .await
        .is_err_and(|err| err.is_not_found()));
}

#[tokio::test]
async fn flow_mod_on_unknown_router_port_fails() {
    let broker = bound_broker().await;

    let result = broker.vm().flow_mod(vlan_flow(13)).await;

    assert!(result.is_err_and(|err| err.is_not_found()));
}

#[tokio::test(flavor = "multi_thread")]
async fn device_packets_and_port_state_reach_the_virtual_switch() {
    let broker = bound_broker().await;
    assert!(broker
        .vs()
        .hello(VS_ID, fibc_broker::message::DpType::Ffvs)
        .await
        .is_ok());

    let stream = RecordingStream::<VsMonitorEvent>::new();
    let transport = CancellationToken::new();
    let vs = broker.vs().clone();
    let monitor = {
        let (stream, transport) = (stream.clone(), transport.clone());
        tokio::spawn(async move { vs.monitor(VS_ID, stream, transport).await })
    };
    let vs_sessions = broker.context().vs_sessions();
    assert!(wait_until(move || vs_sessions.contains("99")).await);

    // Unknown until the virtual switch discovers the port.
    assert!(broker
        .dp()
        .packet_in(DP_ID, 5, vec![0xaa])
        .await
        .is_err_and(|err| err.is_not_found()));

    broker
        .vs()
        .ff_packet(VS_ID, 3, RE_ID, "eth1")
        .await
        .expect("vs port discovered");
    broker
        .dp()
        .packet_in(DP_ID, 5, vec![0xaa, 0xbb])
        .await
        .expect("packet relayed");
    broker
        .dp()
        .port_status(DP_ID, 5, 1)
        .await
        .expect("port state relayed");

    let events = wait_for_events(&stream, |events| events.len() >= 2).await;
    assert_eq!(
        events,
        vec![
            VsMonitorEvent::PacketOut {
                vs_id: VS_ID,
                port_id: 3,
                data: vec![0xaa, 0xbb],
            },
            VsMonitorEvent::PortMod {
                vs_id: VS_ID,
                port_id: 3,
                status: PortStatus::Down,
            },
        ]
    );

    transport.cancel();
    assert!(monitor.await.expect("monitor task").is_ok());
}
