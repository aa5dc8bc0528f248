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

//! Asynchronous events streamed to each plane over its monitor session.

use super::{
    DeviceId, FlowMod, GroupMod, L2Addr, MultipartRequest, OamRequest, PortStatus, Xid,
};

/// Events delivered to a router instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VmMonitorEvent {
    PortStatus {
        re_id: String,
        port_id: u32,
        ifname: String,
        status: PortStatus,
    },
    L2AddrStatus {
        re_id: String,
        addrs: Vec<L2Addr>,
    },
    OamRequest {
        xid: Xid,
        request: OamRequest,
    },
}

/// Events delivered to a data-plane device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DpMonitorEvent {
    PortMod {
        dp_id: DeviceId,
        port_no: u32,
        status: PortStatus,
    },
    FlowMod(FlowMod),
    GroupMod(GroupMod),
    PacketOut {
        dp_id: DeviceId,
        port_id: u32,
        data: Vec<u8>,
    },
    Multipart {
        xid: Xid,
        request: MultipartRequest,
    },
    OamRequest {
        xid: Xid,
        request: OamRequest,
    },
}

/// Events delivered to a virtual switch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VsMonitorEvent {
    PacketOut {
        vs_id: DeviceId,
        port_id: u32,
        data: Vec<u8>,
    },
    PortMod {
        vs_id: DeviceId,
        port_id: u32,
        status: PortStatus,
    },
}

/// One formatted log record forwarded to administrative monitors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub level: String,
    pub time: String,
    pub line: String,
}

/// Events delivered to an administrative monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApMonitorEvent {
    Log(LogLine),
}
