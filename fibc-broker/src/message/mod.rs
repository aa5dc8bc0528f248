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

//! Decoded message model exchanged with the four planes.
//!
//! Bodies are closed enums. Translation and controller dispatch match on them
//! exhaustively, so a new table or group kind cannot be forwarded without a
//! conversion rule being written for it first.

mod flow;
mod group;
mod monitor;
mod multipart;
mod oam;

pub use flow::{
    ActionName, BridgingFlow, BridgingMatch, FlowAction, FlowCommand, FlowEntry, FlowMod,
    MplsFlow, MplsMatch, PolicyAclFlow, PolicyAclMatch, TermMacFlow, TermMacMatch,
    UnicastRoutingFlow, UnicastRoutingMatch, VlanFlow, VlanMatch,
};
pub use group::{
    GroupCommand, GroupEntry, GroupMod, GroupType, L2InterfaceGroup, L3UnicastGroup,
    MplsInterfaceGroup, MplsLabelGroup,
};
pub use monitor::{ApMonitorEvent, DpMonitorEvent, LogLine, VmMonitorEvent, VsMonitorEvent};
pub use multipart::{
    DevicePort, MultipartReply, MultipartReplyBody, MultipartRequest, MultipartRequestBody,
    PortStats,
};
pub use oam::{OamReply, OamReplyBody, OamRequest, OamRequestBody};

/// Numeric identity of a DP or VS plane instance.
pub type DeviceId = u64;

/// Correlation key linking a forwarded request to its reply.
pub type Xid = u32;

/// Bit set in a device port `state` when the link is down.
pub const PORT_STATE_LINKDOWN: u32 = 0x01;

/// Device kind announced in a DP/VS hello.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DpType {
    Nop,
    Ffvs,
}

/// Operational state carried by port status and port mod messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortStatus {
    Nop,
    Up,
    Down,
}

impl PortStatus {
    /// Derives UP/DOWN from a device port state bitmap.
    pub fn from_device_state(state: u32) -> Self {
        if state & PORT_STATE_LINKDOWN != 0 {
            PortStatus::Down
        } else {
            PortStatus::Up
        }
    }
}

/// Command of a VM port configuration request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortCommand {
    Nop,
    Add,
    Modify,
    Delete,
}

/// Port configuration reported by a router instance.
///
/// `dp_port == 0` and `link == None` describe a physical port; anything else
/// is a virtual port (VLAN, tunnel, bridge, bond member) riding on another one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortConfig {
    pub cmd: PortCommand,
    pub re_id: String,
    pub ifname: String,
    pub port_id: u32,
    pub dp_port: u32,
    pub link: Option<String>,
    pub master: Option<String>,
    pub status: PortStatus,
}

impl PortConfig {
    pub fn is_physical(&self) -> bool {
        self.link.is_none() && self.dp_port == 0
    }
}

/// Learning event reason for an L2 address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum L2AddrReason {
    Nop,
    Add,
    Delete,
}

/// Learned or aged-out L2 address reported by a DP plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct L2Addr {
    pub hw_addr: String,
    pub vlan_vid: u16,
    pub port_id: u32,
    pub reason: L2AddrReason,
    pub ifname: String,
}
