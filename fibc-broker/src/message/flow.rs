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

//! Flow-table programming messages.

use super::GroupType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowCommand {
    Nop,
    Add,
    Modify,
    ModifyStrict,
    Delete,
    DeleteStrict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionName {
    Nop,
    SetVrf,
    PushVlan,
    PopVlan,
    SetVlanVid,
    PopMpls,
    Output,
    CopyTtlOut,
    DecTtl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlowAction {
    pub name: ActionName,
    pub value: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VlanMatch {
    pub in_port: u32,
    pub vid: u32,
    pub vid_mask: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VlanFlow {
    pub matches: VlanMatch,
    pub actions: Vec<FlowAction>,
    pub goto_table: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermMacMatch {
    pub in_port: u32,
    pub eth_type: u32,
    pub eth_dst: String,
    pub vlan_vid: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermMacFlow {
    pub matches: TermMacMatch,
    pub actions: Vec<FlowAction>,
    pub goto_table: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MplsMatch {
    pub label: u32,
    pub bos: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MplsFlow {
    pub matches: MplsMatch,
    pub actions: Vec<FlowAction>,
    pub g_type: GroupType,
    pub g_id: u32,
    pub goto_table: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnicastRoutingMatch {
    pub ip_dst: String,
    pub vrf: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnicastRoutingFlow {
    pub matches: UnicastRoutingMatch,
    pub action: Option<FlowAction>,
    pub g_type: GroupType,
    pub g_id: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgingMatch {
    pub eth_dst: String,
    pub vlan_vid: u16,
    pub tunnel_id: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgingFlow {
    pub matches: BridgingMatch,
    pub action: FlowAction,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyAclMatch {
    pub ip_dst: String,
    pub vrf: u32,
    pub eth_type: u32,
    pub ip_proto: u32,
    pub tp_src: u32,
    pub tp_dst: u32,
    pub in_port: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyAclFlow {
    pub matches: PolicyAclMatch,
    pub action: FlowAction,
}

/// Table-specific body of a flow mod.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowEntry {
    Vlan(VlanFlow),
    TermMac(TermMacFlow),
    Mpls1(MplsFlow),
    Unicast(UnicastRoutingFlow),
    Bridging(BridgingFlow),
    Acl(PolicyAclFlow),
}

impl FlowEntry {
    pub fn table_name(&self) -> &'static str {
        match self {
            FlowEntry::Vlan(_) => "vlan",
            FlowEntry::TermMac(_) => "term_mac",
            FlowEntry::Mpls1(_) => "mpls1",
            FlowEntry::Unicast(_) => "unicast",
            FlowEntry::Bridging(_) => "bridging",
            FlowEntry::Acl(_) => "acl",
        }
    }
}

/// Flow programming request issued by a router instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowMod {
    pub cmd: FlowCommand,
    pub re_id: String,
    pub entry: FlowEntry,
}
