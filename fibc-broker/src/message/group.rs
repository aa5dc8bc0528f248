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

//! Group programming messages.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupCommand {
    Nop,
    Add,
    Modify,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupType {
    All,
    L2Interface,
    L3Unicast,
    L3Ecmp,
    MplsInterface,
    MplsL2Vpn,
    MplsSwap,
    MplsTunnel1,
    MplsTunnel2,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct L2InterfaceGroup {
    pub port_id: u32,
    pub vlan_vid: u32,
    pub vlan_translation: bool,
    /// Link-aggregation master, `0` when the port is not enslaved.
    pub master: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct L3UnicastGroup {
    pub ne_id: u32,
    pub port_id: u32,
    pub vlan_vid: u32,
    pub eth_dst: String,
    pub eth_src: String,
    /// Physical port under a tunnel or bond interface.
    pub phy_port_id: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MplsInterfaceGroup {
    pub ne_id: u32,
    pub port_id: u32,
    pub vlan_vid: u32,
    pub eth_dst: String,
    pub eth_src: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MplsLabelGroup {
    pub dst_id: u32,
    pub new_label: u32,
    pub ne_id: u32,
    pub g_type: GroupType,
}

/// Kind-specific body of a group mod.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupEntry {
    L2Iface(L2InterfaceGroup),
    L3Unicast(L3UnicastGroup),
    MplsIface(MplsInterfaceGroup),
    MplsLabel(MplsLabelGroup),
}

impl GroupEntry {
    pub fn group_name(&self) -> &'static str {
        match self {
            GroupEntry::L2Iface(_) => "l2_iface",
            GroupEntry::L3Unicast(_) => "l3_unicast",
            GroupEntry::MplsIface(_) => "mpls_iface",
            GroupEntry::MplsLabel(_) => "mpls_label",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMod {
    pub cmd: GroupCommand,
    pub re_id: String,
    pub entry: GroupEntry,
}
