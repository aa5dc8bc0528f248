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

//! Structured field values shared by log events.

use crate::message::{FlowMod, GroupMod};

pub const REASON_NO_SESSION: &str = "no_session";
pub const REASON_INACTIVE: &str = "inactive";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";
pub const REASON_QUEUE_FULL: &str = "queue_full";
pub const REASON_CANCELLED: &str = "cancelled";
pub const REASON_STREAM_FAILED: &str = "stream_failed";

/// Identity of one monitor session carried on every delivery event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionContext {
    pub plane: &'static str,
    pub entry_id: String,
    pub session_id: String,
}

impl SessionContext {
    pub fn new(
        plane: &'static str,
        entry_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            plane,
            entry_id: entry_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// `kind` field of a flow mod, `flow/<table>`.
pub fn format_flow_kind(flow_mod: &FlowMod) -> String {
    format!("flow/{}", flow_mod.entry.table_name())
}

pub fn format_group_kind(group_mod: &GroupMod) -> String {
    format!("group/{}", group_mod.entry.group_name())
}

#[cfg(test)]
mod tests {
    use super::{format_flow_kind, format_group_kind};
    use crate::message::{
        ActionName, BridgingFlow, BridgingMatch, FlowAction, FlowCommand, FlowEntry, FlowMod,
        GroupCommand, GroupEntry, GroupMod, L2InterfaceGroup,
    };

    #[test]
    fn format_kinds_are_prefixed_by_family() {
        let flow_mod = FlowMod {
            cmd: FlowCommand::Add,
            re_id: "1.1.1.1".to_string(),
            entry: FlowEntry::Bridging(BridgingFlow {
                matches: BridgingMatch::default(),
                action: FlowAction {
                    name: ActionName::Output,
                    value: 1,
                },
            }),
        };
        let group_mod = GroupMod {
            cmd: GroupCommand::Add,
            re_id: "1.1.1.1".to_string(),
            entry: GroupEntry::L2Iface(L2InterfaceGroup::default()),
        };

        assert_eq!(format_flow_kind(&flow_mod), "flow/bridging");
        assert_eq!(format_group_kind(&group_mod), "group/l2_iface");
    }
}
