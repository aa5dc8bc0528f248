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

use super::{TranslateResult, Translator};
use crate::message::{DeviceId, GroupEntry, GroupMod};

impl Translator<'_> {
    /// Rewrites the VM-numbered ports of a group mod in place and returns the
    /// device it must be sent to. Nothing is written back unless every port
    /// of the group converted.
    pub async fn group_mod_to_dp(&self, group_mod: &mut GroupMod) -> TranslateResult<DeviceId> {
        let dp_id = self.router_to_device(&group_mod.re_id)?;
        let re_id = group_mod.re_id.as_str();

        match &mut group_mod.entry {
            GroupEntry::L2Iface(group) => {
                let (_, port_id) = self.vm_port_to_dp(re_id, group.port_id).await?;
                let (_, master) = self.vm_port_to_dp(re_id, group.master).await?;
                group.port_id = port_id;
                group.master = master;
            }
            GroupEntry::L3Unicast(group) => {
                let (_, port_id) = self.vm_port_to_dp(re_id, group.port_id).await?;
                let (_, phy_port_id) = self.vm_port_to_dp(re_id, group.phy_port_id).await?;
                group.port_id = port_id;
                group.phy_port_id = phy_port_id;
            }
            GroupEntry::MplsIface(group) => {
                let (_, port_id) = self.vm_port_to_dp(re_id, group.port_id).await?;
                group.port_id = port_id;
            }
            GroupEntry::MplsLabel(_) => {}
        }
        Ok(dp_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::message::{
        GroupCommand, GroupEntry, GroupMod, GroupType, L2InterfaceGroup, L3UnicastGroup,
        MplsLabelGroup,
    };
    use crate::translate::tests::bound_store;
    use crate::translate::Translator;

    fn group_mod(entry: GroupEntry) -> GroupMod {
        GroupMod {
            cmd: GroupCommand::Add,
            re_id: "1.1.1.1".to_string(),
            entry,
        }
    }

    #[tokio::test]
    async fn l2_interface_port_and_master_are_rewritten() {
        let store = bound_store().await;
        let mut msg = group_mod(GroupEntry::L2Iface(L2InterfaceGroup {
            port_id: 12,
            vlan_vid: 10,
            vlan_translation: false,
            master: 5,
        }));

        assert_eq!(Translator::new(&store).group_mod_to_dp(&mut msg).await, Ok(1234));
        assert_eq!(
            msg.entry,
            GroupEntry::L2Iface(L2InterfaceGroup {
                port_id: 6,
                vlan_vid: 10,
                vlan_translation: false,
                master: 5,
            })
        );
    }

    #[tokio::test]
    async fn partial_failure_leaves_the_group_untouched() {
        let store = bound_store().await;
        let original = GroupEntry::L3Unicast(L3UnicastGroup {
            port_id: 12,
            phy_port_id: 99,
            ..L3UnicastGroup::default()
        });
        let mut msg = group_mod(original.clone());

        assert!(Translator::new(&store)
            .group_mod_to_dp(&mut msg)
            .await
            .is_err_and(|err| err.is_not_found()));
        assert_eq!(msg.entry, original);
    }

    #[tokio::test]
    async fn mpls_label_groups_pass_through() {
        let store = bound_store().await;
        let entry = GroupEntry::MplsLabel(MplsLabelGroup {
            dst_id: 1,
            new_label: 100,
            ne_id: 2,
            g_type: GroupType::MplsSwap,
        });
        let mut msg = group_mod(entry.clone());

        assert_eq!(Translator::new(&store).group_mod_to_dp(&mut msg).await, Ok(1234));
        assert_eq!(msg.entry, entry);
    }
}
