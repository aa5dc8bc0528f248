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

use super::{TranslateError, TranslateResult, Translator};
use crate::message::{ActionName, DeviceId, FlowEntry, FlowMod};

impl Translator<'_> {
    async fn vm_to_dp_port(&self, re_id: &str, port_id: u32) -> TranslateResult<u32> {
        self.vm_port_to_dp(re_id, port_id)
            .await
            .map(|(_, dp_port)| dp_port)
    }

    /// Rewrites the VM-numbered ports of a flow mod in place and returns the
    /// device it must be sent to.
    pub async fn flow_mod_to_dp(&self, flow_mod: &mut FlowMod) -> TranslateResult<DeviceId> {
        let dp_id = self.router_to_device(&flow_mod.re_id)?;
        let re_id = flow_mod.re_id.as_str();

        match &mut flow_mod.entry {
            FlowEntry::Vlan(flow) => {
                flow.matches.in_port = self.vm_to_dp_port(re_id, flow.matches.in_port).await?;
            }
            FlowEntry::TermMac(flow) => {
                flow.matches.in_port = self.vm_to_dp_port(re_id, flow.matches.in_port).await?;
            }
            FlowEntry::Mpls1(_) | FlowEntry::Unicast(_) => {}
            FlowEntry::Bridging(flow) => {
                if flow.action.name == ActionName::Output && flow.action.value != 0 {
                    flow.action.value = self.vm_to_dp_port(re_id, flow.action.value).await?;
                }
            }
            FlowEntry::Acl(flow) => {
                // Rules without an in-port are not pushed to devices.
                if flow.matches.in_port == 0 {
                    return Err(TranslateError::NoEffect);
                }
                flow.matches.in_port = self.vm_to_dp_port(re_id, flow.matches.in_port).await?;
            }
        }
        Ok(dp_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::message::{
        ActionName, BridgingFlow, BridgingMatch, FlowAction, FlowCommand, FlowEntry, FlowMod,
        GroupType, PolicyAclFlow, PolicyAclMatch, UnicastRoutingFlow, UnicastRoutingMatch,
        VlanFlow, VlanMatch,
    };
    use crate::translate::tests::bound_store;
    use crate::translate::{TranslateError, Translator};

    fn flow_mod(entry: FlowEntry) -> FlowMod {
        FlowMod {
            cmd: FlowCommand::Add,
            re_id: "1.1.1.1".to_string(),
            entry,
        }
    }

    fn output(value: u32) -> FlowAction {
        FlowAction {
            name: ActionName::Output,
            value,
        }
    }

    #[tokio::test]
    async fn vlan_in_port_is_rewritten() {
        let store = bound_store().await;
        let mut msg = flow_mod(FlowEntry::Vlan(VlanFlow {
            matches: VlanMatch {
                in_port: 12,
                vid: 10,
                vid_mask: 0x1fff,
            },
            actions: Vec::new(),
            goto_table: 20,
        }));

        assert_eq!(Translator::new(&store).flow_mod_to_dp(&mut msg).await, Ok(1234));
        let FlowEntry::Vlan(flow) = &msg.entry else {
            panic!("entry kind changed");
        };
        assert_eq!(flow.matches.in_port, 6);
        assert_eq!(flow.matches.vid, 10);
    }

    #[tokio::test]
    async fn bridging_output_zero_is_left_alone() {
        let store = bound_store().await;
        let translator = Translator::new(&store);
        let mut flood = flow_mod(FlowEntry::Bridging(BridgingFlow {
            matches: BridgingMatch::default(),
            action: output(0),
        }));
        let mut unicast = flow_mod(FlowEntry::Bridging(BridgingFlow {
            matches: BridgingMatch::default(),
            action: output(12),
        }));

        assert!(translator.flow_mod_to_dp(&mut flood).await.is_ok());
        assert!(translator.flow_mod_to_dp(&mut unicast).await.is_ok());
        assert_eq!(
            unicast.entry,
            FlowEntry::Bridging(BridgingFlow {
                matches: BridgingMatch::default(),
                action: output(6),
            })
        );
    }

    #[tokio::test]
    async fn acl_without_in_port_has_no_effect() {
        let store = bound_store().await;
        let translator = Translator::new(&store);
        let mut any_port = flow_mod(FlowEntry::Acl(PolicyAclFlow {
            matches: PolicyAclMatch::default(),
            action: output(0),
        }));
        let mut unknown_port = flow_mod(FlowEntry::Acl(PolicyAclFlow {
            matches: PolicyAclMatch {
                in_port: 77,
                ..PolicyAclMatch::default()
            },
            action: output(0),
        }));

        assert_eq!(
            translator.flow_mod_to_dp(&mut any_port).await,
            Err(TranslateError::NoEffect)
        );
        assert!(translator
            .flow_mod_to_dp(&mut unknown_port)
            .await
            .is_err_and(|err| err.is_not_found()));
    }

    #[tokio::test]
    async fn routing_tables_only_need_the_device() {
        let store = bound_store().await;
        let translator = Translator::new(&store);
        let entry = FlowEntry::Unicast(UnicastRoutingFlow {
            matches: UnicastRoutingMatch {
                ip_dst: "10.0.0.0/24".to_string(),
                vrf: 0,
            },
            action: None,
            g_type: GroupType::L3Unicast,
            g_id: 3,
        });
        let mut msg = flow_mod(entry.clone());

        assert_eq!(translator.flow_mod_to_dp(&mut msg).await, Ok(1234));
        assert_eq!(msg.entry, entry);

        msg.re_id = "9.9.9.9".to_string();
        assert!(translator.flow_mod_to_dp(&mut msg).await.is_err());
    }
}
