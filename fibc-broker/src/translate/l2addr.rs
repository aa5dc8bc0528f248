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
use crate::message::{DeviceId, L2Addr};
use crate::observability::events;
use tracing::warn;

const COMPONENT: &str = "translate_l2addr";

impl Translator<'_> {
    /// Converts L2 addresses learned on `dp_id` to the owning router's
    /// numbering. Addresses on unbound DP ports are skipped.
    pub async fn l2addrs_to_vm(
        &self,
        dp_id: DeviceId,
        addrs: Vec<L2Addr>,
    ) -> TranslateResult<(String, Vec<L2Addr>)> {
        let re_id = self.device_to_router(dp_id)?;

        let mut converted = Vec::with_capacity(addrs.len());
        for mut addr in addrs {
            match self.dp_port_entry(dp_id, addr.port_id).await {
                Ok(entry) => {
                    addr.port_id = entry.vm_view.port_id;
                    addr.ifname = entry.key.ifname;
                    converted.push(addr);
                }
                Err(err) => {
                    warn!(
                        event = events::TRANSLATE_L2ADDR_SKIPPED,
                        component = COMPONENT,
                        dp_id,
                        port_id = addr.port_id,
                        hw_addr = addr.hw_addr.as_str(),
                        err = %err,
                        "l2 address skipped"
                    );
                }
            }
        }
        Ok((re_id, converted))
    }
}

#[cfg(test)]
mod tests {
    use crate::message::{L2Addr, L2AddrReason};
    use crate::translate::tests::bound_store;
    use crate::translate::Translator;

    fn learned(port_id: u32) -> L2Addr {
        L2Addr {
            hw_addr: "00:11:22:33:44:55".to_string(),
            vlan_vid: 10,
            port_id,
            reason: L2AddrReason::Add,
            ifname: String::new(),
        }
    }

    #[tokio::test]
    async fn addresses_get_vm_port_and_ifname() {
        let store = bound_store().await;

        let (re_id, addrs) = Translator::new(&store)
            .l2addrs_to_vm(1234, vec![learned(6), learned(42), learned(5)])
            .await
            .expect("device bound");

        assert_eq!(re_id, "1.1.1.1");
        assert_eq!(addrs.len(), 2);
        assert_eq!((addrs[0].port_id, addrs[0].ifname.as_str()), (12, "eth2"));
        assert_eq!((addrs[1].port_id, addrs[1].ifname.as_str()), (5, "eth1"));
    }

    #[tokio::test]
    async fn unbound_device_is_not_found() {
        let store = bound_store().await;

        assert!(Translator::new(&store)
            .l2addrs_to_vm(9, vec![learned(5)])
            .await
            .is_err_and(|err| err.is_not_found()));
    }
}
