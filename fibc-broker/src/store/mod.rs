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

//! In-memory identity and port binding tables.
//!
//! [`IdMap`] holds the 1:1 router/device bindings, [`PortMap`] the cross-plane
//! port rows. [`IdentityPortStore`] owns one of each and adds configuration
//! reconciliation on top.

mod id_map;
mod port_entry;
mod port_map;
mod reconcile;

pub use id_map::{IdConflict, IdEntry, IdMap, IdReplaceReport};
pub use port_entry::{DevicePortView, PortEntry, PortKey, PortView, VmPortView};
pub use port_map::{PortMap, ViewKey};
pub use reconcile::ReconcileReport;

use crate::message::DeviceId;
use tokio::sync::Mutex;

/// Shared identity/port database of one broker.
#[derive(Default)]
pub struct IdentityPortStore {
    ids: IdMap,
    ports: PortMap,
    reconcile_lock: Mutex<()>,
}

impl IdentityPortStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &IdMap {
        &self.ids
    }

    pub fn ports(&self) -> &PortMap {
        &self.ports
    }

    pub async fn bind_identity(&self, dp_id: DeviceId, re_id: &str) -> Result<bool, IdConflict> {
        self.ids.bind(re_id, dp_id).await
    }

    pub fn lookup_device_by_router(&self, re_id: &str) -> Option<DeviceId> {
        self.ids.device_by_router(re_id)
    }

    pub fn lookup_router_by_device(&self, dp_id: DeviceId) -> Option<String> {
        self.ids.router_by_device(dp_id)
    }

    /// Stores `entry` as a whole, creating it when its key is new.
    pub async fn upsert_port(&self, entry: PortEntry) -> PortEntry {
        let seed = entry.clone();
        self.ports
            .upsert(seed, move |current| {
                *current = entry;
                current.clone()
            })
            .await
    }

    pub async fn lookup_by_key(&self, key: &PortKey) -> Option<PortEntry> {
        self.ports.select(key).await
    }

    pub async fn lookup_by_view(&self, view_key: &ViewKey) -> Option<PortEntry> {
        self.ports.select_by_view(view_key).await
    }

    /// Applies `f` to the entry of `key` as one whole-entry replacement.
    pub async fn update_view<R>(
        &self,
        key: &PortKey,
        f: impl FnOnce(&mut PortEntry) -> R,
    ) -> Option<R> {
        self.ports.update(key, f).await
    }

    pub async fn unregister(&self, key: &PortKey) -> Option<PortEntry> {
        self.ports.unregister(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityPortStore, PortEntry, PortKey, ViewKey};

    #[tokio::test]
    async fn upsert_port_replaces_whole_entry() {
        let store = IdentityPortStore::new();
        let key = PortKey::new("1.1.1.1", "eth1");
        store
            .upsert_port(PortEntry::physical(key.clone(), 1234, 5))
            .await;

        let mut next = PortEntry::physical(key.clone(), 1234, 6);
        next.vm_view.update_port(7);
        let stored = store.upsert_port(next).await;

        assert_eq!(stored.dp_view.as_ref().map(|view| view.port_id), Some(6));
        assert!(store.lookup_by_view(&ViewKey::dp(1234, 5)).await.is_none());
        assert_eq!(
            store
                .lookup_by_view(&ViewKey::vm("1.1.1.1", 7))
                .await
                .map(|entry| entry.key),
            Some(key)
        );
    }

    #[tokio::test]
    async fn update_view_on_missing_key_is_not_found() {
        let store = IdentityPortStore::new();
        let key = PortKey::new("1.1.1.1", "eth9");

        assert!(store
            .update_view(&key, |entry| entry.vm_view.set_entered(true))
            .await
            .is_none());
        assert!(store.unregister(&key).await.is_none());
    }
}
