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

//! Port binding table with reverse indexes per plane view.

use crate::message::DeviceId;
use crate::observability::events;
use crate::store::port_entry::{PortEntry, PortKey};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const COMPONENT: &str = "port_map";
const MAX_PARENT_DEPTH: usize = 16;

/// Address of a port in one plane's numbering domain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewKey {
    Vm { re_id: String, port_id: u32 },
    Dp { dp_id: DeviceId, port_id: u32 },
    Vs { vs_id: DeviceId, port_id: u32 },
}

impl ViewKey {
    pub fn vm(re_id: impl Into<String>, port_id: u32) -> Self {
        ViewKey::Vm {
            re_id: re_id.into(),
            port_id,
        }
    }

    pub fn dp(dp_id: DeviceId, port_id: u32) -> Self {
        ViewKey::Dp { dp_id, port_id }
    }

    pub fn vs(vs_id: DeviceId, port_id: u32) -> Self {
        ViewKey::Vs { vs_id, port_id }
    }
}

#[derive(Default)]
struct PortMapInner {
    entries: HashMap<PortKey, PortEntry>,
    vm_index: HashMap<(String, u32), PortKey>,
    dp_index: HashMap<(DeviceId, u32), PortKey>,
    vs_index: HashMap<(DeviceId, u32), PortKey>,
    version: u64,
}

impl PortMapInner {
    fn index(&mut self, entry: &PortEntry) {
        if entry.vm_view.is_bound() {
            self.vm_index.insert(
                (entry.vm_view.id.clone(), entry.vm_view.port_id),
                entry.key.clone(),
            );
        }
        if let Some(view) = entry.dp_view.as_ref().filter(|view| view.is_bound()) {
            self.dp_index
                .insert((view.id, view.port_id), entry.key.clone());
        }
        if let Some(view) = entry.vs_view.as_ref().filter(|view| view.is_bound()) {
            self.vs_index
                .insert((view.id, view.port_id), entry.key.clone());
        }
    }

    // Index slots may have been taken over by another entry since; leave those.
    fn unindex(&mut self, entry: &PortEntry) {
        let vm_slot = (entry.vm_view.id.clone(), entry.vm_view.port_id);
        if self.vm_index.get(&vm_slot) == Some(&entry.key) {
            self.vm_index.remove(&vm_slot);
        }
        if let Some(view) = entry.dp_view.as_ref() {
            let slot = (view.id, view.port_id);
            if self.dp_index.get(&slot) == Some(&entry.key) {
                self.dp_index.remove(&slot);
            }
        }
        if let Some(view) = entry.vs_view.as_ref() {
            let slot = (view.id, view.port_id);
            if self.vs_index.get(&slot) == Some(&entry.key) {
                self.vs_index.remove(&slot);
            }
        }
    }

    fn replace(&mut self, entry: PortEntry) {
        if let Some(old) = self.entries.remove(&entry.key) {
            self.unindex(&old);
        }
        self.index(&entry);
        self.entries.insert(entry.key.clone(), entry);
    }

    fn remove(&mut self, key: &PortKey) -> Option<PortEntry> {
        let removed = self.entries.remove(key)?;
        self.unindex(&removed);
        Some(removed)
    }

    /// Follows `parent_key` links up to the port that owns the DP binding.
    fn resolve_physical(&self, key: &PortKey) -> Option<&PortEntry> {
        let mut current = self.entries.get(key)?;
        for _ in 0..MAX_PARENT_DEPTH {
            match current.parent_key.as_ref() {
                None => return Some(current),
                Some(parent) => match self.entries.get(parent) {
                    Some(entry) => current = entry,
                    None => {
                        debug!(
                            event = events::PORT_PARENT_CHAIN_BROKEN,
                            component = COMPONENT,
                            port_key = %key,
                            parent_key = %parent,
                            "parent port not found"
                        );
                        return None;
                    }
                },
            }
        }
        warn!(
            event = events::PORT_PARENT_CHAIN_BROKEN,
            component = COMPONENT,
            port_key = %key,
            depth = MAX_PARENT_DEPTH,
            "parent chain too deep or cyclic"
        );
        None
    }

    fn find_key(&self, view_key: &ViewKey) -> Option<PortKey> {
        match view_key {
            ViewKey::Vm { re_id, port_id } => {
                let key = self.vm_index.get(&(re_id.clone(), *port_id))?;
                self.resolve_physical(key).map(|entry| entry.key.clone())
            }
            ViewKey::Dp { dp_id, port_id } => self.dp_index.get(&(*dp_id, *port_id)).cloned(),
            ViewKey::Vs { vs_id, port_id } => self.vs_index.get(&(*vs_id, *port_id)).cloned(),
        }
    }

    fn apply<R>(&mut self, key: &PortKey, f: impl FnOnce(&mut PortEntry) -> R) -> Option<R> {
        let mut next = self.entries.get(key)?.clone();
        let result = f(&mut next);
        next.key = key.clone();
        self.replace(next);
        Some(result)
    }

    fn collect_children(
        &self,
        parent: &PortKey,
        visited: &mut HashSet<PortKey>,
        out: &mut Vec<PortEntry>,
    ) {
        let mut children: Vec<&PortEntry> = self
            .entries
            .values()
            .filter(|entry| entry.parent_key.as_ref() == Some(parent))
            .collect();
        children.sort_by(|a, b| a.key.cmp(&b.key));

        for child in children {
            if visited.insert(child.key.clone()) {
                out.push(child.clone());
                self.collect_children(&child.key, visited, out);
            }
        }
    }
}

/// Table of logical ports keyed by [`PortKey`].
///
/// Every mutation clones the stored entry, applies the caller's closure to the
/// copy and swaps the copy in under the write lock, re-indexing the VM/DP/VS
/// views of the old and new versions. Readers only ever receive clones.
#[derive(Default)]
pub struct PortMap {
    inner: RwLock<PortMapInner>,
}

impl PortMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new reconciliation epoch and returns it.
    pub async fn ver_up(&self) -> u64 {
        let mut inner = self.inner.write().await;
        inner.version += 1;
        inner.version
    }

    pub async fn version(&self) -> u64 {
        self.inner.read().await.version
    }

    /// Inserts `entry` if its key is free. Returns false when the key exists.
    pub async fn register(&self, mut entry: PortEntry) -> bool {
        let mut inner = self.inner.write().await;
        if inner.entries.contains_key(&entry.key) {
            return false;
        }
        entry.version = inner.version;
        debug!(
            event = events::PORT_REGISTER,
            component = COMPONENT,
            port_key = %entry.key,
            "port registered"
        );
        inner.replace(entry);
        true
    }

    /// Inserts `seed` when the key is absent, then applies `f` to the stored
    /// entry and stamps it with the current epoch.
    pub async fn upsert<R>(&self, seed: PortEntry, f: impl FnOnce(&mut PortEntry) -> R) -> R {
        let mut inner = self.inner.write().await;
        let version = inner.version;
        let key = seed.key.clone();
        let mut next = match inner.entries.get(&key) {
            Some(entry) => entry.clone(),
            None => {
                debug!(
                    event = events::PORT_REGISTER,
                    component = COMPONENT,
                    port_key = %key,
                    "port registered"
                );
                seed
            }
        };
        let result = f(&mut next);
        next.key = key;
        next.version = version;
        inner.replace(next);
        result
    }

    /// Removes the entry and all index slots it owns.
    pub async fn unregister(&self, key: &PortKey) -> Option<PortEntry> {
        let removed = self.inner.write().await.remove(key);
        if removed.is_some() {
            debug!(
                event = events::PORT_UNREGISTER,
                component = COMPONENT,
                port_key = %key,
                "port unregistered"
            );
        }
        removed
    }

    pub async fn select(&self, key: &PortKey) -> Option<PortEntry> {
        self.inner.read().await.entries.get(key).cloned()
    }

    /// Resolves a plane-numbered port. VM lookups land on the physical port the
    /// addressed port rides on.
    pub async fn select_by_view(&self, view_key: &ViewKey) -> Option<PortEntry> {
        let inner = self.inner.read().await;
        let key = inner.find_key(view_key)?;
        inner.entries.get(&key).cloned()
    }

    /// Applies `f` to the entry as one whole-entry replacement.
    pub async fn update<R>(&self, key: &PortKey, f: impl FnOnce(&mut PortEntry) -> R) -> Option<R> {
        self.inner.write().await.apply(key, f)
    }

    pub async fn update_by_view<R>(
        &self,
        view_key: &ViewKey,
        f: impl FnOnce(&mut PortEntry) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.write().await;
        let key = inner.find_key(view_key)?;
        inner.apply(&key, f)
    }

    /// Applies `f` to every entry matching `predicate`; returns the new versions.
    pub async fn update_all(
        &self,
        predicate: impl Fn(&PortEntry) -> bool,
        mut f: impl FnMut(&mut PortEntry),
    ) -> Vec<PortEntry> {
        let mut inner = self.inner.write().await;
        let mut keys: Vec<PortKey> = inner
            .entries
            .values()
            .filter(|entry| predicate(entry))
            .map(|entry| entry.key.clone())
            .collect();
        keys.sort();

        let mut updated = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = inner.apply(&key, |entry| {
                f(entry);
                entry.clone()
            }) {
                updated.push(entry);
            }
        }
        updated
    }

    pub async fn list(&self, predicate: impl Fn(&PortEntry) -> bool) -> Vec<PortEntry> {
        let inner = self.inner.read().await;
        let mut entries: Vec<PortEntry> = inner
            .entries
            .values()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Entries whose VM view belongs to `re_id`.
    pub async fn list_by_vm(&self, re_id: &str) -> Vec<PortEntry> {
        self.list(|entry| entry.vm_view.id == re_id).await
    }

    /// All ports riding on `parent`, transitively.
    pub async fn list_by_parent(&self, parent: &PortKey) -> Vec<PortEntry> {
        let inner = self.inner.read().await;
        let mut visited = HashSet::from([parent.clone()]);
        let mut children = Vec::new();
        inner.collect_children(parent, &mut visited, &mut children);
        children
    }

    /// Association of the physical port behind `key`; `None` when the key or
    /// one of its parents is missing.
    pub async fn is_associated(&self, key: &PortKey) -> Option<bool> {
        let inner = self.inner.read().await;
        inner.resolve_physical(key).map(PortEntry::is_associated)
    }

    /// Sweeps entries not stamped in the current epoch. Entries for which
    /// `keep` returns true are re-stamped, the others removed and returned.
    pub async fn gc(&self, mut keep: impl FnMut(&PortEntry) -> bool) -> Vec<PortEntry> {
        let mut inner = self.inner.write().await;
        let version = inner.version;
        let mut stale: Vec<PortKey> = inner
            .entries
            .values()
            .filter(|entry| entry.version != version)
            .map(|entry| entry.key.clone())
            .collect();
        stale.sort();

        let mut removed = Vec::new();
        for key in stale {
            let retain = inner.entries.get(&key).is_some_and(&mut keep);
            if retain {
                if let Some(entry) = inner.entries.get_mut(&key) {
                    entry.version = version;
                }
            } else if let Some(entry) = inner.remove(&key) {
                removed.push(entry);
            }
        }
        removed
    }

    /// Snapshot of every entry, sorted by key.
    pub async fn entries(&self) -> Vec<PortEntry> {
        self.list(|_| true).await
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
