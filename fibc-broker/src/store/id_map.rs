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

//! Router identity <-> device identity bindings.

use crate::message::DeviceId;
use crate::observability::events;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "id_map";

/// One 1:1 binding between a router instance and a device.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdEntry {
    pub re_id: String,
    pub dp_id: DeviceId,
}

impl IdEntry {
    pub fn new(re_id: impl Into<String>, dp_id: DeviceId) -> Self {
        Self {
            re_id: re_id.into(),
            dp_id,
        }
    }
}

/// A binding request that would break the 1:1 mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdConflict {
    DeviceBound {
        dp_id: DeviceId,
        bound_re_id: String,
        requested_re_id: String,
    },
    RouterBound {
        re_id: String,
        bound_dp_id: DeviceId,
        requested_dp_id: DeviceId,
    },
}

impl Display for IdConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IdConflict::DeviceBound {
                dp_id,
                bound_re_id,
                requested_re_id,
            } => write!(
                f,
                "dp_id {dp_id} is bound to '{bound_re_id}', cannot bind '{requested_re_id}'"
            ),
            IdConflict::RouterBound {
                re_id,
                bound_dp_id,
                requested_dp_id,
            } => write!(
                f,
                "re_id '{re_id}' is bound to dp_id {bound_dp_id}, cannot bind {requested_dp_id}"
            ),
        }
    }
}

impl Error for IdConflict {}

#[derive(Default)]
struct IdSnapshot {
    version: u64,
    by_dp: HashMap<DeviceId, String>,
    by_re: HashMap<String, DeviceId>,
}

impl IdSnapshot {
    fn check(&self, entry: &IdEntry) -> Result<bool, IdConflict> {
        if let Some(bound_re_id) = self.by_dp.get(&entry.dp_id) {
            if *bound_re_id != entry.re_id {
                return Err(IdConflict::DeviceBound {
                    dp_id: entry.dp_id,
                    bound_re_id: bound_re_id.clone(),
                    requested_re_id: entry.re_id.clone(),
                });
            }
            return Ok(false);
        }
        if let Some(bound_dp_id) = self.by_re.get(&entry.re_id) {
            return Err(IdConflict::RouterBound {
                re_id: entry.re_id.clone(),
                bound_dp_id: *bound_dp_id,
                requested_dp_id: entry.dp_id,
            });
        }
        Ok(true)
    }

    fn insert(&mut self, entry: IdEntry) {
        self.by_re.insert(entry.re_id.clone(), entry.dp_id);
        self.by_dp.insert(entry.dp_id, entry.re_id);
    }

    fn entries(&self) -> Vec<IdEntry> {
        let mut entries: Vec<IdEntry> = self
            .by_dp
            .iter()
            .map(|(dp_id, re_id)| IdEntry::new(re_id.clone(), *dp_id))
            .collect();
        entries.sort();
        entries
    }
}

/// Result of swapping in a freshly built binding table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdReplaceReport {
    pub version: u64,
    pub bound: Vec<IdEntry>,
    pub removed: Vec<IdEntry>,
    pub rejected: Vec<IdConflict>,
}

/// Bidirectional identity table published as an immutable snapshot.
///
/// Lookups load the current snapshot without locking. Writers build a new
/// snapshot from the current one and swap it in; they are serialized by
/// `writer` so that a bind never races a reload.
pub struct IdMap {
    snapshot: ArcSwap<IdSnapshot>,
    next_version: AtomicU64,
    writer: Mutex<()>,
}

impl Default for IdMap {
    fn default() -> Self {
        Self::new()
    }
}

impl IdMap {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(IdSnapshot::default()),
            next_version: AtomicU64::new(1),
            writer: Mutex::new(()),
        }
    }

    fn publish(&self, mut snapshot: IdSnapshot) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        snapshot.version = version;
        self.snapshot.store(Arc::new(snapshot));
        version
    }

    /// Adds one binding. Returns false when the identical pair already exists.
    pub async fn bind(&self, re_id: &str, dp_id: DeviceId) -> Result<bool, IdConflict> {
        let _guard = self.writer.lock().await;
        let current = self.snapshot.load();
        let entry = IdEntry::new(re_id, dp_id);

        if !current.check(&entry)? {
            return Ok(false);
        }

        let mut next = IdSnapshot {
            version: 0,
            by_dp: current.by_dp.clone(),
            by_re: current.by_re.clone(),
        };
        next.insert(entry);
        let version = self.publish(next);

        debug!(
            event = events::IDENTITY_BIND,
            component = COMPONENT,
            re_id,
            dp_id,
            version,
            "identity bound"
        );
        Ok(true)
    }

    pub async fn unbind_device(&self, dp_id: DeviceId) -> Option<IdEntry> {
        let _guard = self.writer.lock().await;
        let current = self.snapshot.load();
        let re_id = current.by_dp.get(&dp_id)?.clone();

        let mut next = IdSnapshot {
            version: 0,
            by_dp: current.by_dp.clone(),
            by_re: current.by_re.clone(),
        };
        next.by_dp.remove(&dp_id);
        next.by_re.remove(&re_id);
        self.publish(next);
        Some(IdEntry::new(re_id, dp_id))
    }

    pub async fn unbind_router(&self, re_id: &str) -> Option<IdEntry> {
        let dp_id = self.device_by_router(re_id)?;
        self.unbind_device(dp_id).await
    }

    /// Replaces the whole table. Pairs that conflict with an earlier pair of
    /// the same batch are rejected and reported.
    pub async fn replace(&self, entries: impl IntoIterator<Item = IdEntry>) -> IdReplaceReport {
        let _guard = self.writer.lock().await;
        let previous = self.snapshot.load_full();

        let mut next = IdSnapshot::default();
        let mut rejected = Vec::new();
        for entry in entries {
            match next.check(&entry) {
                Ok(true) => next.insert(entry),
                Ok(false) => {}
                Err(conflict) => {
                    warn!(
                        event = events::IDENTITY_CONFLICT,
                        component = COMPONENT,
                        err = %conflict,
                        "identity binding rejected"
                    );
                    rejected.push(conflict);
                }
            }
        }

        let removed: Vec<IdEntry> = previous
            .entries()
            .into_iter()
            .filter(|entry| next.by_dp.get(&entry.dp_id) != Some(&entry.re_id))
            .collect();
        let bound = next.entries();
        let version = self.publish(next);

        IdReplaceReport {
            version,
            bound,
            removed,
            rejected,
        }
    }

    pub fn device_by_router(&self, re_id: &str) -> Option<DeviceId> {
        self.snapshot.load().by_re.get(re_id).copied()
    }

    pub fn router_by_device(&self, dp_id: DeviceId) -> Option<String> {
        self.snapshot.load().by_dp.get(&dp_id).cloned()
    }

    pub fn entries(&self) -> Vec<IdEntry> {
        self.snapshot.load().entries()
    }

    pub fn version(&self) -> u64 {
        self.snapshot.load().version
    }
}

#[cfg(test)]
mod tests {
    use super::{IdConflict, IdEntry, IdMap};

    #[tokio::test]
    async fn bindings_are_bijective() {
        let map = IdMap::new();
        map.bind("1.1.1.1", 1234).await.expect("first bind");
        map.bind("2.2.2.2", 5678).await.expect("second bind");

        for (re_id, dp_id) in [("1.1.1.1", 1234), ("2.2.2.2", 5678)] {
            assert_eq!(map.device_by_router(re_id), Some(dp_id));
            assert_eq!(map.router_by_device(dp_id).as_deref(), Some(re_id));
        }
        assert_eq!(map.device_by_router("9.9.9.9"), None);
        assert_eq!(map.router_by_device(9), None);
    }

    #[tokio::test]
    async fn rebinding_same_pair_is_a_no_op() {
        let map = IdMap::new();
        assert_eq!(map.bind("1.1.1.1", 1234).await, Ok(true));
        let version = map.version();

        assert_eq!(map.bind("1.1.1.1", 1234).await, Ok(false));
        assert_eq!(map.version(), version);
    }

    #[tokio::test]
    async fn conflicting_bindings_are_rejected_in_both_directions() {
        let map = IdMap::new();
        map.bind("1.1.1.1", 1234).await.expect("bind");

        assert!(matches!(
            map.bind("2.2.2.2", 1234).await,
            Err(IdConflict::DeviceBound { dp_id: 1234, .. })
        ));
        assert!(matches!(
            map.bind("1.1.1.1", 5678).await,
            Err(IdConflict::RouterBound {
                bound_dp_id: 1234,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn replace_reports_removed_and_rejected_pairs() {
        let map = IdMap::new();
        map.bind("1.1.1.1", 1234).await.expect("bind");
        map.bind("2.2.2.2", 5678).await.expect("bind");

        let report = map
            .replace(vec![
                IdEntry::new("1.1.1.1", 1234),
                IdEntry::new("3.3.3.3", 1234),
                IdEntry::new("4.4.4.4", 9),
            ])
            .await;

        assert_eq!(
            report.bound,
            vec![IdEntry::new("1.1.1.1", 1234), IdEntry::new("4.4.4.4", 9)]
        );
        assert_eq!(report.removed, vec![IdEntry::new("2.2.2.2", 5678)]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(map.router_by_device(5678), None);
        assert_eq!(map.version(), report.version);
    }

    #[tokio::test]
    async fn unbind_removes_both_directions() {
        let map = IdMap::new();
        map.bind("1.1.1.1", 1234).await.expect("bind");

        assert_eq!(
            map.unbind_router("1.1.1.1").await,
            Some(IdEntry::new("1.1.1.1", 1234))
        );
        assert_eq!(map.device_by_router("1.1.1.1"), None);
        assert_eq!(map.router_by_device(1234), None);
        assert_eq!(map.unbind_device(1234).await, None);
    }
}
