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

use super::{ReplySource, Waiter, WaiterReply};
use crate::message::Xid;
use crate::observability::events;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "waiter_table";

struct TableInner {
    waiters: HashMap<Xid, Arc<dyn Waiter>>,
    next_xid: Xid,
}

/// Pending waiters keyed by transaction id.
///
/// Xid `0` is never handed out; it marks requests the broker issues for
/// itself and whose replies are consumed without a waiter.
pub struct WaiterTable {
    inner: Mutex<TableInner>,
}

impl Default for WaiterTable {
    fn default() -> Self {
        Self::new()
    }
}

impl WaiterTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TableInner {
                waiters: HashMap::new(),
                next_xid: 1,
            }),
        }
    }

    /// Registers `waiter` under a fresh xid.
    pub async fn register(&self, waiter: Arc<dyn Waiter>) -> Xid {
        let mut inner = self.inner.lock().await;
        let xid = loop {
            let candidate = inner.next_xid;
            inner.next_xid = inner.next_xid.wrapping_add(1);
            if candidate != 0 && !inner.waiters.contains_key(&candidate) {
                break candidate;
            }
        };
        inner.waiters.insert(xid, waiter);
        debug!(
            event = events::WAITER_REGISTER,
            component = COMPONENT,
            xid,
            pending = inner.waiters.len(),
            "waiter registered"
        );
        xid
    }

    pub async fn unregister(&self, xid: Xid) -> bool {
        self.inner.lock().await.waiters.remove(&xid).is_some()
    }

    /// Hands `reply` to the waiter of `xid`. Unknown xids are logged and
    /// dropped; this includes replies arriving after the caller gave up.
    pub async fn resolve(&self, xid: Xid, source: ReplySource, reply: WaiterReply) -> bool {
        let waiter = self.inner.lock().await.waiters.get(&xid).cloned();
        let Some(waiter) = waiter else {
            warn!(
                event = events::WAITER_RESOLVE_UNKNOWN,
                component = COMPONENT,
                xid,
                source = %source,
                kind = reply.kind_name(),
                "no waiter for reply"
            );
            return false;
        };

        let accepted = waiter.resolve(source.clone(), reply).await;
        debug!(
            event = events::WAITER_RESOLVE,
            component = COMPONENT,
            xid,
            source = %source,
            accepted,
            "reply delivered to waiter"
        );
        accepted
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.waiters.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    async fn set_next_xid(&self, xid: Xid) {
        self.inner.lock().await.next_xid = xid;
    }
}

#[cfg(test)]
mod tests {
    use super::WaiterTable;
    use crate::correlation::{MultipartWaiter, ReplySource, WaiterError, WaiterReply};
    use crate::message::{MultipartReply, MultipartReplyBody};
    use std::sync::Arc;
    use std::time::Duration;

    fn waiter() -> Arc<MultipartWaiter> {
        Arc::new(MultipartWaiter::new(ReplySource::Dp(1234)))
    }

    fn reply() -> WaiterReply {
        WaiterReply::Multipart(MultipartReply {
            dp_id: 1234,
            body: MultipartReplyBody::Port(Vec::new()),
        })
    }

    #[tokio::test]
    async fn xids_start_at_one_and_are_unique() {
        let table = WaiterTable::new();
        let first = table.register(waiter()).await;
        let second = table.register(waiter()).await;

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn allocation_skips_zero_and_live_xids_on_wrap() {
        let table = WaiterTable::new();
        let live = table.register(waiter()).await;
        table.set_next_xid(u32::MAX).await;

        assert_eq!(table.register(waiter()).await, u32::MAX);
        let wrapped = table.register(waiter()).await;
        assert_ne!(wrapped, 0);
        assert_ne!(wrapped, live);
    }

    #[tokio::test]
    async fn resolve_reaches_registered_waiter_once() {
        let table = WaiterTable::new();
        let waiter = waiter();
        let xid = table.register(waiter.clone()).await;

        assert!(table.resolve(xid, ReplySource::Dp(1234), reply()).await);
        assert!(!table.resolve(xid, ReplySource::Dp(1234), reply()).await);
        assert!(waiter.wait(Duration::from_millis(10)).await.is_ok());
        assert!(table.unregister(xid).await);
        assert!(table.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_after_timeout_and_unregister_is_dropped() {
        let table = WaiterTable::new();
        let waiter = waiter();
        let xid = table.register(waiter.clone()).await;

        assert!(matches!(
            waiter.wait(Duration::from_millis(20)).await,
            Err(WaiterError::Timeout(_))
        ));
        assert!(table.unregister(xid).await);

        assert!(!table.resolve(xid, ReplySource::Dp(1234), reply()).await);
        assert!(!table.unregister(xid).await);
    }
}
