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

//! Fan-out waiter for the fabric route-count audit.

use super::{ReplySource, SimpleWaiter, Waiter, WaiterError, WaiterReply};
use crate::observability::events;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "audit_waiter";

/// Route counts collected from every expected participant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub counts: BTreeMap<ReplySource, u64>,
    pub vm_routes: u64,
    pub dp_routes: u64,
}

impl AuditSummary {
    fn from_counts(counts: BTreeMap<ReplySource, u64>) -> Self {
        let mut vm_routes = 0;
        let mut dp_routes = 0;
        for (source, count) in &counts {
            match source {
                ReplySource::Vm(_) => vm_routes += count,
                ReplySource::Dp(_) => dp_routes += count,
                ReplySource::Vs(_) => {}
            }
        }
        Self {
            counts,
            vm_routes,
            dp_routes,
        }
    }

    /// Routers and data planes agree on the number of routes.
    pub fn is_consistent(&self) -> bool {
        self.vm_routes == self.dp_routes
    }
}

/// Completes once every participant counted at issue time has replied.
///
/// A participant that disconnects after being counted keeps the waiter
/// pending until the caller's timeout fires.
pub struct AuditWaiter {
    pending: Mutex<BTreeSet<ReplySource>>,
    counts: Mutex<BTreeMap<ReplySource, u64>>,
    done: SimpleWaiter<AuditSummary>,
}

impl AuditWaiter {
    pub fn new(expected: impl IntoIterator<Item = ReplySource>) -> Self {
        let pending: BTreeSet<ReplySource> = expected.into_iter().collect();
        let done = SimpleWaiter::new();
        if pending.is_empty() {
            done.complete(Ok(AuditSummary::default()));
        }
        Self {
            pending: Mutex::new(pending),
            counts: Mutex::new(BTreeMap::new()),
            done,
        }
    }

    pub async fn remaining(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn wait(&self, timeout: Duration) -> Result<AuditSummary, WaiterError> {
        self.done.wait(timeout).await
    }

    fn check(summary: &AuditSummary) {
        if summary.is_consistent() {
            info!(
                event = events::AUDIT_ROUTE_COUNT_OK,
                component = COMPONENT,
                vm_routes = summary.vm_routes,
                dp_routes = summary.dp_routes,
                "route count audit passed"
            );
        } else {
            error!(
                event = events::AUDIT_ROUTE_COUNT_MISMATCH,
                component = COMPONENT,
                vm_routes = summary.vm_routes,
                dp_routes = summary.dp_routes,
                "route count mismatch between routers and data planes"
            );
        }
    }
}

#[async_trait]
impl Waiter for AuditWaiter {
    async fn resolve(&self, source: ReplySource, reply: WaiterReply) -> bool {
        let count = match reply {
            WaiterReply::Oam(reply) => reply.route_count(),
            WaiterReply::Multipart(_) => {
                warn!(
                    event = events::WAITER_UNEXPECTED_SOURCE,
                    component = COMPONENT,
                    source = %source,
                    "multipart reply offered to audit waiter"
                );
                return false;
            }
        };

        let mut pending = self.pending.lock().await;
        if !pending.remove(&source) {
            warn!(
                event = events::WAITER_UNEXPECTED_SOURCE,
                component = COMPONENT,
                source = %source,
                "audit reply from unexpected or already counted source"
            );
            return false;
        }

        let mut counts = self.counts.lock().await;
        counts.insert(source.clone(), count);
        debug!(
            event = events::WAITER_RESOLVE,
            component = COMPONENT,
            source = %source,
            count,
            remaining = pending.len(),
            "audit reply counted"
        );

        if pending.is_empty() {
            let summary = AuditSummary::from_counts(counts.clone());
            Self::check(&summary);
            self.done.complete(Ok(summary));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::AuditWaiter;
    use crate::correlation::{ReplySource, Waiter, WaiterError, WaiterReply};
    use crate::message::{OamReply, OamReplyBody};
    use std::time::Duration;

    fn count(count: u64) -> WaiterReply {
        WaiterReply::Oam(OamReply {
            dp_id: 0,
            re_id: String::new(),
            body: OamReplyBody::AuditRouteCnt { count },
        })
    }

    fn participants() -> Vec<ReplySource> {
        vec![
            ReplySource::Vm("1.1.1.1".to_string()),
            ReplySource::Vm("2.2.2.2".to_string()),
            ReplySource::Dp(1234),
        ]
    }

    #[tokio::test]
    async fn completes_when_every_participant_replied() {
        let waiter = AuditWaiter::new(participants());

        assert!(waiter.resolve(ReplySource::Vm("1.1.1.1".to_string()), count(3)).await);
        assert!(waiter.resolve(ReplySource::Dp(1234), count(5)).await);
        assert!(waiter.resolve(ReplySource::Vm("2.2.2.2".to_string()), count(2)).await);

        let summary = waiter
            .wait(Duration::from_millis(10))
            .await
            .expect("audit completed");
        assert_eq!(summary.vm_routes, 5);
        assert_eq!(summary.dp_routes, 5);
        assert!(summary.is_consistent());
    }

    #[tokio::test(start_paused = true)]
    async fn partial_replies_leave_the_waiter_pending_until_timeout() {
        let waiter = AuditWaiter::new(participants());

        waiter.resolve(ReplySource::Vm("1.1.1.1".to_string()), count(3)).await;
        waiter.resolve(ReplySource::Dp(1234), count(3)).await;

        assert_eq!(waiter.remaining().await, 1);
        assert_eq!(
            waiter.wait(Duration::from_millis(100)).await,
            Err(WaiterError::Timeout(Duration::from_millis(100)))
        );
        assert_eq!(waiter.remaining().await, 1);
    }

    #[tokio::test]
    async fn duplicate_and_unexpected_sources_do_not_count() {
        let waiter = AuditWaiter::new(participants());

        assert!(waiter.resolve(ReplySource::Dp(1234), count(1)).await);
        assert!(!waiter.resolve(ReplySource::Dp(1234), count(1)).await);
        assert!(!waiter.resolve(ReplySource::Dp(9999), count(1)).await);
        assert_eq!(waiter.remaining().await, 2);
    }

    #[tokio::test]
    async fn mismatch_is_advisory() {
        let waiter = AuditWaiter::new(vec![
            ReplySource::Vm("1.1.1.1".to_string()),
            ReplySource::Dp(1234),
        ]);

        waiter.resolve(ReplySource::Vm("1.1.1.1".to_string()), count(4)).await;
        waiter.resolve(ReplySource::Dp(1234), count(1)).await;

        let summary = waiter
            .wait(Duration::from_millis(10))
            .await
            .expect("mismatch still completes");
        assert!(!summary.is_consistent());
    }

    #[tokio::test]
    async fn empty_fan_out_completes_immediately() {
        let waiter = AuditWaiter::new(Vec::new());

        let summary = waiter
            .wait(Duration::from_millis(10))
            .await
            .expect("nothing to wait for");
        assert!(summary.counts.is_empty());
    }
}
