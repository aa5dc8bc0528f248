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

use super::{ReplySource, Waiter, WaiterError, WaiterReply};
use crate::message::MultipartReply;
use crate::observability::events;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;
use tracing::warn;

const COMPONENT: &str = "multipart_waiter";

/// Single-valued waiter. The first `complete` wins; later ones are no-ops.
pub struct SimpleWaiter<T> {
    slot: watch::Sender<Option<Result<T, WaiterError>>>,
}

impl<T> Default for SimpleWaiter<T> {
    fn default() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }
}

impl<T: Clone> SimpleWaiter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `result` unless one is already stored. Returns true when stored.
    pub fn complete(&self, result: Result<T, WaiterError>) -> bool {
        let mut result = Some(result);
        self.slot.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = result.take();
            true
        })
    }

    pub fn is_completed(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Waits up to `timeout` for completion.
    pub async fn wait(&self, timeout: Duration) -> Result<T, WaiterError> {
        let mut rx = self.slot.subscribe();
        let result = match time::timeout(timeout, rx.wait_for(Option::is_some)).await {
            Ok(Ok(slot)) => slot.as_ref().cloned().unwrap_or(Err(WaiterError::Closed)),
            Ok(Err(_)) => Err(WaiterError::Closed),
            Err(_) => Err(WaiterError::Timeout(timeout)),
        };
        result
    }
}

/// Waiter for one multipart reply from one device.
pub struct MultipartWaiter {
    expected: ReplySource,
    inner: SimpleWaiter<MultipartReply>,
}

impl MultipartWaiter {
    pub fn new(expected: ReplySource) -> Self {
        Self {
            expected,
            inner: SimpleWaiter::new(),
        }
    }

    pub async fn wait(&self, timeout: Duration) -> Result<MultipartReply, WaiterError> {
        self.inner.wait(timeout).await
    }
}

#[async_trait]
impl Waiter for MultipartWaiter {
    async fn resolve(&self, source: ReplySource, reply: WaiterReply) -> bool {
        if source != self.expected {
            warn!(
                event = events::WAITER_UNEXPECTED_SOURCE,
                component = COMPONENT,
                source = %source,
                expected = %self.expected,
                "multipart reply from another source"
            );
            return false;
        }
        match reply {
            WaiterReply::Multipart(reply) => self.inner.complete(Ok(reply)),
            other => self.inner.complete(Err(WaiterError::InvalidReply(format!(
                "expected multipart, got {}",
                other.kind_name()
            )))),
        }
    }
}
