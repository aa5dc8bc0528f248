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

use crate::observability::fields::{self, SessionContext};
use crate::plane::Plane;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

/// Why an event was not enqueued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// No session is registered for the target identity.
    NoSession,
    /// The session is being torn down.
    Inactive,
    /// The delivery task has exited.
    QueueClosed,
    /// Non-blocking offer found the queue at capacity.
    QueueFull,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::NoSession => fields::REASON_NO_SESSION,
            DropReason::Inactive => fields::REASON_INACTIVE,
            DropReason::QueueClosed => fields::REASON_QUEUE_CLOSED,
            DropReason::QueueFull => fields::REASON_QUEUE_FULL,
        }
    }
}

/// Outcome of pushing an event toward a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delivery {
    Delivered,
    Dropped(DropReason),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// One registered monitor session.
pub struct SessionHandle<E> {
    context: SessionContext,
    plane: Plane,
    sender: mpsc::Sender<E>,
    active: AtomicBool,
    token: CancellationToken,
}

impl<E> SessionHandle<E> {
    pub(crate) fn new(
        plane: Plane,
        entry_id: String,
        sender: mpsc::Sender<E>,
        token: CancellationToken,
    ) -> Self {
        let session_id = uuid::Uuid::new_v4().hyphenated().to_string();
        Self {
            context: SessionContext::new(plane.as_str(), entry_id, session_id),
            plane,
            sender,
            active: AtomicBool::new(true),
            token,
        }
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn entry_id(&self) -> &str {
        &self.context.entry_id
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Cancellation signal of this session. Fires on transport close, on a
    /// failed stream write, or on [`SessionHandle::cancel`].
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Marks the session inactive. Returns true only for the first caller.
    pub(crate) fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    /// Enqueues `event`, waiting for queue space.
    pub async fn deliver(&self, event: E) -> Delivery {
        if !self.is_active() {
            return Delivery::Dropped(DropReason::Inactive);
        }
        match self.sender.send(event).await {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Dropped(DropReason::QueueClosed),
        }
    }

    /// Enqueues `event` only if space is available right now.
    pub fn try_deliver(&self, event: E) -> Delivery {
        if !self.is_active() {
            return Delivery::Dropped(DropReason::Inactive);
        }
        match self.sender.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Dropped(DropReason::QueueFull),
            Err(TrySendError::Closed(_)) => Delivery::Dropped(DropReason::QueueClosed),
        }
    }
}
