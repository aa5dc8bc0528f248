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

use super::delivery::delivery_loop;
use super::{Delivery, DropReason, MonitorStream, SessionHandle};
use crate::error::BrokerError;
use crate::observability::events;
use crate::plane::Plane;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "session_set";

/// Read-only description of a registered session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionEntry {
    pub plane: Plane,
    pub entry_id: String,
    pub session_id: String,
    pub active: bool,
}

/// Sessions of one plane, at most one per entry id.
pub struct SessionSet<E> {
    plane: Plane,
    queue_size: usize,
    sessions: RwLock<HashMap<String, Arc<SessionHandle<E>>>>,
}

impl<E> SessionSet<E>
where
    E: Send + 'static,
{
    pub fn new(plane: Plane, queue_size: usize) -> Self {
        Self {
            plane,
            queue_size: queue_size.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    /// Registers a session for `entry_id` and starts its delivery task.
    ///
    /// The session token is a child of `transport`: closing the transport
    /// cancels the session, while a broker-side cancel leaves the
    /// transport's own token untouched.
    pub async fn open(
        &self,
        entry_id: impl Into<String>,
        stream: Arc<dyn MonitorStream<E>>,
        transport: &CancellationToken,
    ) -> Result<Arc<SessionHandle<E>>, BrokerError> {
        let entry_id = entry_id.into();
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&entry_id) {
            warn!(
                event = events::SESSION_DUPLICATE,
                component = COMPONENT,
                plane = self.plane.as_str(),
                entry_id = entry_id.as_str(),
                session_id = existing.session_id(),
                "monitor session already registered"
            );
            return Err(BrokerError::DuplicateSession {
                plane: self.plane,
                entry_id,
            });
        }

        let (sender, receiver) = mpsc::channel(self.queue_size);
        let token = transport.child_token();
        let handle = Arc::new(SessionHandle::new(
            self.plane,
            entry_id.clone(),
            sender,
            token.clone(),
        ));
        sessions.insert(entry_id, Arc::clone(&handle));
        drop(sessions);

        tokio::spawn(delivery_loop(
            handle.context().clone(),
            stream,
            receiver,
            token,
        ));
        info!(
            event = events::SESSION_OPEN,
            component = COMPONENT,
            plane = self.plane.as_str(),
            entry_id = handle.entry_id(),
            session_id = handle.session_id(),
            "monitor session opened"
        );
        Ok(handle)
    }

    /// Deactivates, cancels and unregisters `handle`. Returns true only for
    /// the first call on a given session; leave logic keys off that.
    pub async fn close(&self, handle: &Arc<SessionHandle<E>>) -> bool {
        if !handle.deactivate() {
            return false;
        }
        handle.cancel();

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(handle.entry_id())
            .is_some_and(|current| Arc::ptr_eq(current, handle))
        {
            sessions.remove(handle.entry_id());
        }
        drop(sessions);

        info!(
            event = events::SESSION_CLOSE,
            component = COMPONENT,
            plane = self.plane.as_str(),
            entry_id = handle.entry_id(),
            session_id = handle.session_id(),
            "monitor session closed"
        );
        true
    }

    pub async fn select(&self, entry_id: &str) -> Option<Arc<SessionHandle<E>>> {
        self.sessions.read().await.get(entry_id).cloned()
    }

    pub async fn contains(&self, entry_id: &str) -> bool {
        self.sessions.read().await.contains_key(entry_id)
    }

    /// Pushes `event` to the session of `entry_id`.
    pub async fn send(&self, entry_id: &str, event: E) -> Delivery {
        let delivery = match self.select(entry_id).await {
            Some(handle) => handle.deliver(event).await,
            None => Delivery::Dropped(DropReason::NoSession),
        };
        if let Delivery::Dropped(reason) = delivery {
            self.log_drop(entry_id, reason);
        }
        delivery
    }

    fn log_drop(&self, entry_id: &str, reason: DropReason) {
        match reason {
            DropReason::NoSession | DropReason::Inactive => debug!(
                event = events::DELIVERY_DROPPED,
                component = COMPONENT,
                plane = self.plane.as_str(),
                entry_id,
                reason = reason.as_str(),
                "event dropped"
            ),
            DropReason::QueueClosed | DropReason::QueueFull => warn!(
                event = events::DELIVERY_DROPPED,
                component = COMPONENT,
                plane = self.plane.as_str(),
                entry_id,
                reason = reason.as_str(),
                "event dropped"
            ),
        }
    }

    /// Registered entry ids, sorted.
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn entries(&self) -> Vec<SessionEntry> {
        let mut entries: Vec<SessionEntry> = self
            .sessions
            .read()
            .await
            .values()
            .map(|handle| SessionEntry {
                plane: self.plane,
                entry_id: handle.entry_id().to_string(),
                session_id: handle.session_id().to_string(),
                active: handle.is_active(),
            })
            .collect();
        entries.sort_by(|a, b| a.entry_id.cmp(&b.entry_id));
        entries
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<E> SessionSet<E>
where
    E: Clone + Send + 'static,
{
    /// Offers `event` to every session without waiting on the set lock or on
    /// queue space. Nothing is logged, so it is safe to call from inside a
    /// tracing layer.
    pub fn try_broadcast(&self, event: &E) -> usize {
        let Ok(sessions) = self.sessions.try_read() else {
            return 0;
        };
        sessions
            .values()
            .filter(|handle| handle.try_deliver(event.clone()).is_delivered())
            .count()
    }
}
