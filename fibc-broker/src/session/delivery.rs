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

//! Per-session task draining the outbound queue onto the monitor stream.

use super::MonitorStream;
use crate::observability::events;
use crate::observability::fields::{self, SessionContext};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "delivery_loop";

/// Writes queued events to `stream` in enqueue order until the session is
/// cancelled, the queue closes or a write fails. A failed write cancels the
/// session so that the owning controller tears it down.
pub(crate) async fn delivery_loop<E>(
    context: SessionContext,
    stream: Arc<dyn MonitorStream<E>>,
    mut receiver: Receiver<E>,
    token: CancellationToken,
) where
    E: Send + 'static,
{
    let reason = loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break fields::REASON_CANCELLED,
            event = receiver.recv() => {
                let Some(event) = event else {
                    break fields::REASON_QUEUE_CLOSED;
                };
                if let Err(err) = stream.send(event).await {
                    warn!(
                        event = events::DELIVERY_SEND_FAILED,
                        component = COMPONENT,
                        plane = context.plane,
                        entry_id = context.entry_id.as_str(),
                        session_id = context.session_id.as_str(),
                        err = %err,
                        "monitor stream write failed"
                    );
                    token.cancel();
                    break fields::REASON_STREAM_FAILED;
                }
                debug!(
                    event = events::DELIVERY_SEND_OK,
                    component = COMPONENT,
                    plane = context.plane,
                    entry_id = context.entry_id.as_str(),
                    session_id = context.session_id.as_str(),
                    "event delivered"
                );
            }
        }
    };

    receiver.close();
    info!(
        event = events::DELIVERY_LOOP_EXIT,
        component = COMPONENT,
        plane = context.plane,
        entry_id = context.entry_id.as_str(),
        session_id = context.session_id.as_str(),
        reason,
        "delivery loop stopped"
    );
}
