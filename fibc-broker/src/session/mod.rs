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

//! Monitor sessions: one bounded outbound queue per connected plane
//! identity, drained onto the transport stream by a dedicated task.

mod delivery;
mod handle;
mod set;

pub use handle::{Delivery, DropReason, SessionHandle};
pub use set::{SessionEntry, SessionSet};

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Server-to-client half of a monitor stream, provided by the transport.
#[async_trait]
pub trait MonitorStream<E>: Send + Sync
where
    E: Send + 'static,
{
    async fn send(&self, event: E) -> Result<(), StreamError>;
}

/// Transport failure while writing to a monitor stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    message: String,
}

impl StreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for StreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "monitor stream failed: {}", self.message)
    }
}

impl Error for StreamError {}
