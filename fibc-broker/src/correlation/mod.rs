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

//! Request/reply correlation over the asynchronous monitor streams.
//!
//! A caller that forwards a request to another plane registers a [`Waiter`]
//! in the [`WaiterTable`], embeds the returned xid in the request and then
//! waits with its own timeout. Reply handlers resolve the waiter by xid.
//! The caller always unregisters the waiter afterwards.

mod audit;
mod table;
mod waiter;

pub use audit::{AuditSummary, AuditWaiter};
pub use table::WaiterTable;
pub use waiter::{MultipartWaiter, SimpleWaiter};

use crate::message::{DeviceId, MultipartReply, OamReply};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Plane instance a reply came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReplySource {
    Vm(String),
    Dp(DeviceId),
    Vs(DeviceId),
}

impl Display for ReplySource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplySource::Vm(re_id) => write!(f, "vm/{re_id}"),
            ReplySource::Dp(dp_id) => write!(f, "dp/{dp_id}"),
            ReplySource::Vs(vs_id) => write!(f, "vs/{vs_id}"),
        }
    }
}

/// Reply payloads a waiter can be resolved with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaiterReply {
    Multipart(MultipartReply),
    Oam(OamReply),
}

impl WaiterReply {
    pub fn kind_name(&self) -> &'static str {
        match self {
            WaiterReply::Multipart(_) => "multipart",
            WaiterReply::Oam(_) => "oam",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaiterError {
    /// Nothing resolved the waiter within the caller's bound.
    Timeout(Duration),
    /// The waiter was resolved with a payload it cannot accept.
    InvalidReply(String),
    Closed,
}

impl Display for WaiterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WaiterError::Timeout(after) => write!(f, "no reply within {after:?}"),
            WaiterError::InvalidReply(what) => write!(f, "invalid reply: {what}"),
            WaiterError::Closed => f.write_str("waiter closed"),
        }
    }
}

impl Error for WaiterError {}

/// Pending request that reply handlers complete.
#[async_trait]
pub trait Waiter: Send + Sync {
    /// Offers one reply. Returns true when the waiter accepted it; replies
    /// arriving after completion are ignored.
    async fn resolve(&self, source: ReplySource, reply: WaiterReply) -> bool;
}
