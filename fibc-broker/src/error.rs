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

//! Failure taxonomy returned by controller entry points.

use crate::correlation::WaiterError;
use crate::plane::Plane;
use crate::session::DropReason;
use crate::store::IdConflict;
use crate::translate::TranslateError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Typed failure of a broker operation.
#[derive(Debug)]
pub enum BrokerError {
    /// An identity or port binding, or a target session, is absent.
    NotFound(String),
    /// The request is semantically a no-op and was not forwarded.
    NoEffect,
    /// A forwarded event was not enqueued to the target session.
    Undelivered {
        plane: Plane,
        entry_id: String,
        reason: DropReason,
    },
    /// The plane identity already owns an active monitor session.
    DuplicateSession { plane: Plane, entry_id: String },
    /// No matching reply arrived within the bound.
    Timeout { xid: u32, after: Duration },
    /// Message kind or command the broker does not handle.
    Unsupported(String),
    InvalidArgument(String),
    /// A binding would break the 1:1 router/device mapping.
    IdentityConflict(IdConflict),
    Translate(TranslateError),
    Waiter(WaiterError),
    Config(ConfigError),
    Snapshot(SnapshotError),
}

impl BrokerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        BrokerError::NotFound(what.into())
    }

    /// True for failures that mean "binding or session absent".
    pub fn is_not_found(&self) -> bool {
        match self {
            BrokerError::NotFound(_) => true,
            BrokerError::Undelivered { reason, .. } => *reason == DropReason::NoSession,
            BrokerError::Translate(err) => err.is_not_found(),
            _ => false,
        }
    }

    pub fn is_no_effect(&self) -> bool {
        matches!(self, BrokerError::NoEffect)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            BrokerError::Timeout { .. } | BrokerError::Waiter(WaiterError::Timeout(_))
        )
    }
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::NotFound(what) => write!(f, "not found: {what}"),
            BrokerError::NoEffect => write!(f, "request has no effect"),
            BrokerError::Undelivered {
                plane,
                entry_id,
                reason,
            } => write!(f, "{plane} session {entry_id} dropped event: {}", reason.as_str()),
            BrokerError::DuplicateSession { plane, entry_id } => {
                write!(f, "{plane} session already exists: {entry_id}")
            }
            BrokerError::Timeout { xid, after } => {
                write!(f, "no reply for xid {xid} within {after:?}")
            }
            BrokerError::Unsupported(what) => write!(f, "unsupported: {what}"),
            BrokerError::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            BrokerError::IdentityConflict(err) => write!(f, "identity conflict: {err}"),
            BrokerError::Translate(err) => write!(f, "translation failed: {err}"),
            BrokerError::Waiter(err) => write!(f, "waiter failed: {err}"),
            BrokerError::Config(err) => write!(f, "configuration failed: {err}"),
            BrokerError::Snapshot(err) => write!(f, "port snapshot failed: {err}"),
        }
    }
}

impl Error for BrokerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BrokerError::IdentityConflict(err) => Some(err),
            BrokerError::Translate(err) => Some(err),
            BrokerError::Waiter(err) => Some(err),
            BrokerError::Config(err) => Some(err),
            BrokerError::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TranslateError> for BrokerError {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::NoEffect => BrokerError::NoEffect,
            err => BrokerError::Translate(err),
        }
    }
}

impl From<IdConflict> for BrokerError {
    fn from(err: IdConflict) -> Self {
        BrokerError::IdentityConflict(err)
    }
}

impl From<SnapshotError> for BrokerError {
    fn from(err: SnapshotError) -> Self {
        BrokerError::Snapshot(err)
    }
}

impl From<WaiterError> for BrokerError {
    fn from(err: WaiterError) -> Self {
        BrokerError::Waiter(err)
    }
}

impl From<ConfigError> for BrokerError {
    fn from(err: ConfigError) -> Self {
        BrokerError::Config(err)
    }
}

/// Failure of a fabric configuration source.
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ConfigError {}

/// Failure of the device port snapshot sink.
#[derive(Debug)]
pub struct SnapshotError {
    message: String,
}

impl SnapshotError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for SnapshotError {}
