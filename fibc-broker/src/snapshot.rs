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

//! Write-only sink for the port descriptions reported by data planes.

use crate::error::SnapshotError;
use crate::message::DeviceId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One port of a device as persisted in the snapshot.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotPort {
    pub name: String,
    pub hw_addr: String,
    pub port_no: u32,
}

#[async_trait]
pub trait PortSnapshotSink: Send + Sync {
    /// Replaces the stored ports of `dp_id`.
    async fn store_ports(&self, dp_id: DeviceId, ports: Vec<SnapshotPort>)
        -> Result<(), SnapshotError>;
}

/// Sink that discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSnapshotSink;

#[async_trait]
impl PortSnapshotSink for NoopSnapshotSink {
    async fn store_ports(
        &self,
        _dp_id: DeviceId,
        _ports: Vec<SnapshotPort>,
    ) -> Result<(), SnapshotError> {
        Ok(())
    }
}
