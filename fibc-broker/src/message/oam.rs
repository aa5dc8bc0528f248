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

//! Fabric audit (OAM) request/reply pairs.

use super::DeviceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OamRequestBody {
    AuditRouteCnt,
}

/// Audit request pushed to a plane. `dp_id` is the addressed device, `0` for
/// router instances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OamRequest {
    pub dp_id: DeviceId,
    pub body: OamRequestBody,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OamReplyBody {
    AuditRouteCnt { count: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OamReply {
    pub dp_id: DeviceId,
    pub re_id: String,
    pub body: OamReplyBody,
}

impl OamReply {
    pub fn route_count(&self) -> u64 {
        match self.body {
            OamReplyBody::AuditRouteCnt { count } => count,
        }
    }
}
