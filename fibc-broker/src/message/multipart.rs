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

//! Multipart (bulk query) request/reply pairs.

use super::DeviceId;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultipartRequestBody {
    /// Per-port counters. An empty `names` list asks for the device default set.
    Port { port_no: u32, names: Vec<String> },
    /// Port descriptions. `internal` marks a request issued by the broker itself.
    PortDesc { internal: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartRequest {
    pub dp_id: DeviceId,
    pub body: MultipartRequestBody,
}

impl MultipartRequest {
    pub fn kind_name(&self) -> &'static str {
        match self.body {
            MultipartRequestBody::Port { .. } => "port",
            MultipartRequestBody::PortDesc { .. } => "port_desc",
        }
    }
}

/// Counters of one device port. Numeric counters go to `values`, textual
/// attributes to `svalues`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortStats {
    pub port_no: u32,
    pub values: BTreeMap<String, u64>,
    pub svalues: BTreeMap<String, String>,
}

/// Description of a device port as reported by the DP plane.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DevicePort {
    pub port_no: u32,
    pub hw_addr: String,
    pub name: String,
    pub state: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultipartReplyBody {
    Port(Vec<PortStats>),
    PortDesc {
        internal: bool,
        ports: Vec<DevicePort>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartReply {
    pub dp_id: DeviceId,
    pub body: MultipartReplyBody,
}

impl MultipartReply {
    pub fn kind_name(&self) -> &'static str {
        match self.body {
            MultipartReplyBody::Port(_) => "port",
            MultipartReplyBody::PortDesc { .. } => "port_desc",
        }
    }
}
