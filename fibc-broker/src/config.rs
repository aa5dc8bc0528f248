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

//! Broker tuning and static fabric configuration.

use crate::error::ConfigError;
use crate::message::DeviceId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MESSAGE_QUEUE_SIZE: usize = 64;
pub const DEFAULT_PORT_STATS_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_AUDIT_TIMEOUT_MS: u64 = 3000;

/// Runtime knobs of the broker.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct BrokerConfig {
    /// Capacity of each monitor session's outbound queue.
    pub message_queue_size: usize,
    pub port_stats_timeout_ms: u64,
    pub audit_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            message_queue_size: DEFAULT_MESSAGE_QUEUE_SIZE,
            port_stats_timeout_ms: DEFAULT_PORT_STATS_TIMEOUT_MS,
            audit_timeout_ms: DEFAULT_AUDIT_TIMEOUT_MS,
        }
    }
}

impl BrokerConfig {
    pub fn port_stats_timeout(&self) -> Duration {
        Duration::from_millis(self.port_stats_timeout_ms)
    }

    pub fn audit_timeout(&self) -> Duration {
        Duration::from_millis(self.audit_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_queue_size == 0 {
            return Err(ConfigError::new("message_queue_size must be greater than 0"));
        }
        Ok(())
    }
}

/// Physical port of a router as listed in the fabric configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouterPortConfig {
    pub name: String,
    pub port: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    #[serde(default)]
    pub desc: String,
    pub re_id: String,
    /// Name of the datapath this router is bound to.
    pub datapath: String,
    #[serde(default)]
    pub ports: Vec<RouterPortConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatapathConfig {
    pub name: String,
    pub dp_id: DeviceId,
    #[serde(default)]
    pub mode: String,
}

/// Static description of the fabric: routers, their physical ports and the
/// datapaths they are bound to.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FabricConfig {
    #[serde(default)]
    pub routers: Vec<RouterConfig>,
    #[serde(default)]
    pub datapaths: Vec<DatapathConfig>,
}

impl FabricConfig {
    /// Appends the routers and datapaths of `other`.
    pub fn merge(&mut self, other: FabricConfig) {
        self.routers.extend(other.routers);
        self.datapaths.extend(other.datapaths);
    }

    pub fn datapath(&self, name: &str) -> Option<&DatapathConfig> {
        self.datapaths.iter().find(|dp| dp.name == name)
    }
}

/// Supplier of the static fabric configuration.
#[async_trait]
pub trait FabricConfigSource: Send + Sync {
    async fn fetch_config(&self) -> Result<FabricConfig, ConfigError>;
}
