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

use async_trait::async_trait;
use fibc_broker::{
    Broker, BrokerConfig, DatapathConfig, FabricConfig, MonitorStream, NoopSnapshotSink,
    RouterConfig, RouterPortConfig, StreamError,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const RE_ID: &str = "1.1.1.1";
pub(crate) const DP_ID: u64 = 1234;

pub(crate) fn make_broker(config: BrokerConfig) -> Broker {
    Broker::new(config, Arc::new(NoopSnapshotSink)).expect("broker creation should succeed")
}

/// One router bound to one datapath, with `eth1` on device port 5.
pub(crate) fn single_leaf() -> FabricConfig {
    FabricConfig {
        routers: vec![RouterConfig {
            desc: "leaf-1".to_string(),
            re_id: RE_ID.to_string(),
            datapath: "sw1".to_string(),
            ports: vec![RouterPortConfig {
                name: "eth1".to_string(),
                port: 5,
            }],
        }],
        datapaths: vec![DatapathConfig {
            name: "sw1".to_string(),
            dp_id: DP_ID,
            mode: "generic".to_string(),
        }],
    }
}

/// Monitor stream that keeps every event it is handed.
pub(crate) struct RecordingStream<E> {
    events: Mutex<Vec<E>>,
}

impl<E: Clone> RecordingStream<E> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn events(&self) -> Vec<E> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl<E> MonitorStream<E> for RecordingStream<E>
where
    E: Send + 'static,
{
    async fn send(&self, event: E) -> Result<(), StreamError> {
        self.events.lock().expect("events lock").push(event);
        Ok(())
    }
}

/// Polls `stream` until `done` holds for its events or two seconds pass.
pub(crate) async fn wait_for_events<E, F>(stream: &RecordingStream<E>, done: F) -> Vec<E>
where
    E: Clone,
    F: Fn(&[E]) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let events = stream.events();
        if done(&events) || tokio::time::Instant::now() >= deadline {
            return events;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Yields until `check` holds or two seconds pass.
#[allow(dead_code)]
pub(crate) async fn wait_until<F, Fut>(check: F) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
