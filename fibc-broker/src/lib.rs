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

//! # fibc-broker
//!
//! Control-plane broker of a white-box switch fabric. Four planes attach to it
//! over long-lived monitor streams plus unary requests:
//!
//! - **VM**: virtual router instances, identified by a router id (`re_id`).
//! - **DP**: hardware/driver data planes, identified by a device id (`dp_id`).
//! - **VS**: the packet-snooping virtual switch, identified by a device id.
//! - **AP**: administrative clients reading tables, statistics and logs.
//!
//! The broker keeps every plane's port numbering bound to one logical port,
//! rewrites flow/group programming and port events between numbering domains,
//! and correlates request/reply pairs that cross planes.
//!
//! ## Layout
//!
//! | module | role |
//! |---|---|
//! | [`store`] | router/device identities, cross-plane port bindings, reconciliation |
//! | [`translate`] | port and device rewriting between planes |
//! | [`correlation`] | pending-reply waiters keyed by transaction id |
//! | [`session`] | per-identity monitor sessions and their delivery tasks |
//! | [`controllers`] | one request handler per plane |
//! | [`broker`] | shared context and the [`Broker`] façade |
//!
//! Transport listeners are not part of this crate. An adapter calls the
//! controller entry points and implements [`MonitorStream`] for each plane.
//!
//! ## Observability
//!
//! Every `tracing` event carries `event` (a name from
//! [`observability::events`]) and `component`. The crate never installs a
//! subscriber; [`Broker::ap_log_layer`] returns a layer that copies events to
//! connected AP monitors. Request counters live in a [`StatsTable`].
//!
//! ```
//! use fibc_broker::{
//!     Broker, BrokerConfig, DatapathConfig, FabricConfig, NoopSnapshotSink, RouterConfig,
//!     RouterPortConfig,
//! };
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let broker = Broker::new(BrokerConfig::default(), Arc::new(NoopSnapshotSink)).unwrap();
//! let fabric = FabricConfig {
//!     routers: vec![RouterConfig {
//!         desc: "leaf-1".to_string(),
//!         re_id: "1.1.1.1".to_string(),
//!         datapath: "sw1".to_string(),
//!         ports: vec![RouterPortConfig {
//!             name: "eth1".to_string(),
//!             port: 5,
//!         }],
//!     }],
//!     datapaths: vec![DatapathConfig {
//!         name: "sw1".to_string(),
//!         dp_id: 1234,
//!         mode: "generic".to_string(),
//!     }],
//! };
//!
//! broker.reconcile(&fabric).await;
//! assert_eq!(
//!     broker.context().store().lookup_device_by_router("1.1.1.1"),
//!     Some(1234)
//! );
//! assert!(broker.vm().hello("1.1.1.1").await.is_ok());
//! # });
//! ```

pub mod broker;
pub mod config;
pub mod controllers;
pub mod correlation;
pub mod error;
pub mod message;
pub mod observability;
mod plane;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod translate;

pub use broker::{Broker, BrokerContext};
pub use config::{
    BrokerConfig, DatapathConfig, FabricConfig, FabricConfigSource, RouterConfig,
    RouterPortConfig,
};
pub use controllers::{ApController, DpController, VmController, VsController};
pub use error::{BrokerError, ConfigError, SnapshotError};
pub use observability::ApLogLayer;
pub use plane::Plane;
pub use session::{Delivery, DropReason, MonitorStream, SessionEntry, StreamError};
pub use snapshot::{NoopSnapshotSink, PortSnapshotSink, SnapshotPort};
pub use stats::{StatsEntry, StatsTable};
