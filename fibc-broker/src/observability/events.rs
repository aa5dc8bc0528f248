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

//! Canonical structured event names used across `fibc-broker`.

// Monitor session lifecycle and delivery events.
pub const SESSION_OPEN: &str = "session_open";
pub const SESSION_DUPLICATE: &str = "session_duplicate";
pub const SESSION_CLOSE: &str = "session_close";
pub const SESSION_ENTER_FAILED: &str = "session_enter_failed";
pub const DELIVERY_SEND_OK: &str = "delivery_send_ok";
pub const DELIVERY_SEND_FAILED: &str = "delivery_send_failed";
pub const DELIVERY_DROPPED: &str = "delivery_dropped";
pub const DELIVERY_LOOP_EXIT: &str = "delivery_loop_exit";

// Identity/port store events.
pub const IDENTITY_BIND: &str = "identity_bind";
pub const IDENTITY_CONFLICT: &str = "identity_conflict";
pub const PORT_REGISTER: &str = "port_register";
pub const PORT_UNREGISTER: &str = "port_unregister";
pub const PORT_PARENT_CHAIN_BROKEN: &str = "port_parent_chain_broken";
pub const RECONCILE_START: &str = "reconcile_start";
pub const RECONCILE_OK: &str = "reconcile_ok";
pub const RECONCILE_DATAPATH_MISSING: &str = "reconcile_datapath_missing";
pub const RECONCILE_GC_PORT: &str = "reconcile_gc_port";
pub const RECONCILE_GC_IDENTITY: &str = "reconcile_gc_identity";

// Translation events.
pub const TRANSLATE_OK: &str = "translate_ok";
pub const TRANSLATE_FAILED: &str = "translate_failed";
pub const TRANSLATE_NO_EFFECT: &str = "translate_no_effect";
pub const TRANSLATE_L2ADDR_SKIPPED: &str = "translate_l2addr_skipped";

// Correlation events.
pub const WAITER_REGISTER: &str = "waiter_register";
pub const WAITER_RESOLVE: &str = "waiter_resolve";
pub const WAITER_RESOLVE_UNKNOWN: &str = "waiter_resolve_unknown";
pub const WAITER_TIMEOUT: &str = "waiter_timeout";
pub const WAITER_UNEXPECTED_SOURCE: &str = "waiter_unexpected_source";
pub const AUDIT_ROUTE_COUNT_OK: &str = "audit_route_count_ok";
pub const AUDIT_ROUTE_COUNT_MISMATCH: &str = "audit_route_count_mismatch";

// Controller events.
pub const HELLO: &str = "hello";
pub const HELLO_REJECTED: &str = "hello_rejected";
pub const PORT_CONFIG: &str = "port_config";
pub const PORT_CONFIG_FAILED: &str = "port_config_failed";
pub const PORT_ENTER: &str = "port_enter";
pub const PORT_LEAVE: &str = "port_leave";
pub const PORT_ENTER_FAILED: &str = "port_enter_failed";
pub const PORT_STATUS_SEND: &str = "port_status_send";
pub const PORT_STATUS_NOT_ASSOCIATED: &str = "port_status_not_associated";
pub const FORWARD_OK: &str = "forward_ok";
pub const FORWARD_FAILED: &str = "forward_failed";
pub const PLANE_ENTER: &str = "plane_enter";
pub const PLANE_LEAVE: &str = "plane_leave";
pub const MULTIPART_REPLY: &str = "multipart_reply";
pub const PORT_SNAPSHOT_FAILED: &str = "port_snapshot_failed";
pub const OAM_REPLY: &str = "oam_reply";
pub const UNSUPPORTED_KIND: &str = "unsupported_kind";

// Broker and administrative events.
pub const BROKER_START: &str = "broker_start";
pub const RELOAD_FAILED: &str = "reload_failed";
pub const PORT_STATS_REQUEST: &str = "port_stats_request";
pub const PORT_STATS_FAILED: &str = "port_stats_failed";
pub const AUDIT_REQUEST: &str = "audit_request";
pub const AUDIT_FAILED: &str = "audit_failed";
