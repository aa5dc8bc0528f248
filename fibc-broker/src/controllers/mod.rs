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

//! Per-plane request handlers.
//!
//! Every controller exposes a `monitor` entry point that owns one session for
//! the lifetime of a connection. It registers the session, runs the plane's
//! enter logic, parks on the session's cancellation token and then runs the
//! leave logic once, keyed off [`SessionSet::close`](crate::session::SessionSet::close).
//! The remaining methods are unary handlers.

pub mod ap;
pub mod dp;
pub mod vm;
pub mod vs;

pub use ap::ApController;
pub use dp::DpController;
pub use vm::VmController;
pub use vs::VsController;
