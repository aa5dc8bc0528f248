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

use std::fmt::{Display, Formatter};

/// One of the four planes attached to the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Plane {
    /// Administrative/observability plane.
    Ap,
    /// Virtual router control plane.
    Vm,
    /// Hardware/driver data plane.
    Dp,
    /// Packet-snooping virtual switch plane.
    Vs,
}

impl Plane {
    pub const ALL: [Plane; 4] = [Plane::Ap, Plane::Vm, Plane::Dp, Plane::Vs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plane::Ap => "ap",
            Plane::Vm => "vm",
            Plane::Dp => "dp",
            Plane::Vs => "vs",
        }
    }
}

impl Display for Plane {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
