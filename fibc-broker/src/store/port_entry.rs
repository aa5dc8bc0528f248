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

//! Port binding rows of the identity/port store.

use crate::message::DeviceId;
use std::fmt::{Display, Formatter};

/// Logical port as named on the VM plane.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortKey {
    pub re_id: String,
    pub ifname: String,
}

impl PortKey {
    pub fn new(re_id: impl Into<String>, ifname: impl Into<String>) -> Self {
        Self {
            re_id: re_id.into(),
            ifname: ifname.into(),
        }
    }
}

impl Display for PortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.re_id, self.ifname)
    }
}

/// One plane's view of a port. `port_id == 0` means unassigned.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PortView<I> {
    pub id: I,
    pub port_id: u32,
    pub entered: bool,
}

/// VM-plane view, owned by a router identity.
pub type VmPortView = PortView<String>;

/// DP- or VS-plane view, owned by a device identity.
pub type DevicePortView = PortView<DeviceId>;

impl<I: Clone + Default + PartialEq> PortView<I> {
    pub fn new(id: I, port_id: u32, entered: bool) -> Self {
        Self {
            id,
            port_id,
            entered,
        }
    }

    /// Rebinds the port number. Returns true when it changed.
    pub fn update_port(&mut self, port_id: u32) -> bool {
        if self.port_id == port_id {
            return false;
        }
        self.port_id = port_id;
        true
    }

    /// Rebinds owner and port number. Returns true when either changed.
    pub fn update(&mut self, id: I, port_id: u32) -> bool {
        let id_changed = if self.id != id {
            self.id = id;
            true
        } else {
            false
        };
        self.update_port(port_id) || id_changed
    }

    /// Returns true when the flag changed.
    pub fn set_entered(&mut self, entered: bool) -> bool {
        if self.entered == entered {
            return false;
        }
        self.entered = entered;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_bound(&self) -> bool {
        self.port_id != 0
    }

    pub fn is_associated(&self) -> bool {
        self.entered
    }
}

/// Cross-plane binding of one logical port.
///
/// `vs_view` is present only on ports that come from static configuration,
/// which makes it the marker of a physical port. Ports created by a router
/// at runtime (VLAN, tunnel, bridge...) have none and inherit the DP binding
/// of the port named by `parent_key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortEntry {
    pub key: PortKey,
    pub parent_key: Option<PortKey>,
    pub master_key: Option<PortKey>,
    pub vm_view: VmPortView,
    pub dp_view: Option<DevicePortView>,
    pub vs_view: Option<DevicePortView>,
    pub(crate) version: u64,
}

impl PortEntry {
    pub fn new(key: PortKey) -> Self {
        let vm_view = VmPortView::new(key.re_id.clone(), 0, false);
        Self {
            key,
            parent_key: None,
            master_key: None,
            vm_view,
            dp_view: None,
            vs_view: None,
            version: 0,
        }
    }

    /// Config-owned physical port bound to `dp_id`/`dp_port`, nothing entered.
    pub fn physical(key: PortKey, dp_id: DeviceId, dp_port: u32) -> Self {
        Self {
            dp_view: Some(DevicePortView::new(dp_id, dp_port, false)),
            vs_view: Some(DevicePortView::default()),
            ..Self::new(key)
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.vs_view.is_none()
    }

    /// VM and DP views are entered. The VS view only counts once a VS port
    /// has been discovered for it.
    pub fn is_associated(&self) -> bool {
        self.vm_view.is_associated()
            && self.dp_view.as_ref().map_or(true, PortView::is_associated)
            && self
                .vs_view
                .as_ref()
                .filter(|view| view.is_bound())
                .map_or(true, PortView::is_associated)
    }

    /// Epoch in which reconciliation last touched this entry.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::{DevicePortView, PortEntry, PortKey, VmPortView};

    #[test]
    fn port_view_updates_report_changes_only() {
        let mut view = VmPortView::new("1.1.1.1".to_string(), 0, false);

        assert!(view.update_port(5));
        assert!(!view.update_port(5));
        assert!(view.set_entered(true));
        assert!(!view.set_entered(true));
        assert!(view.update("2.2.2.2".to_string(), 5));
        assert!(!view.update("2.2.2.2".to_string(), 5));

        view.reset();
        assert_eq!(view, VmPortView::default());
    }

    #[test]
    fn physical_entry_needs_vm_and_dp_entered() {
        let mut entry = PortEntry::physical(PortKey::new("1.1.1.1", "eth1"), 1234, 5);
        assert!(!entry.is_virtual());
        assert!(!entry.is_associated());

        entry.vm_view.set_entered(true);
        assert!(!entry.is_associated());

        if let Some(view) = entry.dp_view.as_mut() {
            view.set_entered(true);
        }
        assert!(entry.is_associated());
    }

    #[test]
    fn bound_vs_view_must_be_entered() {
        let mut entry = PortEntry::physical(PortKey::new("1.1.1.1", "eth1"), 1234, 5);
        entry.vm_view.set_entered(true);
        if let Some(view) = entry.dp_view.as_mut() {
            view.set_entered(true);
        }

        entry.vs_view = Some(DevicePortView::new(99, 3, false));
        assert!(!entry.is_associated());

        entry.vs_view = Some(DevicePortView::new(99, 3, true));
        assert!(entry.is_associated());
    }

    #[test]
    fn virtual_entry_only_needs_existing_views() {
        let mut entry = PortEntry::new(PortKey::new("1.1.1.1", "eth1.10"));
        assert!(entry.is_virtual());

        entry.vm_view.set_entered(true);
        assert!(entry.is_associated());
    }
}
