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

//! Rewriting of port and device references between plane numbering domains.
//!
//! Port `0` stands for the whole device: converting it only resolves the
//! owning identity and never touches the port table.

mod flow;
mod group;
mod l2addr;

use crate::message::DeviceId;
use crate::store::{IdentityPortStore, PortEntry, ViewKey};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The binding a translation needed and did not find.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Router(String),
    Device(DeviceId),
    VmPort { re_id: String, port_id: u32 },
    DpPort { dp_id: DeviceId, port_id: u32 },
    VsPort { vs_id: DeviceId, port_id: u32 },
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Router(re_id) => write!(f, "re_id {re_id}"),
            Binding::Device(dp_id) => write!(f, "dp_id {dp_id}"),
            Binding::VmPort { re_id, port_id } => write!(f, "vm port {re_id}/{port_id}"),
            Binding::DpPort { dp_id, port_id } => write!(f, "dp port {dp_id}/{port_id}"),
            Binding::VsPort { vs_id, port_id } => write!(f, "vs port {vs_id}/{port_id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslateError {
    BindingNotFound(Binding),
    /// The message would not change anything on the target plane.
    NoEffect,
}

impl TranslateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TranslateError::BindingNotFound(_))
    }
}

impl Display for TranslateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::BindingNotFound(binding) => write!(f, "{binding} not found"),
            TranslateError::NoEffect => f.write_str("no effect"),
        }
    }
}

impl Error for TranslateError {}

pub type TranslateResult<T> = Result<T, TranslateError>;

/// Read-only converter over one store.
#[derive(Clone, Copy)]
pub struct Translator<'a> {
    store: &'a IdentityPortStore,
}

impl<'a> Translator<'a> {
    pub fn new(store: &'a IdentityPortStore) -> Self {
        Self { store }
    }

    pub fn router_to_device(&self, re_id: &str) -> TranslateResult<DeviceId> {
        self.store
            .lookup_device_by_router(re_id)
            .ok_or_else(|| TranslateError::BindingNotFound(Binding::Router(re_id.to_string())))
    }

    pub fn device_to_router(&self, dp_id: DeviceId) -> TranslateResult<String> {
        self.store
            .lookup_router_by_device(dp_id)
            .ok_or(TranslateError::BindingNotFound(Binding::Device(dp_id)))
    }

    /// VM port of `re_id` to the DP port carrying it.
    pub async fn vm_port_to_dp(
        &self,
        re_id: &str,
        port_id: u32,
    ) -> TranslateResult<(DeviceId, u32)> {
        if port_id == 0 {
            return Ok((self.router_to_device(re_id)?, 0));
        }
        let not_found = || {
            TranslateError::BindingNotFound(Binding::VmPort {
                re_id: re_id.to_string(),
                port_id,
            })
        };
        let entry = self
            .store
            .lookup_by_view(&ViewKey::vm(re_id, port_id))
            .await
            .ok_or_else(not_found)?;
        entry
            .dp_view
            .filter(|view| view.is_bound())
            .map(|view| (view.id, view.port_id))
            .ok_or_else(not_found)
    }

    /// DP port to the entry bound to it.
    pub async fn dp_port_entry(&self, dp_id: DeviceId, port_id: u32) -> TranslateResult<PortEntry> {
        self.store
            .lookup_by_view(&ViewKey::dp(dp_id, port_id))
            .await
            .ok_or(TranslateError::BindingNotFound(Binding::DpPort { dp_id, port_id }))
    }

    /// DP port to the VM port of the router owning it.
    pub async fn dp_port_to_vm(
        &self,
        dp_id: DeviceId,
        port_id: u32,
    ) -> TranslateResult<(String, u32)> {
        if port_id == 0 {
            return Ok((self.device_to_router(dp_id)?, 0));
        }
        let entry = self.dp_port_entry(dp_id, port_id).await?;
        if !entry.vm_view.is_bound() {
            return Err(TranslateError::BindingNotFound(Binding::DpPort {
                dp_id,
                port_id,
            }));
        }
        Ok((entry.vm_view.id, entry.vm_view.port_id))
    }

    /// DP port to the VS port snooping it.
    pub async fn dp_port_to_vs(
        &self,
        dp_id: DeviceId,
        port_id: u32,
    ) -> TranslateResult<(DeviceId, u32)> {
        self.dp_port_entry(dp_id, port_id)
            .await?
            .vs_view
            .filter(|view| view.is_bound())
            .map(|view| (view.id, view.port_id))
            .ok_or(TranslateError::BindingNotFound(Binding::DpPort { dp_id, port_id }))
    }

    /// VS port to the DP port it snoops.
    pub async fn vs_port_to_dp(
        &self,
        vs_id: DeviceId,
        port_id: u32,
    ) -> TranslateResult<(DeviceId, u32)> {
        let not_found = TranslateError::BindingNotFound(Binding::VsPort { vs_id, port_id });
        let Some(entry) = self.store.lookup_by_view(&ViewKey::vs(vs_id, port_id)).await else {
            return Err(not_found);
        };
        entry
            .dp_view
            .filter(|view| view.is_bound())
            .map(|view| (view.id, view.port_id))
            .ok_or(not_found)
    }
}
