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

//! File-backed fabric configuration source and port snapshot sink.

use async_trait::async_trait;
use fibc_broker::message::DeviceId;
use fibc_broker::{
    ConfigError, FabricConfig, FabricConfigSource, PortSnapshotSink, SnapshotError, SnapshotPort,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, canonicalize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const BACKUP_SUFFIXES: &[&str] = &["~", ".bak", ".orig", ".org"];

/// Reads the fabric configuration from one JSON5 file or from every file of a
/// directory, merged in file name order.
pub struct FabricConfigStaticFile {
    static_path: String,
}

impl FabricConfigStaticFile {
    pub fn new(static_path: String) -> Self {
        FabricConfigStaticFile { static_path }
    }
}

fn is_skipped(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(true, |name| {
            name.starts_with('.') || BACKUP_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        })
}

fn read_fabric_file(path: &Path) -> Result<FabricConfig, ConfigError> {
    let data = fs::read_to_string(path)
        .map_err(|e| ConfigError::new(format!("Unable to read {}: {e}", path.display())))?;
    json5::from_str(&data)
        .map_err(|e| ConfigError::new(format!("Unable to parse {}: {e}", path.display())))
}

fn config_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ConfigError::new(format!("Unable to list {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ConfigError::new(format!("Unable to list {}: {e}", dir.display())))?
            .path();
        if !path.is_file() {
            continue;
        }
        if is_skipped(&path) {
            debug!("skipping {path:?}");
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl FabricConfigSource for FabricConfigStaticFile {
    async fn fetch_config(&self) -> Result<FabricConfig, ConfigError> {
        let path = canonicalize(PathBuf::from(&self.static_path)).map_err(|e| {
            ConfigError::new(format!(
                "Fabric config {} not found: {e}",
                self.static_path
            ))
        })?;
        debug!("fabric config path: {path:?}");

        if !path.is_dir() {
            return read_fabric_file(&path);
        }

        let mut config = FabricConfig::default();
        for file in config_files(&path)? {
            debug!("reading fabric config {file:?}");
            config.merge(read_fabric_file(&file)?);
        }
        if config.routers.is_empty() && config.datapaths.is_empty() {
            warn!("no fabric configuration found under {path:?}");
        }
        Ok(config)
    }
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq)]
struct DeviceSnapshot {
    #[serde(default)]
    ports: Vec<SnapshotPort>,
}

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq)]
struct SnapshotDocument {
    #[serde(default)]
    dps: BTreeMap<String, DeviceSnapshot>,
}

/// Keeps the last port description of every device in one JSON document.
pub struct PortSnapshotFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PortSnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PortSnapshotFile {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Ports last stored for `dp_id`, empty when the device was never seen.
    pub async fn ports(&self, dp_id: DeviceId) -> Result<Vec<SnapshotPort>, SnapshotError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load()?;
        Ok(document
            .dps
            .remove(&dp_id.to_string())
            .map(|device| device.ports)
            .unwrap_or_default())
    }

    fn load(&self) -> Result<SnapshotDocument, SnapshotError> {
        if !self.path.exists() {
            return Ok(SnapshotDocument::default());
        }
        let data = fs::read_to_string(&self.path).map_err(|e| {
            SnapshotError::new(format!("Unable to read {}: {e}", self.path.display()))
        })?;
        if data.trim().is_empty() {
            return Ok(SnapshotDocument::default());
        }
        serde_json::from_str(&data).map_err(|e| {
            SnapshotError::new(format!("Unable to parse {}: {e}", self.path.display()))
        })
    }

    fn save(&self, document: &SnapshotDocument) -> Result<(), SnapshotError> {
        let data = serde_json::to_string_pretty(document)
            .map_err(|e| SnapshotError::new(format!("Unable to encode snapshot: {e}")))?;
        // Rename keeps readers from seeing a half-written document.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data)
            .map_err(|e| SnapshotError::new(format!("Unable to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            SnapshotError::new(format!("Unable to replace {}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl PortSnapshotSink for PortSnapshotFile {
    async fn store_ports(
        &self,
        dp_id: DeviceId,
        ports: Vec<SnapshotPort>,
    ) -> Result<(), SnapshotError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load()?;
        debug!("storing {} ports of dp {dp_id}", ports.len());
        document
            .dps
            .insert(dp_id.to_string(), DeviceSnapshot { ports });
        self.save(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::{FabricConfigStaticFile, PortSnapshotFile};
    use fibc_broker::{FabricConfigSource, PortSnapshotSink, SnapshotPort};
    use serde_json::Value;
    use std::fs;
    use tempfile::tempdir;

    const LEAF1: &str = r#"{
        routers: [{ re_id: "1.1.1.1", datapath: "sw1", ports: [{ name: "eth1", port: 1 }] }],
        datapaths: [{ name: "sw1", dp_id: 1234 }],
    }"#;

    const LEAF2: &str = r#"{
        routers: [{ re_id: "2.2.2.2", datapath: "sw2" }],
        datapaths: [{ name: "sw2", dp_id: 5678 }],
    }"#;

    fn port(name: &str, port_no: u32) -> SnapshotPort {
        SnapshotPort {
            name: name.to_string(),
            hw_addr: "00:11:22:33:44:55".to_string(),
            port_no,
        }
    }

    #[tokio::test]
    async fn reads_a_single_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("fabric.json5");
        fs::write(&path, LEAF1).expect("write");

        let source = FabricConfigStaticFile::new(path.display().to_string());
        let config = source.fetch_config().await.expect("config");

        assert_eq!(config.routers.len(), 1);
        assert_eq!(config.datapath("sw1").map(|dp| dp.dp_id), Some(1234));
    }

    #[tokio::test]
    async fn merges_a_directory_and_skips_backups() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("20-leaf2.json5"), LEAF2).expect("write");
        fs::write(dir.path().join("10-leaf1.json5"), LEAF1).expect("write");
        fs::write(dir.path().join("10-leaf1.json5~"), "not json").expect("write");
        fs::write(dir.path().join("30-old.json5.bak"), "not json").expect("write");

        let source = FabricConfigStaticFile::new(dir.path().display().to_string());
        let config = source.fetch_config().await.expect("config");

        let re_ids: Vec<_> = config.routers.iter().map(|r| r.re_id.as_str()).collect();
        assert_eq!(re_ids, vec!["1.1.1.1", "2.2.2.2"]);
        assert_eq!(config.datapaths.len(), 2);
    }

    #[tokio::test]
    async fn missing_or_malformed_files_fail() {
        let dir = tempdir().expect("tempdir");
        let missing = FabricConfigStaticFile::new(
            dir.path().join("absent.json5").display().to_string(),
        );
        assert!(missing.fetch_config().await.is_err());

        let path = dir.path().join("broken.json5");
        fs::write(&path, "{ routers: [ }").expect("write");
        let broken = FabricConfigStaticFile::new(path.display().to_string());
        assert!(broken.fetch_config().await.is_err());
    }

    #[tokio::test]
    async fn snapshot_replaces_only_the_stored_device() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ports.json");
        let sink = PortSnapshotFile::new(&path);

        sink.store_ports(1234, vec![port("eth1", 1), port("eth2", 2)])
            .await
            .expect("stored");
        sink.store_ports(5678, vec![port("eth1", 1)])
            .await
            .expect("stored");
        sink.store_ports(1234, vec![port("eth3", 3)])
            .await
            .expect("stored");

        assert_eq!(sink.ports(1234).await.expect("read"), vec![port("eth3", 3)]);
        assert_eq!(sink.ports(5678).await.expect("read").len(), 1);
        assert!(sink.ports(42).await.expect("read").is_empty());

        let document: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(document["dps"]["1234"]["ports"][0]["name"], "eth3");
        assert_eq!(document["dps"]["1234"]["ports"][0]["port_no"], 3);
    }
}
