use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directive_engine::loader::{load_directives, load_directives_from_str, LoadOptions};
use directive_engine::{Collection, ConfigError, Directive};
use host_resolver::Resolver;
use serde::Deserialize;
use tracing::info;

use crate::device::{BuildContext, Device, RawDevice};
use crate::error::DeviceError;
use crate::inventory::DeviceCollection;
use crate::platform::PlatformRegistry;
use crate::proxy::{Proxy, RawProxy};
use crate::snapshot::Snapshot;

/// Top-level layout of a devices YAML file.
#[derive(Debug, Default, Deserialize)]
pub struct DeviceFile {
    #[serde(default)]
    pub devices: Vec<RawDevice>,
    #[serde(default)]
    pub proxies: Vec<RawProxy>,
}

/// Where a snapshot's configuration lives on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFiles {
    pub devices_file: PathBuf,
    pub directives_file: PathBuf,
    pub plugin_dir: Option<PathBuf>,
    pub include_builtins: bool,
}

/// Parse a devices file from a YAML string.
pub fn parse_devices(yaml: &str) -> Result<DeviceFile> {
    if yaml.trim().is_empty() {
        return Ok(DeviceFile::default());
    }
    serde_yml::from_str(yaml).context("YAML deserialization failed")
}

/// Validate every proxy and device against the directive catalog.
pub fn build_inventory(
    file: DeviceFile,
    catalog: &Collection<Directive>,
    registry: &dyn PlatformRegistry,
    resolver: &dyn Resolver,
    base_dir: Option<&Path>,
) -> Result<DeviceCollection, DeviceError> {
    let mut proxies: HashMap<String, Arc<Proxy>> = HashMap::new();
    for raw in file.proxies {
        let proxy = Proxy::build(raw, resolver)?;
        if proxies.contains_key(proxy.name()) {
            return Err(ConfigError::DuplicateKey {
                kind: "proxy",
                key: proxy.name().to_string(),
            }
            .into());
        }
        proxies.insert(proxy.name().to_string(), Arc::new(proxy));
    }

    let ctx = BuildContext {
        catalog,
        registry,
        resolver,
        proxies: &proxies,
        base_dir,
    };
    let devices = file
        .devices
        .into_iter()
        .map(|raw| Device::build(raw, &ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let inventory = DeviceCollection::new(devices)?;
    info!(
        devices = inventory.len(),
        proxies = proxies.len(),
        groups = inventory.groups().len(),
        "device inventory built"
    );
    Ok(inventory)
}

/// Build a snapshot from in-memory YAML documents.
pub fn snapshot_from_str(
    directives_yaml: &str,
    devices_yaml: &str,
    options: &LoadOptions,
    registry: &dyn PlatformRegistry,
    resolver: &dyn Resolver,
) -> Result<Snapshot> {
    let catalog = load_directives_from_str(directives_yaml, options)?;
    let file = parse_devices(devices_yaml)?;
    let devices = build_inventory(file, &catalog, registry, resolver, options.base_dir.as_deref())?;
    Ok(Snapshot::new(catalog, devices))
}

/// Load both configuration files and build a snapshot.
///
/// Nothing is returned unless every directive and device validated.
pub fn load_snapshot(
    files: &SnapshotFiles,
    registry: &dyn PlatformRegistry,
    resolver: &dyn Resolver,
) -> Result<Snapshot> {
    let options = LoadOptions {
        base_dir: None,
        plugin_dir: files.plugin_dir.clone(),
        include_builtins: files.include_builtins,
    };
    let catalog = load_directives(&files.directives_file, &options)?;

    let path = &files.devices_file;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read devices file: {}", path.display()))?;
    let file = parse_devices(&contents)
        .with_context(|| format!("failed to load devices file: {}", path.display()))?;
    let devices = build_inventory(file, &catalog, registry, resolver, path.parent())
        .with_context(|| format!("invalid device configuration in {}", path.display()))?;

    Ok(Snapshot::new(catalog, devices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StaticRegistry;
    use host_resolver::StaticResolver;

    #[test]
    fn empty_devices_document() {
        let file = parse_devices("").unwrap();
        assert!(file.devices.is_empty());
        assert!(file.proxies.is_empty());
    }

    #[test]
    fn duplicate_proxy_names_are_rejected() {
        let file = parse_devices(
            r#"
proxies:
  - name: jump
    address: 192.0.2.10
    credential: {username: u, password: p}
  - name: jump
    address: 192.0.2.11
    credential: {username: u, password: p}
"#,
        )
        .unwrap();
        let err = build_inventory(
            file,
            &Collection::default(),
            &StaticRegistry::builtin(),
            &StaticResolver::new(),
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "duplicate proxy id 'jump'");
    }

    #[test]
    fn load_snapshot_reports_the_failing_file() {
        let dir = tempfile::tempdir().unwrap();
        let directives_file = dir.path().join("directives.yaml");
        std::fs::write(&directives_file, "directives: []\n").unwrap();

        let files = SnapshotFiles {
            devices_file: dir.path().join("missing.yaml"),
            directives_file,
            plugin_dir: None,
            include_builtins: false,
        };
        let err = load_snapshot(&files, &StaticRegistry::builtin(), &StaticResolver::new())
            .unwrap_err();
        assert!(
            err.to_string().contains("failed to read devices file"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn load_snapshot_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let directives_file = dir.path().join("directives.yaml");
        let devices_file = dir.path().join("devices.yaml");
        std::fs::write(
            &directives_file,
            "directives:\n  - id: ping\n    name: Ping\n    rules:\n      - condition: \"*\"\n        command: \"ping {target}\"\n",
        )
        .unwrap();
        std::fs::write(
            &devices_file,
            "devices:\n  - name: core1\n    address: 192.0.2.1\n    platform: cisco_ios\n    directives: [ping]\n",
        )
        .unwrap();

        let files = SnapshotFiles {
            devices_file,
            directives_file,
            plugin_dir: None,
            include_builtins: true,
        };
        let snapshot =
            load_snapshot(&files, &StaticRegistry::builtin(), &StaticResolver::new()).unwrap();
        let core1 = snapshot.devices().get("core1").unwrap();
        assert_eq!(core1.directive_ids()[0], "ping");
        assert!(core1.directive_ids().contains(&"__cisco_ios_ping__"));
    }
}
