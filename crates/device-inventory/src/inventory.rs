use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use directive_engine::{Collection, ConfigError, DirectiveExport};
use serde::Serialize;

use crate::device::{Device, PublicDevice};

/// All devices of one configuration load, keyed by device id.
#[derive(Debug, Clone, Default)]
pub struct DeviceCollection {
    devices: Collection<Device>,
}

/// One group of the UI catalog.
#[derive(Debug, Clone, Serialize)]
pub struct FrontendGroup {
    pub group: Option<String>,
    pub locations: Vec<Location>,
}

/// A device as the UI presents it.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub group: Option<String>,
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub description: Option<String>,
    pub directives: Vec<DirectiveExport>,
}

impl DeviceCollection {
    /// Rejects duplicate device ids.
    pub fn new(devices: Vec<Device>) -> Result<Self, ConfigError> {
        Ok(Self {
            devices: Collection::new(devices)?,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Device>> {
        self.devices.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn as_collection(&self) -> &Collection<Device> {
        &self.devices
    }

    /// Device names, in configuration order.
    pub fn hostnames(&self) -> Vec<&str> {
        self.iter().map(|d| d.name()).collect()
    }

    /// Distinct groups in order of first appearance. Devices without a
    /// group are not represented.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for group in self.iter().filter_map(|d| d.group()) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    /// Devices in `group` (`None` selects ungrouped devices).
    pub fn by_group(&self, group: Option<&str>) -> Vec<&Arc<Device>> {
        self.iter().filter(|d| d.group() == group).collect()
    }

    /// Look a device up by id, falling back to its name.
    pub fn find(&self, id_or_name: &str) -> Option<&Arc<Device>> {
        self.get(id_or_name)
            .or_else(|| self.iter().find(|d| d.name() == id_or_name))
    }

    pub fn valid_id_or_name(&self, value: &str) -> bool {
        self.find(value).is_some()
    }

    /// Every plugin in use, mapped to the ids of the directives using it.
    pub fn directive_plugins(&self) -> BTreeMap<PathBuf, Vec<String>> {
        let mut result: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();
        for directive in self.iter().flat_map(|d| d.directives().iter()) {
            for plugin in directive.plugins() {
                result
                    .entry(plugin.clone())
                    .or_default()
                    .insert(directive.id().to_string());
            }
        }
        result
            .into_iter()
            .map(|(path, ids)| (path, ids.into_iter().collect()))
            .collect()
    }

    /// `[{id, name, group}]` for every device; no addresses or credentials.
    pub fn export_public_inventory(&self) -> Vec<PublicDevice> {
        self.iter().map(|d| d.export_api()).collect()
    }

    /// Devices grouped for the UI, each with its directives' public
    /// descriptions. Groups appear in order of first appearance.
    pub fn export_frontend_catalog(&self) -> Vec<FrontendGroup> {
        let mut groups: Vec<Option<&str>> = Vec::new();
        for device in self.iter() {
            if !groups.contains(&device.group()) {
                groups.push(device.group());
            }
        }

        groups
            .into_iter()
            .map(|group| FrontendGroup {
                group: group.map(str::to_string),
                locations: self
                    .by_group(group)
                    .into_iter()
                    .map(|device| Location {
                        group: group.map(str::to_string),
                        id: device.id().to_string(),
                        name: device.name().to_string(),
                        avatar: device.avatar_url(),
                        description: device.description().map(str::to_string),
                        directives: device.directives().iter().map(|d| d.export()).collect(),
                    })
                    .collect(),
            })
            .collect()
    }
}
