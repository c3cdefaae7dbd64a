use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directive_engine::{Collection, ConfigError, Directive, Keyed};
use host_resolver::{resolve_address, DeviceAddress, Resolver};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::DeviceError;
use crate::identity::derive_id;
use crate::platform::{Driver, PlatformRegistry};
use crate::proxy::{Proxy, RawProxy};
use crate::vrf::{RawVrf, Vrf};

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// A device record as written by the operator, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDevice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Legacy presentation name; when present it replaces `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar: Option<PathBuf>,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default, alias = "nos")]
    pub platform: Option<String>,
    #[serde(default)]
    pub credential: Option<Credential>,
    #[serde(default)]
    pub proxy: Option<ProxyRef>,
    #[serde(default)]
    pub structured_output: Option<bool>,
    #[serde(default)]
    pub directives: Vec<DirectiveRef>,
    #[serde(default)]
    pub driver: Option<Driver>,
    #[serde(default)]
    pub driver_config: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub vrfs: Vec<RawVrf>,
}

fn default_port() -> u16 {
    22
}

/// A device's proxy: the name of a shared `proxies:` entry, or an inline
/// definition used by this device alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProxyRef {
    Named(String),
    Inline(RawProxy),
}

/// One entry of a device's `directives` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DirectiveRef {
    /// A catalog directive attached by id.
    Id(String),
    Options(DirectiveOptions),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectiveOptions {
    #[serde(default)]
    pub builtins: BuiltinSelection,
}

/// Which platform-applicable builtin directives a device receives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BuiltinSelection {
    /// `true`: all of them; `false`: none.
    All(bool),
    /// Only those whose id or name is listed.
    Only(Vec<String>),
}

impl Default for BuiltinSelection {
    fn default() -> Self {
        Self::All(true)
    }
}

// ---------------------------------------------------------------------------
// Build context
// ---------------------------------------------------------------------------

/// Everything a device needs from the rest of the configuration.
pub struct BuildContext<'a> {
    pub catalog: &'a Collection<Directive>,
    pub registry: &'a dyn PlatformRegistry,
    pub resolver: &'a dyn Resolver,
    /// Named proxies from the `proxies:` section.
    pub proxies: &'a HashMap<String, Arc<Proxy>>,
    /// Anchor for relative `avatar` paths.
    pub base_dir: Option<&'a Path>,
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// A validated device with its resolved directive set.
///
/// Immutable after [`Device::build`]; every placeholder used by its
/// directives is known to be satisfiable from `attrs`.
#[derive(Debug)]
pub struct Device {
    id: String,
    name: String,
    description: Option<String>,
    avatar: Option<PathBuf>,
    address: DeviceAddress,
    port: u16,
    group: Option<String>,
    platform: String,
    device_type: String,
    credential: Option<Credential>,
    proxy: Option<Arc<Proxy>>,
    structured_output: bool,
    directives: Collection<Directive>,
    driver: Driver,
    driver_config: BTreeMap<String, serde_json::Value>,
    attrs: BTreeMap<String, String>,
    vrfs: Vec<Vrf>,
}

impl Keyed for Device {
    const KIND: &'static str = "device";

    fn key(&self) -> &str {
        &self.id
    }
}

/// Public, credential- and address-free view of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicDevice {
    pub id: String,
    pub name: String,
    pub group: Option<String>,
}

impl Device {
    pub fn build(raw: RawDevice, ctx: &BuildContext<'_>) -> Result<Self, DeviceError> {
        let (id, name) = identity(&raw)?;

        let address =
            resolve_address(&raw.address, ctx.resolver).map_err(|source| DeviceError::Address {
                device: name.clone(),
                source,
            })?;

        let raw_platform = raw
            .platform
            .as_deref()
            .ok_or_else(|| DeviceError::MissingPlatform {
                device: name.clone(),
            })?;
        let platform = ctx.registry.normalize(raw_platform).ok_or_else(|| {
            DeviceError::UnsupportedDevice {
                device: name.clone(),
                platform: raw_platform.to_string(),
            }
        })?;
        let caps = ctx
            .registry
            .capabilities(&platform)
            .ok_or_else(|| DeviceError::UnsupportedDevice {
                device: name.clone(),
                platform: platform.clone(),
            })?;

        let structured_output = match raw.structured_output {
            Some(true) if !caps.structured_output => {
                return Err(DeviceError::StructuredOutputUnsupported {
                    device: name,
                    platform,
                })
            }
            Some(enabled) => enabled,
            None => caps.structured_output,
        };

        let driver = match raw.driver {
            Some(driver) if !caps.supports_driver(driver) => {
                return Err(DeviceError::UnsupportedDriver {
                    device: name,
                    platform,
                    driver: driver.to_string(),
                })
            }
            Some(driver) => driver,
            None => caps.driver,
        };

        let proxy = match raw.proxy {
            Some(ProxyRef::Named(proxy)) => match ctx.proxies.get(&proxy) {
                Some(shared) => Some(Arc::clone(shared)),
                None => return Err(DeviceError::UnknownProxy { device: name, proxy }),
            },
            Some(ProxyRef::Inline(inline)) => Some(Arc::new(Proxy::build(inline, ctx.resolver)?)),
            None => None,
        };

        let avatar = match raw.avatar {
            Some(path) => {
                let path = match ctx.base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path,
                };
                if !path.is_file() {
                    return Err(DeviceError::MissingAvatar { device: name, path });
                }
                Some(path)
            }
            None => None,
        };

        let directives = resolve_directives(
            &raw.directives,
            ctx.catalog,
            &platform,
            structured_output,
        )?;
        check_attrs(&name, &directives, &raw.attrs)?;

        let vrfs = raw
            .vrfs
            .into_iter()
            .map(|vrf| Vrf::build(vrf, &name))
            .collect::<Result<Vec<_>, _>>()?;

        let device_type = if caps.linux {
            "linux_ssh".to_string()
        } else {
            platform.clone()
        };

        debug!(
            device = %id,
            %platform,
            %driver,
            structured_output,
            directives = directives.len(),
            "device built"
        );

        Ok(Self {
            id,
            name,
            description: raw.description,
            avatar,
            address,
            port: raw.port,
            group: raw.group,
            platform,
            device_type,
            credential: raw.credential,
            proxy,
            structured_output,
            directives,
            driver,
            driver_config: raw.driver_config,
            attrs: raw.attrs,
            vrfs,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn avatar(&self) -> Option<&Path> {
        self.avatar.as_deref()
    }

    /// Public URL of the avatar image, served from `/images/`.
    pub fn avatar_url(&self) -> Option<String> {
        let file_name = self.avatar.as_ref()?.file_name()?;
        Some(format!("/images/{}", file_name.to_string_lossy()))
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Canonical platform identifier.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Device type handed to the execution driver: `linux_ssh` for
    /// Linux-hosted routing daemons, otherwise the platform.
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn proxy(&self) -> Option<&Arc<Proxy>> {
        self.proxy.as_ref()
    }

    pub fn structured_output(&self) -> bool {
        self.structured_output
    }

    pub fn directives(&self) -> &Collection<Directive> {
        &self.directives
    }

    pub fn directive_ids(&self) -> Vec<&str> {
        self.directives.keys().collect()
    }

    /// Whether any of `ids` is attached to this device.
    pub fn has_directives(&self, ids: &[&str]) -> bool {
        ids.iter().any(|id| self.directives.contains(id))
    }

    /// Every command template of every attached directive.
    pub fn directive_commands(&self) -> Vec<&str> {
        self.directives
            .iter()
            .flat_map(|directive| directive.commands())
            .collect()
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn driver_config(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.driver_config
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn vrfs(&self) -> &[Vrf] {
        &self.vrfs
    }

    pub fn export_api(&self) -> PublicDevice {
        PublicDevice {
            id: self.id.clone(),
            name: self.name.clone(),
            group: self.group.clone(),
        }
    }
}

/// Work out `(id, name)`, migrating the legacy `display_name` field.
fn identity(raw: &RawDevice) -> Result<(String, String), DeviceError> {
    let name = match (&raw.display_name, &raw.name) {
        (Some(display_name), _) => {
            warn!(
                display_name = %display_name,
                "the 'display_name' field is deprecated; use 'name' instead"
            );
            display_name.clone()
        }
        (None, Some(name)) => name.clone(),
        (None, None) => return Err(DeviceError::MissingName),
    };
    if name.trim().is_empty() {
        return Err(DeviceError::MissingName);
    }

    let id = match &raw.id {
        Some(id) => id.clone(),
        None => derive_id(&name),
    };
    if id.is_empty() {
        return Err(ConfigError::EmptyField {
            kind: "device",
            field: "id",
        }
        .into());
    }
    Ok((id, name))
}

/// Resolve a device's directive references against the catalog.
///
/// Explicit ids come first, followed by the selected builtins that apply
/// to the device's platform and output mode. Builtins are only reachable
/// through the `builtins` selection; an explicit id naming one is skipped.
fn resolve_directives(
    refs: &[DirectiveRef],
    catalog: &Collection<Directive>,
    platform: &str,
    structured_output: bool,
) -> Result<Collection<Directive>, ConfigError> {
    let mut explicit_ids: Vec<&str> = Vec::new();
    let mut selection = BuiltinSelection::default();
    for r in refs {
        match r {
            DirectiveRef::Id(id) => explicit_ids.push(id),
            DirectiveRef::Options(options) => selection = options.builtins.clone(),
        }
    }

    if let Some(missing) = explicit_ids.iter().find(|id| !catalog.contains(id)) {
        return Err(ConfigError::UnknownDirective {
            id: missing.to_string(),
        });
    }
    explicit_ids.retain(|id| {
        let builtin = catalog.get(id).is_some_and(|d| d.is_builtin());
        if builtin {
            warn!(
                directive = %id,
                %platform,
                "builtin directives are selected with 'builtins', ignoring explicit reference"
            );
        }
        !builtin
    });
    let explicit = catalog.filter_by_keys(&explicit_ids);

    let applicable = catalog.filter(|d| {
        d.is_builtin() && d.supports_platform(platform) && d.table_output() == structured_output
    });
    let builtins = match selection {
        BuiltinSelection::All(true) => applicable,
        BuiltinSelection::All(false) => Collection::default(),
        BuiltinSelection::Only(wanted) => {
            for name in &wanted {
                let known = applicable
                    .iter()
                    .any(|d| d.id() == name || d.name().eq_ignore_ascii_case(name));
                if !known {
                    warn!(builtin = %name, %platform, "no applicable builtin directive matches");
                }
            }
            applicable.filter(|d| {
                wanted
                    .iter()
                    .any(|name| d.id() == name || d.name().eq_ignore_ascii_case(name))
            })
        }
    };

    explicit.union(&builtins)
}

/// Every placeholder other than `target` must have a value in `attrs`.
fn check_attrs(
    device: &str,
    directives: &Collection<Directive>,
    attrs: &BTreeMap<String, String>,
) -> Result<(), DeviceError> {
    for directive in directives {
        if let Some(attr) = directive
            .attribute_keys()
            .into_iter()
            .find(|key| !attrs.contains_key(*key))
        {
            return Err(DeviceError::MissingAttribute {
                device: device.to_string(),
                attr: attr.to_string(),
            });
        }
    }
    Ok(())
}
