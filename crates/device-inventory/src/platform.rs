use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The execution driver family that runs commands on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    Netmiko,
    Scrapli,
    HttpClient,
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Netmiko => write!(f, "netmiko"),
            Self::Scrapli => write!(f, "scrapli"),
            Self::HttpClient => write!(f, "http_client"),
        }
    }
}

/// What a platform supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Driver used when a device does not override it.
    pub driver: Driver,
    /// Other drivers a device on this platform may select.
    pub alternate_drivers: Vec<Driver>,
    /// Whether the platform can return structured (table) output.
    pub structured_output: bool,
    /// Linux-hosted routing daemons are driven as `linux_ssh` devices.
    pub linux: bool,
}

impl Capabilities {
    pub fn supports_driver(&self, driver: Driver) -> bool {
        self.driver == driver || self.alternate_drivers.contains(&driver)
    }
}

/// Maps platform identifiers to capabilities.
///
/// The device builder depends only on this trait, so registries can be
/// composed from any number of registration sources.
pub trait PlatformRegistry: Send + Sync {
    /// Canonical identifier for `platform`, resolving aliases.
    /// `None` when the platform is unknown.
    fn normalize(&self, platform: &str) -> Option<String>;

    /// Capabilities of a canonical platform identifier.
    fn capabilities(&self, platform: &str) -> Option<Capabilities>;
}

/// A platform registration, as written in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformEntry {
    pub name: String,
    #[serde(default = "default_driver")]
    pub driver: Driver,
    #[serde(default)]
    pub structured_output: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub linux: bool,
}

fn default_driver() -> Driver {
    Driver::Netmiko
}

struct BuiltinPlatform {
    name: &'static str,
    scrapli: bool,
    structured_output: bool,
    linux: bool,
}

const fn platform(name: &'static str) -> BuiltinPlatform {
    BuiltinPlatform {
        name,
        scrapli: false,
        structured_output: false,
        linux: false,
    }
}

static PLATFORMS: &[BuiltinPlatform] = &[
    BuiltinPlatform {
        scrapli: true,
        ..platform("cisco_ios")
    },
    BuiltinPlatform {
        scrapli: true,
        ..platform("cisco_xe")
    },
    BuiltinPlatform {
        scrapli: true,
        ..platform("cisco_xr")
    },
    BuiltinPlatform {
        scrapli: true,
        ..platform("cisco_nxos")
    },
    BuiltinPlatform {
        scrapli: true,
        structured_output: true,
        ..platform("juniper")
    },
    BuiltinPlatform {
        scrapli: true,
        structured_output: true,
        ..platform("arista_eos")
    },
    platform("huawei"),
    platform("mikrotik_routeros"),
    platform("mikrotik_switchos"),
    platform("nokia_sros"),
    platform("vyos"),
    platform("tnsr"),
    BuiltinPlatform {
        linux: true,
        ..platform("frr")
    },
    BuiltinPlatform {
        linux: true,
        ..platform("bird")
    },
    BuiltinPlatform {
        linux: true,
        ..platform("openbgpd")
    },
    platform("linux_ssh"),
];

static ALIASES: &[(&str, &str)] = &[
    ("ios", "cisco_ios"),
    ("junos", "juniper"),
    ("juniper_junos", "juniper"),
    ("arista", "arista_eos"),
    ("mikrotik", "mikrotik_routeros"),
    ("tsnr", "tnsr"),
];

/// An in-memory registry seeded with the shipped platform table.
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    platforms: HashMap<String, Capabilities>,
    aliases: HashMap<String, String>,
}

impl StaticRegistry {
    /// A registry with no platforms at all.
    pub fn empty() -> Self {
        Self {
            platforms: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// The shipped platform table and aliases.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for p in PLATFORMS {
            let alternate_drivers = if p.scrapli {
                vec![Driver::Scrapli]
            } else {
                Vec::new()
            };
            registry.platforms.insert(
                p.name.to_string(),
                Capabilities {
                    driver: Driver::Netmiko,
                    alternate_drivers,
                    structured_output: p.structured_output,
                    linux: p.linux,
                },
            );
        }
        for (alias, canonical) in ALIASES {
            registry
                .aliases
                .insert(alias.to_string(), canonical.to_string());
        }
        registry
    }

    /// Register (or replace) a platform, builder style.
    pub fn with_entry(mut self, entry: PlatformEntry) -> Self {
        self.register(entry);
        self
    }

    pub fn register(&mut self, entry: PlatformEntry) {
        debug!(
            platform = %entry.name,
            driver = %entry.driver,
            structured_output = entry.structured_output,
            "registering platform"
        );
        for alias in entry.aliases {
            self.aliases.insert(alias, entry.name.clone());
        }
        self.platforms.insert(
            entry.name,
            Capabilities {
                driver: entry.driver,
                alternate_drivers: Vec::new(),
                structured_output: entry.structured_output,
                linux: entry.linux,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PlatformRegistry for StaticRegistry {
    fn normalize(&self, platform: &str) -> Option<String> {
        let platform = platform.trim();
        let canonical = self
            .aliases
            .get(platform)
            .map(String::as_str)
            .unwrap_or(platform);
        self.platforms
            .contains_key(canonical)
            .then(|| canonical.to_string())
    }

    fn capabilities(&self, platform: &str) -> Option<Capabilities> {
        self.platforms.get(platform).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_names() {
        let registry = StaticRegistry::builtin();
        assert_eq!(registry.normalize("junos").as_deref(), Some("juniper"));
        assert_eq!(registry.normalize("juniper_junos").as_deref(), Some("juniper"));
        assert_eq!(registry.normalize("ios").as_deref(), Some("cisco_ios"));
        assert_eq!(registry.normalize("tsnr").as_deref(), Some("tnsr"));
        assert_eq!(registry.normalize("cisco_xr").as_deref(), Some("cisco_xr"));
        assert_eq!(registry.normalize("commodore64"), None);
    }

    #[test]
    fn builtin_capabilities() {
        let registry = StaticRegistry::builtin();
        let juniper = registry.capabilities("juniper").unwrap();
        assert!(juniper.structured_output);
        assert!(juniper.supports_driver(Driver::Scrapli));
        assert!(!juniper.supports_driver(Driver::HttpClient));

        let frr = registry.capabilities("frr").unwrap();
        assert!(frr.linux);
        assert!(!frr.structured_output);
        assert_eq!(frr.driver, Driver::Netmiko);
    }

    #[test]
    fn configured_entries_extend_the_table() {
        let entry: PlatformEntry = serde_yml::from_str(
            "name: acme_os\ndriver: http_client\nstructured_output: true\naliases: [acme]\n",
        )
        .unwrap();
        let registry = StaticRegistry::builtin().with_entry(entry);

        assert_eq!(registry.normalize("acme").as_deref(), Some("acme_os"));
        let caps = registry.capabilities("acme_os").unwrap();
        assert_eq!(caps.driver, Driver::HttpClient);
        assert!(caps.structured_output);
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = StaticRegistry::empty();
        assert!(registry.is_empty());
        assert_eq!(registry.normalize("juniper"), None);
    }
}
