use host_resolver::{resolve_address, DeviceAddress, Resolver};
use serde::Deserialize;

use crate::credential::Credential;
use crate::error::DeviceError;

/// The only platform a jump host may run.
pub const PROXY_PLATFORM: &str = "linux_ssh";

/// A jump-host record as written in the devices file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProxy {
    pub name: String,
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub credential: Credential,
    #[serde(default = "default_platform", alias = "nos")]
    pub platform: String,
}

fn default_port() -> u16 {
    22
}

fn default_platform() -> String {
    PROXY_PLATFORM.to_string()
}

/// A validated SSH jump host, shared by every device that uses it.
#[derive(Debug, Clone)]
pub struct Proxy {
    name: String,
    address: DeviceAddress,
    port: u16,
    credential: Credential,
}

impl Proxy {
    pub fn build(raw: RawProxy, resolver: &dyn Resolver) -> Result<Self, DeviceError> {
        if raw.platform != PROXY_PLATFORM {
            return Err(DeviceError::UnsupportedDevice {
                device: raw.name,
                platform: raw.platform,
            });
        }
        let address =
            resolve_address(&raw.address, resolver).map_err(|source| DeviceError::Address {
                device: raw.name.clone(),
                source,
            })?;
        Ok(Self {
            name: raw.name,
            address,
            port: raw.port,
            credential: raw.credential,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn platform(&self) -> &str {
        PROXY_PLATFORM
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_resolver::StaticResolver;

    fn raw(yaml: &str) -> RawProxy {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn defaults_port_and_platform() {
        let proxy = Proxy::build(
            raw("name: jump\naddress: 192.0.2.10\ncredential: {username: u, password: p}\n"),
            &StaticResolver::new(),
        )
        .unwrap();
        assert_eq!(proxy.port(), 22);
        assert_eq!(proxy.platform(), "linux_ssh");
        assert_eq!(proxy.address().to_string(), "192.0.2.10");
    }

    #[test]
    fn rejects_non_linux_platform() {
        let err = Proxy::build(
            raw("name: jump\naddress: 192.0.2.10\nnos: cisco_ios\ncredential: {username: u, password: p}\n"),
            &StaticResolver::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DeviceError::UnsupportedDevice { ref platform, .. } if platform == "cisco_ios"));
    }

    #[test]
    fn hostname_must_resolve() {
        let yaml = "name: jump\naddress: jump.example.net\ncredential: {username: u, password: p}\n";
        assert!(matches!(
            Proxy::build(raw(yaml), &StaticResolver::new()),
            Err(DeviceError::Address { .. })
        ));

        let resolver =
            StaticResolver::new().with_host("jump.example.net", &["192.0.2.10".parse().unwrap()]);
        let proxy = Proxy::build(raw(yaml), &resolver).unwrap();
        assert!(proxy.address().is_hostname());
    }
}
