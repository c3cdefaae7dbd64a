use std::path::PathBuf;

use directive_engine::ConfigError;
use host_resolver::AddressError;
use thiserror::Error;

/// Fatal, load-time errors raised while building devices.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A directive-level configuration error (unknown or duplicate
    /// directive, duplicate device id, ...).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Neither `name` nor the legacy `display_name` was supplied.
    #[error("device is missing a 'name'")]
    MissingName,

    #[error("device '{device}' is missing a 'platform' (network operating system)")]
    MissingPlatform { device: String },

    /// The platform is not in the supported-platform registry.
    #[error("device '{device}': platform '{platform}' is not supported")]
    UnsupportedDevice { device: String, platform: String },

    #[error("device '{device}': address is invalid: {source}")]
    Address {
        device: String,
        #[source]
        source: AddressError,
    },

    /// A command bound to the device references an attribute the device
    /// does not define.
    #[error(
        "device '{device}' has a command that references attribute '{attr}', \
         but '{attr}' is missing from device attributes"
    )]
    MissingAttribute { device: String, attr: String },

    #[error(
        "'structured_output' is set to 'true' on device '{device}' with platform \
         '{platform}', which does not support structured output"
    )]
    StructuredOutputUnsupported { device: String, platform: String },

    #[error("device '{device}': driver '{driver}' is not supported for platform '{platform}'")]
    UnsupportedDriver {
        device: String,
        platform: String,
        driver: String,
    },

    #[error("device '{device}': avatar '{}' does not exist", path.display())]
    MissingAvatar { device: String, path: PathBuf },

    #[error("device '{device}' references undefined proxy '{proxy}'")]
    UnknownProxy { device: String, proxy: String },

    #[error("VRF '{vrf}' in device '{device}' is missing a source {family} address")]
    MissingSourceAddress {
        vrf: String,
        device: String,
        family: &'static str,
    },

    #[error("VRF '{vrf}' in device '{device}': '{address}' is not an {family} address")]
    SourceAddressFamily {
        vrf: String,
        device: String,
        family: &'static str,
        address: std::net::IpAddr,
    },
}
