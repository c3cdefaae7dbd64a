use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DeviceError;

const DEFAULT_VRF: &str = "default";
const DEFAULT_VRF_DISPLAY_NAME: &str = "Global";

/// A legacy per-device VRF record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVrf {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub ipv4: Option<RawAddressFamily>,
    #[serde(default)]
    pub ipv6: Option<RawAddressFamily>,
}

/// An enabled address family within a VRF.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAddressFamily {
    #[serde(default)]
    pub source_address: Option<IpAddr>,
}

/// A validated VRF with its per-family source addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vrf {
    pub name: String,
    pub display_name: String,
    pub source4: Option<IpAddr>,
    pub source6: Option<IpAddr>,
}

impl Vrf {
    /// Every enabled address family must carry a source address of that
    /// family.
    pub fn build(raw: RawVrf, device: &str) -> Result<Self, DeviceError> {
        let source4 = source_address(&raw, raw.ipv4.as_ref(), device, "IPv4")?;
        let source6 = source_address(&raw, raw.ipv6.as_ref(), device, "IPv6")?;

        let display_name = match raw.display_name {
            Some(display_name) => display_name,
            None if raw.name == DEFAULT_VRF => DEFAULT_VRF_DISPLAY_NAME.to_string(),
            None => {
                let generated = title_case(&raw.name);
                debug!(vrf = %raw.name, display_name = %generated, "generated VRF display name");
                generated
            }
        };

        Ok(Self {
            name: raw.name,
            display_name,
            source4,
            source6,
        })
    }
}

fn source_address(
    raw: &RawVrf,
    family: Option<&RawAddressFamily>,
    device: &str,
    label: &'static str,
) -> Result<Option<IpAddr>, DeviceError> {
    let Some(family) = family else {
        return Ok(None);
    };
    let address = family
        .source_address
        .ok_or_else(|| DeviceError::MissingSourceAddress {
            vrf: raw.name.clone(),
            device: device.to_string(),
            family: label,
        })?;
    let matches = match label {
        "IPv4" => address.is_ipv4(),
        _ => address.is_ipv6(),
    };
    if !matches {
        return Err(DeviceError::SourceAddressFamily {
            vrf: raw.name.clone(),
            device: device.to_string(),
            family: label,
            address,
        });
    }
    Ok(Some(address))
}

/// `"customer_a-vrf"` -> `"Customer A Vrf"`: non-alphanumerics become
/// spaces and every word is title-cased.
fn title_case(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    spaced
        .split(' ')
        .map(|word| {
            let mut out = String::with_capacity(word.len());
            let mut prev_alpha = false;
            for c in word.chars() {
                if prev_alpha {
                    out.push(c.to_ascii_lowercase());
                } else {
                    out.push(c.to_ascii_uppercase());
                }
                prev_alpha = c.is_ascii_alphabetic();
            }
            out
        })
        .collect::<Vec<_>>()
        .join(" ")
}
