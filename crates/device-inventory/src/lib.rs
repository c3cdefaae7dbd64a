//! # device-inventory
//!
//! Devices, their resolved directives, and the configuration snapshot
//! glass-gate serves queries from.
//!
//! A [`Snapshot`] is built once per configuration load. Each device's
//! directive set is resolved and every command placeholder is checked
//! against the device's attributes while the snapshot is built, so query
//! time only ever sees fully valid devices.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use device_inventory::{load_snapshot, SnapshotFiles, SnapshotStore, StaticRegistry};
//! use host_resolver::SystemResolver;
//!
//! # fn example() -> anyhow::Result<()> {
//! let files = SnapshotFiles {
//!     devices_file: "devices.yaml".into(),
//!     directives_file: "directives.yaml".into(),
//!     plugin_dir: None,
//!     include_builtins: true,
//! };
//! let store = SnapshotStore::new(load_snapshot(&files, &StaticRegistry::builtin(), &SystemResolver)?);
//!
//! match store.current().authorize("core1", "bgp_route", "192.0.2.0/24") {
//!     Ok(permit) => println!("run {:?}", permit.commands),
//!     Err(rejection) => println!("rejected: {rejection}"),
//! }
//! # Ok(())
//! # }
//! ```

mod credential;
mod device;
mod error;
mod identity;
mod inventory;
mod loader;
mod platform;
mod proxy;
mod snapshot;
mod vrf;

pub use credential::{Credential, Secret};
pub use device::{
    BuildContext, BuiltinSelection, Device, DirectiveOptions, DirectiveRef, ProxyRef,
    PublicDevice, RawDevice,
};
pub use error::DeviceError;
pub use identity::derive_id;
pub use inventory::{DeviceCollection, FrontendGroup, Location};
pub use loader::{
    build_inventory, load_snapshot, parse_devices, snapshot_from_str, DeviceFile, SnapshotFiles,
};
pub use platform::{Capabilities, Driver, PlatformEntry, PlatformRegistry, StaticRegistry};
pub use proxy::{Proxy, RawProxy, PROXY_PLATFORM};
pub use snapshot::{Permit, Snapshot, SnapshotStore};
pub use vrf::{RawAddressFamily, RawVrf, Vrf};
