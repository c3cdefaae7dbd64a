//! # host-resolver
//!
//! Device address handling for glass-gate. A configured device (or jump
//! host) address is either an IP literal or a hostname; hostnames must
//! resolve when the configuration is loaded so that a snapshot never holds
//! a device nobody can reach.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use host_resolver::{resolve_address, SystemResolver};
//!
//! # fn example() -> Result<(), host_resolver::AddressError> {
//! let address = resolve_address("core1.example.net", &SystemResolver)?;
//! println!("{address}");
//! # Ok(())
//! # }
//! ```

mod resolver;

pub use resolver::{
    resolve_address, AddressError, DeviceAddress, Resolver, StaticResolver, SystemResolver,
};
