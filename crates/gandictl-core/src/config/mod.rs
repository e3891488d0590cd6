//! Configuration, profiles and the local machine store
//!
//! - Named profiles holding an API key and machine defaults
//! - `${VAR}` / `${VAR:-default}` expansion in the config file
//! - Platform-specific config file location
//! - A `machines.toml` store next to the config file remembering created VMs

#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod store;

pub use config::{Config, Profile};
pub use error::{ConfigError, Result};
pub use store::MachineStore;
