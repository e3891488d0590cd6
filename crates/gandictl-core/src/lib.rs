//! # gandictl-core
//!
//! Machine lifecycle for Gandi hosting VMs over the XML-RPC API.
//!
//! The crate is layered bottom-up:
//!
//! - [`xmlrpc`] - wire codec and HTTP client for `methodCall`/`methodResponse`
//! - [`api`] - typed `hosting.*` and `operation.*` calls
//! - [`progress`] - polling an operation until the provider reports `DONE`
//! - [`state`] - mapping provider VM states onto [`MachineState`]
//! - [`driver`] - the [`Driver`] trait and its Gandi implementation
//! - [`config`] - profiles and the local machine store
//!
//! ## Example
//!
//! ```rust,no_run
//! use gandictl_core::{Driver, GandiDriver, MachineConfig};
//!
//! # async fn example() -> gandictl_core::Result<()> {
//! let mut driver = GandiDriver::new(MachineConfig::new("web-1"), "my-api-key")?;
//! driver.pre_create_check().await?;
//! driver.create(None).await?;
//! println!("{} is {}", driver.machine_name(), driver.state().await?);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod driver;
pub mod error;
pub mod progress;
pub mod state;
pub mod xmlrpc;

pub use api::HostingClient;
pub use config::{Config, ConfigError, MachineStore, Profile};
pub use driver::{Driver, GandiDriver, MachineConfig, MachineRecord};
pub use error::{CoreError, Result};
pub use progress::{ProgressCallback, ProgressEvent, WaitOptions, wait_for_operation};
pub use state::MachineState;
pub use xmlrpc::RpcError;
