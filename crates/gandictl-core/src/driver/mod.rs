//! Uniform machine lifecycle interface
//!
//! An orchestrator drives every compute backend through [`Driver`]. The only
//! backend in this crate is [`GandiDriver`].

use async_trait::async_trait;

use crate::error::{CoreError, Result};
use crate::state::MachineState;

pub mod gandi;
pub mod machine;

pub use gandi::GandiDriver;
pub use machine::*;

/// Lifecycle operations every machine driver provides.
///
/// Calls that queue provider-side work return once that work has finished.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Short backend identifier, e.g. `gandi`
    fn driver_name(&self) -> &'static str;

    fn machine_name(&self) -> &str;

    /// Validate settings against the provider before creating anything
    async fn pre_create_check(&self) -> Result<()>;

    /// Provision the machine. `ssh_public_key` is installed for the SSH user.
    async fn create(&mut self, ssh_public_key: Option<&str>) -> Result<()>;

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn restart(&self) -> Result<()>;

    /// Hard stop; backends without a distinct power-off fall back to `stop`
    async fn kill(&self) -> Result<()>;

    /// Delete the machine on the provider side
    async fn remove(&self) -> Result<()>;

    /// Current state. An `Err` means the state is unknown and should be shown as
    /// [`MachineState::Error`].
    async fn state(&self) -> Result<MachineState>;

    /// [`Driver::state`] with a failed query folded into
    /// [`MachineState::Error`] and its cause
    async fn state_or_error(&self) -> (MachineState, Option<CoreError>) {
        match self.state().await {
            Ok(state) => (state, None),
            Err(e) => (MachineState::Error, Some(e)),
        }
    }

    fn ip(&self) -> Result<String>;

    fn ssh_hostname(&self) -> Result<String> {
        self.ip()
    }

    /// Docker daemon URL of the machine
    fn url(&self) -> Result<String> {
        Ok(docker_url(&self.ip()?))
    }
}
