//! Arguments shared by the machine lifecycle commands

use std::time::Duration;

use clap::Args;
use gandictl_core::WaitOptions;

/// Credentials and endpoint overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Gandi API key
    #[arg(long, env = "GANDI_APIKEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gandi XML-RPC endpoint
    #[arg(long, env = "GANDI_URL")]
    pub url: Option<String>,
}

/// Operation polling behaviour
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Maximum time to wait for each operation in seconds (0 waits forever)
    #[arg(long, default_value = "1800")]
    pub wait_timeout: u64,

    /// Polling interval in seconds
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub wait_interval: u64,
}

impl WaitArgs {
    pub fn options(&self) -> WaitOptions {
        let timeout = match self.wait_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        WaitOptions::default()
            .with_interval(Duration::from_secs(self.wait_interval))
            .with_timeout(timeout)
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Machine name, also used as the VM hostname
    pub name: String,

    /// Image label
    #[arg(long, env = "GANDI_IMAGE")]
    pub image: Option<String>,

    /// Datacenter code
    #[arg(long, env = "GANDI_DATACENTER")]
    pub datacenter: Option<String>,

    /// Memory in MB
    #[arg(long)]
    pub memory: Option<u32>,

    /// Number of cores
    #[arg(long = "core")]
    pub cores: Option<u32>,

    /// Public key file installed for the SSH user
    #[arg(long)]
    pub ssh_key: Option<String>,

    /// SSH user
    #[arg(long)]
    pub ssh_user: Option<String>,

    /// SSH port
    #[arg(long)]
    pub ssh_port: Option<u16>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Args, Debug)]
pub struct LifecycleArgs {
    /// Machine name
    pub name: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Machine name
    pub name: String,

    /// Forget the machine locally even if deleting it on Gandi fails
    #[arg(long, short)]
    pub force: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_options_from_args() {
        let args = WaitArgs {
            wait_timeout: 60,
            wait_interval: 2,
        };
        let options = args.options();
        assert_eq!(options.interval, Duration::from_secs(2));
        assert_eq!(options.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_timeout_waits_forever() {
        let args = WaitArgs {
            wait_timeout: 0,
            wait_interval: 5,
        };
        assert_eq!(args.options().timeout, None);
    }
}
