//! CLI structure and command definitions
//!
//! Machine lifecycle commands sit at the top level (`create`, `start`, `rm`,
//! ...). Supporting groups cover raw operations and profile management.

use clap::{Parser, Subcommand};

pub mod machine;

pub use machine::*;

/// Gandi hosting VM management CLI
#[derive(Parser, Debug)]
#[command(name = "gandictl")]
#[command(version, about = "Provision and manage Gandi hosting VMs")]
#[command(long_about = "
Provision and manage Gandi hosting VMs

Machines created with gandictl are remembered locally, so later commands only
need the machine name.

EXAMPLES:
    # Store an API key in a profile
    gandictl profile set prod --api-key KEY --datacenter FR-SD2 --default

    # Create a machine with an SSH key installed for root
    gandictl create web-1 --ssh-key ~/.ssh/id_ed25519.pub

    # Lifecycle
    gandictl stop web-1
    gandictl start web-1
    gandictl rm web-1

    # Machine listing as JSON for scripting
    gandictl ls -o json

For more help on a specific command, run:
    gandictl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "GANDICTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "GANDICTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Table output
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a machine
    #[command(after_help = "EXAMPLES:
    # Defaults: LU-BI1, 512 MB, 1 core, Ubuntu 14.04 64 bits LTS (HVM)
    gandictl create web-1 --api-key KEY

    # Bigger machine in another datacenter
    gandictl create db-1 --datacenter FR-SD2 --memory 4096 --core 2
")]
    Create(CreateArgs),

    /// Start a stopped machine
    Start(LifecycleArgs),

    /// Stop a running machine
    Stop(LifecycleArgs),

    /// Reboot a machine
    Restart(LifecycleArgs),

    /// Force stop a machine
    Kill(LifecycleArgs),

    /// Delete a machine on Gandi and forget it locally
    #[command(visible_alias = "remove")]
    Rm(RemoveArgs),

    /// Show the state of a machine
    Status {
        name: String,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Print the IP address of a machine
    Ip { name: String },

    /// Print the Docker URL of a machine
    Url { name: String },

    /// Show everything recorded about a machine
    Inspect { name: String },

    /// List known machines
    #[command(visible_alias = "list")]
    Ls {
        /// Skip querying Gandi for machine states
        #[arg(long, short)]
        quiet: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Hosting operations
    #[command(subcommand, visible_alias = "op")]
    Operation(OperationCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    #[command(after_help = "EXAMPLES:
    # Create a profile and make it the default
    gandictl profile set prod --api-key KEY --default

    # Read the key from the environment when the config is loaded
    gandictl profile set ci --api-key '${GANDI_APIKEY}'

    # List all profiles
    gandictl profile list
")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    Elvish,
}

/// Operation commands
#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Show an operation
    #[command(visible_alias = "get")]
    Info {
        /// Operation ID
        id: i64,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Wait for an operation to finish
    Wait {
        /// Operation ID
        id: i64,

        #[command(flatten)]
        connection: ConnectionArgs,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the configuration file path
    Path,

    /// Show one profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Create or update a profile
    #[command(visible_alias = "add")]
    Set {
        /// Profile name
        name: String,

        /// Gandi API key
        #[arg(long)]
        api_key: Option<String>,

        /// XML-RPC endpoint
        #[arg(long)]
        url: Option<String>,

        /// Default datacenter code for new machines
        #[arg(long)]
        datacenter: Option<String>,

        /// Default image label for new machines
        #[arg(long)]
        image: Option<String>,

        /// Default memory in MB for new machines
        #[arg(long)]
        memory: Option<u32>,

        /// Default core count for new machines
        #[arg(long = "core")]
        cores: Option<u32>,

        /// Also make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    Default {
        /// Profile name to use by default
        name: String,
    },
}
