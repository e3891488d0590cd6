//! Machine settings and the record persisted for each created machine

use serde::{Deserialize, Serialize};

pub const DEFAULT_URL: &str = "https://rpc.gandi.net/xmlrpc/";
pub const DEFAULT_IMAGE: &str = "Ubuntu 14.04 64 bits LTS (HVM)";
pub const DEFAULT_DATACENTER: &str = "LU-BI1";
pub const DEFAULT_MEMORY: u32 = 512;
pub const DEFAULT_CORES: u32 = 1;
pub const DEFAULT_SSH_USER: &str = "root";
pub const DEFAULT_SSH_PORT: u16 = 22;

/// System disk size in MB
pub const DEFAULT_DISK_SIZE: u32 = 5120;

/// Command run on first boot of a new VM
pub const BOOTSTRAP_COMMAND: &str = "apt-get install -y sudo";

/// Docker daemon TLS port used in machine URLs
pub const DOCKER_PORT: u16 = 2376;

/// Settings a machine is created with. The API key is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub name: String,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_datacenter")]
    pub datacenter: String,
    /// Memory in MB
    #[serde(default = "default_memory")]
    pub memory: u32,
    #[serde(default = "default_cores")]
    pub cores: u32,
    #[serde(default = "default_ssh_user")]
    pub ssh_user: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
}

impl MachineConfig {
    /// Settings for `name` with every other field at its default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: default_url(),
            image: default_image(),
            datacenter: default_datacenter(),
            memory: DEFAULT_MEMORY,
            cores: DEFAULT_CORES,
            ssh_user: default_ssh_user(),
            ssh_port: DEFAULT_SSH_PORT,
        }
    }
}

/// What gandictl remembers about a machine between invocations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Operation of a VM creation that was ordered but not seen to completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_operation: Option<i64>,
    pub config: MachineConfig,
}

impl MachineRecord {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            vm_id: None,
            ip_address: None,
            creation_operation: None,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// True once a VM has been ordered on the provider side, even if its id
    /// is not known yet
    pub fn is_provisioned(&self) -> bool {
        self.vm_id.is_some() || self.creation_operation.is_some()
    }

    /// Recorded IP address. Empty and `"0"` count as unset.
    pub fn ip(&self) -> Option<&str> {
        match self.ip_address.as_deref() {
            None | Some("") | Some("0") => None,
            Some(ip) => Some(ip),
        }
    }
}

/// Docker daemon URL for a machine address
pub fn docker_url(ip: &str) -> String {
    format!("tcp://{}:{}", ip, DOCKER_PORT)
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

fn default_datacenter() -> String {
    DEFAULT_DATACENTER.to_string()
}

fn default_memory() -> u32 {
    DEFAULT_MEMORY
}

fn default_cores() -> u32 {
    DEFAULT_CORES
}

fn default_ssh_user() -> String {
    DEFAULT_SSH_USER.to_string()
}

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}
