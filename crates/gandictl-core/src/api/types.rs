//! Request and response structs for the hosting API
//!
//! Field names follow the provider's XML-RPC member names; values are copied
//! verbatim.

use serde::{Deserialize, Serialize};

/// `hosting.vm.info` / `hosting.vm.list` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VmInfo {
    pub id: i64,
    #[serde(default)]
    pub hostname: String,
    /// Provider state string, e.g. `running` or `halted`
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub memory: Option<i64>,
    #[serde(default)]
    pub cores: Option<i64>,
    #[serde(default)]
    pub datacenter_id: Option<i64>,
    #[serde(default)]
    pub ifaces: Vec<IfaceInfo>,
}

impl VmInfo {
    /// First address of the first network interface
    pub fn primary_ip(&self) -> Option<&str> {
        self.ifaces
            .first()
            .and_then(|iface| iface.ips.first())
            .map(|ip| ip.ip.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IfaceInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ips: Vec<IpInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IpInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub version: Option<i64>,
}

/// `operation.info` result and the entries returned by lifecycle calls
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OperationInfo {
    pub id: i64,
    #[serde(rename = "step", default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl OperationInfo {
    pub fn step(&self) -> OperationStep {
        OperationStep::parse(&self.status)
    }
}

/// Lifecycle step of a provider operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStep {
    Bill,
    Wait,
    Run,
    Done,
    /// Any status the wait loop does not expect, including ERROR and CANCEL
    Other,
}

impl OperationStep {
    pub fn parse(status: &str) -> Self {
        match status {
            "BILL" => OperationStep::Bill,
            "WAIT" => OperationStep::Wait,
            "RUN" => OperationStep::Run,
            "DONE" => OperationStep::Done,
            _ => OperationStep::Other,
        }
    }

    /// True while the provider is still working on the operation
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            OperationStep::Bill | OperationStep::Wait | OperationStep::Run
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatacenterInfo {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub iso: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub dc_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageInfo {
    pub id: i64,
    #[serde(default)]
    pub label: String,
    pub disk_id: i64,
    #[serde(default)]
    pub datacenter_id: Option<i64>,
    #[serde(default)]
    pub os_arch: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Filter for `hosting.vm.list`
#[derive(Debug, Clone, Serialize)]
pub struct VmFilter {
    pub hostname: String,
}

/// Filter for `hosting.datacenter.list`
#[derive(Debug, Clone, Serialize)]
pub struct DatacenterFilter {
    pub dc_code: String,
}

/// Filter for `hosting.image.list`
#[derive(Debug, Clone, Serialize)]
pub struct ImageFilter {
    pub label: String,
    pub datacenter_id: i64,
}

/// VM spec for `hosting.vm.create_from`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VmCreateRequest {
    pub datacenter_id: i64,
    pub hostname: String,
    pub memory: u32,
    pub cores: u32,
    pub ip_version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,
    #[serde(rename = "run", skip_serializing_if = "Option::is_none")]
    pub run_command: Option<String>,
}

/// Disk spec for `hosting.vm.create_from`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiskCreateRequest {
    pub name: String,
    pub datacenter_id: i64,
    /// Size in MB
    pub size: u32,
}
