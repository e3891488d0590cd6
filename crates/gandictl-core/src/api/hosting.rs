//! Typed wrappers over the hosting XML-RPC methods
//!
//! Every remote method takes the API key as its first positional parameter;
//! [`HostingClient`] prepends it so callers only pass the method arguments.

use std::iter;

use tracing::debug;

use super::types::*;
use crate::error::{CoreError, Result};
use crate::xmlrpc::{RpcClient, Value, to_value};

/// Hosting API client bound to one endpoint and API key
#[derive(Clone)]
pub struct HostingClient {
    rpc: RpcClient,
    api_key: String,
}

impl std::fmt::Debug for HostingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostingClient")
            .field("endpoint", &self.rpc.endpoint().as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HostingClient {
    /// Create a client for `endpoint` authenticating with `api_key`
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::with_rpc(RpcClient::new(endpoint)?, api_key))
    }

    pub fn with_rpc(rpc: RpcClient, api_key: impl Into<String>) -> Self {
        Self {
            rpc,
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.rpc.endpoint().as_str()
    }

    fn params(&self, rest: impl IntoIterator<Item = Value>) -> Vec<Value> {
        iter::once(Value::from(self.api_key.as_str()))
            .chain(rest)
            .collect()
    }

    pub async fn vm_info(&self, vm_id: i64) -> Result<VmInfo> {
        let params = self.params([Value::Int(vm_id)]);
        Ok(self.rpc.call_as("hosting.vm.info", params).await?)
    }

    pub async fn vm_list(&self, filter: &VmFilter) -> Result<Vec<VmInfo>> {
        let params = self.params([to_value(filter)?]);
        Ok(self.rpc.call_as("hosting.vm.list", params).await?)
    }

    pub async fn datacenter_list(&self, filter: &DatacenterFilter) -> Result<Vec<DatacenterInfo>> {
        let params = self.params([to_value(filter)?]);
        Ok(self.rpc.call_as("hosting.datacenter.list", params).await?)
    }

    pub async fn image_list(&self, filter: &ImageFilter) -> Result<Vec<ImageInfo>> {
        let params = self.params([to_value(filter)?]);
        Ok(self.rpc.call_as("hosting.image.list", params).await?)
    }

    /// Create a VM with a system disk cloned from `source_disk_id`.
    ///
    /// Returns the operations the provider queued (disk, interface, VM).
    pub async fn vm_create_from(
        &self,
        vm: &VmCreateRequest,
        disk: &DiskCreateRequest,
        source_disk_id: i64,
    ) -> Result<Vec<OperationInfo>> {
        let params = self.params([to_value(vm)?, to_value(disk)?, Value::Int(source_disk_id)]);
        Ok(self.rpc.call_as("hosting.vm.create_from", params).await?)
    }

    pub async fn vm_start(&self, vm_id: i64) -> Result<OperationInfo> {
        self.vm_operation("hosting.vm.start", vm_id).await
    }

    pub async fn vm_stop(&self, vm_id: i64) -> Result<OperationInfo> {
        self.vm_operation("hosting.vm.stop", vm_id).await
    }

    pub async fn vm_reboot(&self, vm_id: i64) -> Result<OperationInfo> {
        self.vm_operation("hosting.vm.reboot", vm_id).await
    }

    pub async fn vm_delete(&self, vm_id: i64) -> Result<OperationInfo> {
        self.vm_operation("hosting.vm.delete", vm_id).await
    }

    pub async fn operation_info(&self, operation_id: i64) -> Result<OperationInfo> {
        let params = self.params([Value::Int(operation_id)]);
        Ok(self.rpc.call_as("operation.info", params).await?)
    }

    async fn vm_operation(&self, method: &str, vm_id: i64) -> Result<OperationInfo> {
        debug!(method, vm_id, "Queueing VM operation");
        let params = self.params([Value::Int(vm_id)]);
        Ok(self.rpc.call_as(method, params).await?)
    }

    /// Find a VM by hostname, then fetch its full record
    pub async fn vm_by_name(&self, name: &str) -> Result<VmInfo> {
        let filter = VmFilter {
            hostname: name.to_string(),
        };
        let vm = exactly_one(self.vm_list(&filter).await?, "vm", name)?;
        self.vm_info(vm.id).await
    }

    pub async fn datacenter_by_code(&self, code: &str) -> Result<DatacenterInfo> {
        let filter = DatacenterFilter {
            dc_code: code.to_string(),
        };
        exactly_one(self.datacenter_list(&filter).await?, "datacenter", code)
    }

    pub async fn image_by_name(&self, name: &str, datacenter_id: i64) -> Result<ImageInfo> {
        let filter = ImageFilter {
            label: name.to_string(),
            datacenter_id,
        };
        exactly_one(self.image_list(&filter).await?, "image", name)
    }
}

fn exactly_one<T>(mut items: Vec<T>, kind: &'static str, name: &str) -> Result<T> {
    match items.len() {
        1 => Ok(items.remove(0)),
        0 => Err(CoreError::NotFound {
            kind,
            name: name.to_string(),
        }),
        count => Err(CoreError::Ambiguous {
            kind,
            name: name.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one() {
        assert_eq!(exactly_one(vec![7], "vm", "a").unwrap(), 7);
        assert!(exactly_one(Vec::<i32>::new(), "vm", "a")
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            exactly_one(vec![1, 2], "vm", "a"),
            Err(CoreError::Ambiguous { count: 2, .. })
        ));
    }

    #[test]
    fn test_params_prepend_api_key() {
        let client = HostingClient::new("http://localhost:1/xmlrpc/", "secret").unwrap();
        let params = client.params([Value::Int(5)]);
        assert_eq!(params, vec![Value::from("secret"), Value::Int(5)]);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = HostingClient::new("http://localhost:1/xmlrpc/", "secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("localhost"));
    }
}
