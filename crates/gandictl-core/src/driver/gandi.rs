//! Gandi hosting backend for [`Driver`]

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::Driver;
use super::machine::{BOOTSTRAP_COMMAND, DEFAULT_DISK_SIZE, MachineConfig, MachineRecord};
use crate::api::{DiskCreateRequest, HostingClient, OperationInfo, VmCreateRequest};
use crate::error::{CoreError, Result};
use crate::progress::{ProgressCallback, WaitOptions, wait_for_operation};
use crate::state::MachineState;

/// Machine driver backed by the Gandi hosting XML-RPC API
pub struct GandiDriver {
    record: MachineRecord,
    client: HostingClient,
    wait: WaitOptions,
    on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for GandiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiDriver")
            .field("record", &self.record)
            .field("client", &self.client)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl GandiDriver {
    /// Driver for a machine that does not exist yet
    pub fn new(config: MachineConfig, api_key: &str) -> Result<Self> {
        Self::from_record(MachineRecord::new(config), api_key)
    }

    /// Driver for a previously created machine
    pub fn from_record(record: MachineRecord, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(CoreError::Validation(
                "gandi driver requires an API key (--api-key or GANDI_APIKEY)".to_string(),
            ));
        }
        if record.config.name.trim().is_empty() {
            return Err(CoreError::Validation("machine name is required".to_string()));
        }
        let client = HostingClient::new(&record.config.url, api_key)?;
        Ok(Self {
            record,
            client,
            wait: WaitOptions::default(),
            on_progress: None,
        })
    }

    #[must_use]
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn record(&self) -> &MachineRecord {
        &self.record
    }

    pub fn client(&self) -> &HostingClient {
        &self.client
    }

    /// Look the VM up by hostname and record its id and address.
    ///
    /// Used for machines whose creation was ordered but not seen through.
    pub async fn adopt(&mut self) -> Result<()> {
        let vm = self.client.vm_by_name(&self.record.config.name).await?;
        info!(vm_id = vm.id, "Adopted Gandi server '{}'", vm.hostname);
        self.record.ip_address = vm.primary_ip().map(str::to_string);
        self.record.vm_id = Some(vm.id);
        self.record.creation_operation = None;
        Ok(())
    }

    async fn vm_id(&self) -> Result<i64> {
        if let Some(vm_id) = self.record.vm_id {
            return Ok(vm_id);
        }
        if self.record.creation_operation.is_some() {
            debug!("Resolving pending machine '{}' by name", self.record.config.name);
            return Ok(self.client.vm_by_name(&self.record.config.name).await?.id);
        }
        Err(CoreError::NotCreated {
            name: self.record.config.name.clone(),
        })
    }

    async fn wait_for(&self, op: OperationInfo) -> Result<OperationInfo> {
        wait_for_operation(&self.client, op.id, self.wait, self.on_progress.clone()).await
    }
}

#[async_trait]
impl Driver for GandiDriver {
    fn driver_name(&self) -> &'static str {
        "gandi"
    }

    fn machine_name(&self) -> &str {
        &self.record.config.name
    }

    async fn pre_create_check(&self) -> Result<()> {
        let config = &self.record.config;
        let dc = self.client.datacenter_by_code(&config.datacenter).await?;
        let image = self.client.image_by_name(&config.image, dc.id).await?;
        debug!(
            datacenter = dc.id,
            image = image.id,
            disk = image.disk_id,
            "Pre-create check passed"
        );
        Ok(())
    }

    async fn create(&mut self, ssh_public_key: Option<&str>) -> Result<()> {
        info!("Creating Gandi server...");
        let config = self.record.config.clone();

        let dc = self.client.datacenter_by_code(&config.datacenter).await?;
        let image = self.client.image_by_name(&config.image, dc.id).await?;

        let vm_request = VmCreateRequest {
            datacenter_id: dc.id,
            hostname: config.name.clone(),
            memory: config.memory,
            cores: config.cores,
            ip_version: 4,
            ssh_key: ssh_public_key.map(|key| key.trim_end().to_string()),
            run_command: Some(BOOTSTRAP_COMMAND.to_string()),
        };
        let disk_request = DiskCreateRequest {
            name: config.name.clone(),
            datacenter_id: dc.id,
            size: DEFAULT_DISK_SIZE,
        };

        let operations = self
            .client
            .vm_create_from(&vm_request, &disk_request, image.disk_id)
            .await?;
        // Disk and interface operations come first; the VM operation finishes last
        let vm_operation = operations.into_iter().last().ok_or_else(|| {
            CoreError::UnexpectedResponse("hosting.vm.create_from returned no operations".into())
        })?;
        // From here on the VM exists and is billed; keep enough to find it again
        self.record.creation_operation = Some(vm_operation.id);

        if let Err(e) = self.wait_for(vm_operation).await {
            if let Err(lookup) = self.adopt().await {
                warn!("Could not look up '{}' after failed creation: {}", config.name, lookup);
            }
            return Err(e);
        }

        self.adopt().await?;
        let vm_id = self.record.vm_id.unwrap_or_default();
        let ip = self.record.ip().ok_or_else(|| {
            CoreError::UnexpectedResponse(format!("VM {} has no IP address", vm_id))
        })?;

        info!(vm_id, ip = %ip, "Gandi server created");
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let op = self.client.vm_start(self.vm_id().await?).await?;
        self.wait_for(op).await?;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let op = self.client.vm_stop(self.vm_id().await?).await?;
        self.wait_for(op).await?;
        Ok(())
    }

    async fn restart(&self) -> Result<()> {
        let op = self.client.vm_reboot(self.vm_id().await?).await?;
        self.wait_for(op).await?;
        Ok(())
    }

    async fn kill(&self) -> Result<()> {
        self.stop().await
    }

    async fn remove(&self) -> Result<()> {
        let vm_id = self.vm_id().await?;
        match self.state().await {
            Ok(MachineState::Running) => self.stop().await?,
            Ok(_) => {}
            Err(e) => warn!("Could not query state of VM {} before removal: {}", vm_id, e),
        }

        info!("Deleting Gandi server...");
        let op = self.client.vm_delete(vm_id).await?;
        self.wait_for(op).await?;
        Ok(())
    }

    async fn state(&self) -> Result<MachineState> {
        let vm = self.client.vm_info(self.vm_id().await?).await?;
        Ok(MachineState::from_provider(&vm.state))
    }

    fn ip(&self) -> Result<String> {
        self.record
            .ip()
            .map(str::to_string)
            .ok_or(CoreError::IpNotSet)
    }
}
