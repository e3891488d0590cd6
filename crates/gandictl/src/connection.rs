//! Credential resolution and driver construction
//!
//! Settings resolve as: command-line flag, environment variable, profile,
//! built-in default. Flags and environment variables are merged by clap.

use std::path::PathBuf;

use anyhow::Context;
use gandictl_core::driver::DEFAULT_URL;
use gandictl_core::{
    Config, GandiDriver, HostingClient, MachineConfig, MachineRecord, MachineStore, Profile,
    ProgressCallback, WaitOptions,
};
use tracing::{debug, info, trace};

use crate::cli::ConnectionArgs;
use crate::error::{GandiCtlError, Result as CliResult};

/// Connection manager for creating authenticated drivers and clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a connection manager with an optional explicit config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Explicit config path, or the platform default
    pub fn resolved_config_path(&self) -> CliResult<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_path()?),
        }
    }

    /// Config file as written, with `${VAR}` references unexpanded.
    ///
    /// Profile edits start from this so saving never writes resolved secrets.
    pub fn load_raw_config(&self) -> CliResult<Config> {
        let path = self.resolved_config_path()?;
        trace!("Loading raw config from {:?}", path);
        Ok(Config::load_raw_from_path(&path)?)
    }

    /// Save `config` to the location it was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        let path = self.resolved_config_path()?;
        config
            .save_to_path(&path)
            .context("Failed to save configuration")?;
        Ok(())
    }

    pub fn store_path(&self) -> CliResult<PathBuf> {
        Ok(MachineStore::path_for(&self.resolved_config_path()?))
    }

    pub fn load_store(&self) -> CliResult<MachineStore> {
        let path = self.store_path()?;
        trace!("Loading machine store from {:?}", path);
        Ok(MachineStore::load_from_path(&path)?)
    }

    pub fn save_store(&self, store: &MachineStore) -> CliResult<()> {
        let path = self.store_path()?;
        debug!("Saving machine store to {:?}", path);
        Ok(store.save_to_path(&path)?)
    }

    /// The profile in effect, if any
    pub fn profile(&self, profile_name: Option<&str>) -> CliResult<Option<(String, &Profile)>> {
        let active = self.config.active_profile(profile_name)?;
        if let Some((name, _)) = &active {
            info!("Using profile: {}", name);
        }
        Ok(active)
    }

    /// API key from the flag/environment, else from the profile
    pub fn resolve_api_key(
        &self,
        profile_name: Option<&str>,
        connection: &ConnectionArgs,
    ) -> CliResult<String> {
        if let Some(key) = connection.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            debug!("Using API key from --api-key or GANDI_APIKEY");
            return Ok(key.to_string());
        }

        self.profile(profile_name)?
            .and_then(|(_, profile)| profile.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or(GandiCtlError::MissingCredentials)
    }

    /// Settings for a new machine: defaults, then profile, then flags
    pub fn machine_config(&self, name: &str, profile_name: Option<&str>) -> CliResult<MachineConfig> {
        let mut config = MachineConfig::new(name);
        if let Some((_, profile)) = self.profile(profile_name)? {
            profile.apply_to(&mut config);
        }
        Ok(config)
    }

    /// Driver for a machine, with the endpoint overridden when requested
    pub fn create_driver(
        &self,
        mut record: MachineRecord,
        profile_name: Option<&str>,
        connection: &ConnectionArgs,
        wait: WaitOptions,
        on_progress: Option<ProgressCallback>,
    ) -> CliResult<GandiDriver> {
        let api_key = self.resolve_api_key(profile_name, connection)?;
        if let Some(url) = &connection.url {
            record.config.url = url.clone();
        }
        debug!(
            "Creating Gandi driver for '{}' at {}",
            record.name(),
            record.config.url
        );

        let driver = GandiDriver::from_record(record, &api_key)?.with_wait_options(wait);
        Ok(match on_progress {
            Some(cb) => driver.with_progress(cb),
            None => driver,
        })
    }

    /// Bare hosting client, for operation commands
    pub fn create_client(
        &self,
        profile_name: Option<&str>,
        connection: &ConnectionArgs,
    ) -> CliResult<HostingClient> {
        let api_key = self.resolve_api_key(profile_name, connection)?;
        let url = match &connection.url {
            Some(url) => url.clone(),
            None => self
                .profile(profile_name)?
                .and_then(|(_, profile)| profile.url.clone())
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
        };
        debug!("Creating hosting client for {}", url);
        Ok(HostingClient::new(&url, api_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_profile(api_key: Option<&str>) -> ConnectionManager {
        let mut config = Config::default();
        config.set_profile(
            "prod".to_string(),
            Profile {
                api_key: api_key.map(String::from),
                datacenter: Some("FR-SD2".to_string()),
                ..Default::default()
            },
        );
        ConnectionManager::with_config_path(config, Some(PathBuf::from("/tmp/gandictl/config.toml")))
    }

    #[test]
    fn test_flag_key_wins_over_profile() {
        let mgr = manager_with_profile(Some("from-profile"));
        let args = ConnectionArgs {
            api_key: Some("from-flag".to_string()),
            url: None,
        };
        assert_eq!(mgr.resolve_api_key(None, &args).unwrap(), "from-flag");
    }

    #[test]
    fn test_profile_key_used_without_flag() {
        let mgr = manager_with_profile(Some("from-profile"));
        let key = mgr.resolve_api_key(None, &ConnectionArgs::default()).unwrap();
        assert_eq!(key, "from-profile");
    }

    #[test]
    fn test_missing_key_is_reported() {
        let mgr = manager_with_profile(None);
        let err = mgr
            .resolve_api_key(None, &ConnectionArgs::default())
            .unwrap_err();
        assert!(matches!(err, GandiCtlError::MissingCredentials));

        let empty = ConnectionManager::with_config_path(Config::default(), None);
        assert!(matches!(
            empty.resolve_api_key(None, &ConnectionArgs::default()),
            Err(GandiCtlError::MissingCredentials)
        ));
    }

    #[test]
    fn test_unknown_profile_is_reported() {
        let mgr = manager_with_profile(Some("k"));
        let err = mgr
            .resolve_api_key(Some("staging"), &ConnectionArgs::default())
            .unwrap_err();
        assert!(matches!(err, GandiCtlError::ProfileNotFound { ref name } if name == "staging"));
    }

    #[test]
    fn test_machine_config_applies_profile() {
        let mgr = manager_with_profile(Some("k"));
        let config = mgr.machine_config("web-1", None).unwrap();
        assert_eq!(config.datacenter, "FR-SD2");
        assert_eq!(config.memory, 512);
    }

    #[test]
    fn test_store_path_next_to_config() {
        let mgr = manager_with_profile(None);
        assert_eq!(
            mgr.store_path().unwrap(),
            PathBuf::from("/tmp/gandictl/machines.toml")
        );
    }

    #[test]
    fn test_driver_url_override() {
        let mgr = manager_with_profile(Some("k"));
        let args = ConnectionArgs {
            api_key: None,
            url: Some("http://127.0.0.1:9/xmlrpc/".to_string()),
        };
        let record = MachineRecord::new(MachineConfig::new("web-1"));
        let driver = mgr
            .create_driver(record, None, &args, WaitOptions::default(), None)
            .unwrap();
        assert_eq!(driver.record().config.url, "http://127.0.0.1:9/xmlrpc/");
    }
}
