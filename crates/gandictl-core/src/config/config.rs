//! Configuration management for gandictl
//!
//! Handles loading profiles from a TOML file. A profile carries the API key
//! and the defaults applied to new machines; CLI flags and environment
//! variables override it.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use crate::driver::MachineConfig;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when `--profile` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Memory in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,
}

impl Profile {
    /// Overlay the values this profile sets onto machine settings
    pub fn apply_to(&self, machine: &mut MachineConfig) {
        if let Some(url) = &self.url {
            machine.url = url.clone();
        }
        if let Some(datacenter) = &self.datacenter {
            machine.datacenter = datacenter.clone();
        }
        if let Some(image) = &self.image {
            machine.image = image.clone();
        }
        if let Some(memory) = self.memory {
            machine.memory = memory;
        }
        if let Some(cores) = self.cores {
            machine.cores = cores;
        }
    }

    /// First characters of the API key, safe to print
    pub fn api_key_preview(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| {
            let prefix: String = key.chars().take(4).collect();
            format!("{}...", prefix)
        })
    }
}

impl Config {
    /// Resolve the profile name to use
    ///
    /// Resolution order: explicit name, `default_profile`, then the first
    /// profile in alphabetical order.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'gandictl profile set <name> --api-key <key>' to create one, \
                    or set GANDI_APIKEY."
                    .to_string(),
            })
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// The profile a command should use, if any.
    ///
    /// With no profiles configured and none requested this is `Ok(None)`, so
    /// commands can run from flags and environment variables alone.
    pub fn active_profile(&self, explicit_profile: Option<&str>) -> Result<Option<(String, &Profile)>> {
        if explicit_profile.is_none() && self.profiles.is_empty() {
            return Ok(None);
        }
        let name = self.resolve_profile(explicit_profile)?;
        let profile = self.profile(&name)?;
        Ok(Some((name, profile)))
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path, expanding `${VAR}` references
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        Self::read_from_path(config_path, true)
    }

    /// Load configuration exactly as written, leaving `${VAR}` references in
    /// place.
    ///
    /// Use this when the loaded config will be saved back, so references to
    /// secrets are not replaced by their values on disk.
    pub fn load_raw_from_path(config_path: &Path) -> Result<Self> {
        Self::read_from_path(config_path, false)
    }

    fn read_from_path(config_path: &Path, expand: bool) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let config: Config = if expand {
            toml::from_str(&Self::expand_env_vars(&content))?
        } else {
            toml::from_str(&content)?
        };

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/gandictl/config.toml
    /// On macOS: ~/Library/Application Support/net.gandi.gandictl/config.toml
    /// On Windows: %APPDATA%\gandi\gandictl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("net", "gandi", "gandictl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as-is so profiles that are
    /// not in use do not break loading.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(api_key: &str) -> Profile {
        Profile {
            api_key: Some(api_key.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_profile(
            "prod".to_string(),
            Profile {
                api_key: Some("abcdef123456".to_string()),
                datacenter: Some("FR-SD2".to_string()),
                memory: Some(2048),
                ..Default::default()
            },
        );
        config.default_profile = Some("prod".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.default_profile.as_deref(), Some("prod"));
        assert_eq!(deserialized.profiles["prod"], config.profiles["prod"]);
    }

    #[test]
    fn test_resolve_profile_order() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), profile("z"));
        config.set_profile("alpha".to_string(), profile("a"));

        assert_eq!(config.resolve_profile(Some("zeta")).unwrap(), "zeta");
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");
    }

    #[test]
    fn test_resolve_profile_without_profiles() {
        let config = Config::default();
        let err = config.resolve_profile(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoProfiles { .. }));
        assert!(config.active_profile(None).unwrap().is_none());
    }

    #[test]
    fn test_active_profile_unknown_name() {
        let config = Config::default();
        let err = config.active_profile(Some("missing")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { ref name } if name == "missing"));
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("prod".to_string(), profile("p"));
        config.default_profile = Some("prod".to_string());

        assert!(config.remove_profile("prod").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("prod").is_none());
    }

    #[test]
    fn test_apply_to_overrides_only_set_fields() {
        let mut machine = MachineConfig::new("web-1");
        let profile = Profile {
            datacenter: Some("US-BA1".to_string()),
            cores: Some(4),
            ..Default::default()
        };
        profile.apply_to(&mut machine);

        assert_eq!(machine.datacenter, "US-BA1");
        assert_eq!(machine.cores, 4);
        assert_eq!(machine.memory, 512);
        assert_eq!(machine.image, "Ubuntu 14.04 64 bits LTS (HVM)");
    }

    #[test]
    fn test_api_key_preview() {
        assert_eq!(profile("abcdef").api_key_preview().as_deref(), Some("abcd..."));
        assert_eq!(Profile::default().api_key_preview(), None);
    }

    #[test]
    fn test_env_var_default_expansion() {
        let expanded =
            Config::expand_env_vars("url = \"${GANDICTL_TEST_SURELY_UNSET_VAR:-https://example.test/}\"");
        assert_eq!(expanded, "url = \"https://example.test/\"");

        let untouched = Config::expand_env_vars("api_key = \"${GANDICTL_TEST_SURELY_UNSET_VAR}\"");
        assert_eq!(untouched, "api_key = \"${GANDICTL_TEST_SURELY_UNSET_VAR}\"");
    }
}
