//! Profile management command implementations

use colored::Colorize;
use gandictl_core::Profile;
use serde_json::json;
use tracing::{debug, info, trace};

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{GandiCtlError, Result as CliResult};
use crate::output::print_output;

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            api_key,
            url,
            datacenter,
            image,
            memory,
            cores,
            default,
        } => {
            let update = Profile {
                api_key: api_key.clone(),
                url: url.clone(),
                datacenter: datacenter.clone(),
                image: image.clone(),
                memory: *memory,
                cores: *cores,
            };
            handle_set(conn_mgr, name, update, *default)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        Default { name } => handle_default(conn_mgr, name),
    }
}

fn profile_json(name: &str, profile: &Profile, is_default: bool) -> serde_json::Value {
    json!({
        "name": name,
        "default": is_default,
        "api_key": profile.api_key_preview(),
        "url": profile.url,
        "datacenter": profile.datacenter,
        "image": profile.image,
        "memory": profile.memory,
        "cores": profile.cores,
    })
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default = conn_mgr.config.default_profile.as_deref();

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let config_path = conn_mgr
                .resolved_config_path()
                .ok()
                .map(|p| p.display().to_string());
            let profile_list: Vec<_> = profiles
                .iter()
                .map(|(name, profile)| profile_json(name, profile, default == Some(name.as_str())))
                .collect();

            print_output(
                json!({
                    "config_path": config_path,
                    "profiles": profile_list,
                    "count": profiles.len(),
                }),
                output_format.into(),
            )?;
        }
        OutputFormat::Auto | OutputFormat::Table => {
            if let Ok(path) = conn_mgr.resolved_config_path() {
                println!("Configuration file: {}", path.display());
                println!();
            }

            if profiles.is_empty() {
                info!("No profiles configured");
                println!("No profiles configured.");
                println!("Use 'gandictl profile set <name> --api-key <key>' to create a profile.");
                return Ok(());
            }

            for (name, profile) in &profiles {
                if default == Some(name.as_str()) {
                    println!("  {} {}", name.bold().cyan(), "(default)".green());
                } else {
                    println!("  {}", name.bold().cyan());
                }
                if let Some(url) = &profile.url {
                    println!("    {} {}", "URL:".dimmed(), url);
                }
                if let Some(dc) = &profile.datacenter {
                    println!("    {} {}", "Datacenter:".dimmed(), dc);
                }
            }
        }
    }

    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let path = conn_mgr.resolved_config_path()?;
    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => print_output(
            json!({
                "config_path": path.display().to_string(),
                "machines_path": conn_mgr.store_path()?.display().to_string(),
            }),
            output_format.into(),
        )?,
        OutputFormat::Auto | OutputFormat::Table => println!("{}", path.display()),
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    debug!("Showing profile: {}", name);
    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    print_output(profile_json(name, profile, is_default), output_format.into())?;
    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    update: Profile,
    make_default: bool,
) -> CliResult<()> {
    if name.trim().is_empty() {
        return Err(GandiCtlError::InvalidInput {
            message: "profile name must not be empty".to_string(),
        });
    }
    debug!("Setting profile: {}", name);

    let mut config = conn_mgr.load_raw_config()?;
    let existed = config.profiles.contains_key(name);
    let mut profile = config.profiles.get(name).cloned().unwrap_or_default();
    merge_profile(&mut profile, update);
    config.set_profile(name.to_string(), profile);

    if make_default || config.profiles.len() == 1 {
        config.default_profile = Some(name.to_string());
    }

    conn_mgr.save_config(&config)?;

    if existed {
        println!("Profile '{}' updated.", name);
    } else {
        println!("Profile '{}' created.", name);
    }
    if config.default_profile.as_deref() == Some(name) {
        println!("'{}' is the default profile.", name);
    }
    Ok(())
}

/// Fields given on the command line replace stored ones; the rest are kept
fn merge_profile(profile: &mut Profile, update: Profile) {
    if update.api_key.is_some() {
        profile.api_key = update.api_key;
    }
    if update.url.is_some() {
        profile.url = update.url;
    }
    if update.datacenter.is_some() {
        profile.datacenter = update.datacenter;
    }
    if update.image.is_some() {
        profile.image = update.image;
    }
    if update.memory.is_some() {
        profile.memory = update.memory;
    }
    if update.cores.is_some() {
        profile.cores = update.cores;
    }
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    let mut config = conn_mgr.load_raw_config()?;
    let was_default = config.default_profile.as_deref() == Some(name);
    if config.remove_profile(name).is_none() {
        return Err(GandiCtlError::ProfileNotFound { name: name.into() });
    }

    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed.", name);
    if was_default {
        println!("Default profile cleared.");
    }
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    let mut config = conn_mgr.load_raw_config()?;
    config.profile(name)?;
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}
