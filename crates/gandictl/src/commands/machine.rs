//! Machine lifecycle command implementations

use colored::Colorize;
use gandictl_core::driver::docker_url;
use gandictl_core::{Driver, MachineRecord, MachineState};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::{ConnectionArgs, CreateArgs, LifecycleArgs, OutputFormat, RemoveArgs};
use crate::commands::wait::{spinner, until_interrupted};
use crate::connection::ConnectionManager;
use crate::error::{GandiCtlError, Result as CliResult};
use crate::output::{self, print_output};

/// Lifecycle actions that map to a single hosting operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Restart,
    Kill,
}

impl Action {
    fn progressive(self) -> &'static str {
        match self {
            Action::Start => "Starting",
            Action::Stop => "Stopping",
            Action::Restart => "Restarting",
            Action::Kill => "Killing",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Action::Start => "started",
            Action::Stop => "stopped",
            Action::Restart => "restarted",
            Action::Kill => "killed",
        }
    }
}

/// One line of `ls` output
#[derive(Debug, Serialize)]
struct MachineRow {
    name: String,
    driver: &'static str,
    state: String,
    url: String,
    datacenter: String,
}

/// Result of a lifecycle command in JSON/YAML output
#[derive(Debug, Serialize)]
struct ActionResult<'a> {
    name: &'a str,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    vm_id: Option<i64>,
}

pub async fn handle_create(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    args: &CreateArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let mut store = conn_mgr.load_store()?;
    if store.contains(&args.name) {
        return Err(GandiCtlError::MachineExists {
            name: args.name.clone(),
        });
    }

    let mut config = conn_mgr.machine_config(&args.name, profile_name)?;
    if let Some(image) = &args.image {
        config.image = image.clone();
    }
    if let Some(datacenter) = &args.datacenter {
        config.datacenter = datacenter.clone();
    }
    if let Some(memory) = args.memory {
        config.memory = memory;
    }
    if let Some(cores) = args.cores {
        config.cores = cores;
    }
    if let Some(ssh_user) = &args.ssh_user {
        config.ssh_user = ssh_user.clone();
    }
    if let Some(ssh_port) = args.ssh_port {
        config.ssh_port = ssh_port;
    }

    let ssh_key = match &args.ssh_key {
        Some(path) => Some(read_public_key(path)?),
        None => None,
    };

    let (pb, on_progress) = spinner(&format!("Creating machine '{}'", args.name));
    let mut driver = conn_mgr.create_driver(
        MachineRecord::new(config),
        profile_name,
        &args.connection,
        args.wait.options(),
        Some(on_progress),
    )?;

    info!(
        "Creating '{}' in {} from '{}'",
        args.name,
        driver.record().config.datacenter,
        driver.record().config.image
    );
    let result = until_interrupted(&pb, async {
        driver.pre_create_check().await?;
        driver.create(ssh_key.as_deref()).await
    })
    .await;

    let record = driver.record().clone();
    if let Err(e) = result {
        // An ordered VM is billed whether or not we saw it come up
        if record.is_provisioned() {
            warn!("Keeping '{}' after failed creation: {}", args.name, e);
            store.insert(record);
            conn_mgr.save_store(&store)?;
            eprintln!(
                "{} '{}' was ordered on Gandi but did not finish; \
                 it is kept so 'gandictl rm {}' can delete it",
                "warning:".yellow().bold(),
                args.name,
                args.name
            );
        }
        return Err(e);
    }

    store.insert(record.clone());
    conn_mgr.save_store(&store)?;

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            print_output(&record, output_format.into())?;
        }
        OutputFormat::Auto | OutputFormat::Table => {
            println!(
                "Machine '{}' created (VM {}, IP {}).",
                record.name().bold(),
                record.vm_id.unwrap_or_default(),
                record.ip().unwrap_or("-")
            );
        }
    }
    Ok(())
}

pub async fn handle_lifecycle(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    action: Action,
    args: &LifecycleArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let record = conn_mgr.load_store()?.get(&args.name)?.clone();
    let vm_id = record.vm_id;

    let (pb, on_progress) = spinner(&format!("{} machine '{}'", action.progressive(), args.name));
    let driver = conn_mgr.create_driver(
        record,
        profile_name,
        &args.connection,
        args.wait.options(),
        Some(on_progress),
    )?;

    debug!("{:?} {}", action, args.name);
    until_interrupted(&pb, async {
        match action {
            Action::Start => driver.start().await,
            Action::Stop => driver.stop().await,
            Action::Restart => driver.restart().await,
            Action::Kill => driver.kill().await,
        }
    })
    .await?;

    print_action(&args.name, action.past(), vm_id, output_format)
}

pub async fn handle_remove(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    args: &RemoveArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let mut store = conn_mgr.load_store()?;
    let record = store.get(&args.name)?.clone();
    let vm_id = record.vm_id;

    if record.is_provisioned() {
        let (pb, on_progress) = spinner(&format!("Removing machine '{}'", args.name));
        let result = async {
            let driver = conn_mgr.create_driver(
                record,
                profile_name,
                &args.connection,
                args.wait.options(),
                Some(on_progress),
            )?;
            until_interrupted(&pb, driver.remove()).await
        }
        .await;

        match result {
            Ok(()) => {}
            Err(GandiCtlError::Cancelled) => return Err(GandiCtlError::Cancelled),
            Err(e) if args.force => {
                pb.finish_and_clear();
                warn!("Forgetting '{}' despite error: {}", args.name, e);
                eprintln!(
                    "{} could not delete '{}' on Gandi: {}",
                    "warning:".yellow().bold(),
                    args.name,
                    e
                );
            }
            Err(e) => return Err(e),
        }
    } else {
        debug!("'{}' was never created on Gandi, forgetting it", args.name);
    }

    store.remove(&args.name);
    conn_mgr.save_store(&store)?;

    print_action(&args.name, "removed", vm_id, output_format)
}

pub async fn handle_status(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    name: &str,
    connection: &ConnectionArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let record = conn_mgr.load_store()?.get(name)?.clone();
    let driver = conn_mgr.create_driver(
        record,
        profile_name,
        connection,
        Default::default(),
        None,
    )?;
    let state = driver.state().await?;

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => print_output(
            serde_json::json!({ "name": name, "state": state }),
            output_format.into(),
        )?,
        OutputFormat::Auto | OutputFormat::Table => println!("{}", state),
    }
    Ok(())
}

pub fn handle_ip(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    let store = conn_mgr.load_store()?;
    let ip = recorded_ip(store.get(name)?)?;
    println!("{}", ip);
    Ok(())
}

pub fn handle_url(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    let store = conn_mgr.load_store()?;
    let ip = recorded_ip(store.get(name)?)?;
    println!("{}", docker_url(ip));
    Ok(())
}

pub fn handle_inspect(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let store = conn_mgr.load_store()?;
    let record = store.get(name)?;
    let format = match output_format {
        OutputFormat::Auto => output::OutputFormat::Json,
        other => other.into(),
    };
    print_output(record, format)?;
    Ok(())
}

pub async fn handle_list(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    quiet: bool,
    connection: &ConnectionArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let store = conn_mgr.load_store()?;

    if store.is_empty() && matches!(output_format, OutputFormat::Auto | OutputFormat::Table) {
        println!("No machines.");
        println!("Use 'gandictl create <name>' to create one.");
        return Ok(());
    }

    let query_states = !quiet
        && conn_mgr.resolve_api_key(profile_name, connection).is_ok()
        && !store.is_empty();
    if !quiet && !query_states {
        debug!("No API key available, listing machines without state");
    }

    let mut rows = Vec::new();
    for record in store.list() {
        let state = if query_states {
            machine_state(conn_mgr, profile_name, connection, record).await
        } else {
            MachineState::None
        };
        rows.push(MachineRow {
            name: record.name().to_string(),
            driver: "gandi",
            state: state.to_string(),
            url: record.ip().map(docker_url).unwrap_or_default(),
            datacenter: record.config.datacenter.clone(),
        });
    }

    print_output(&rows, output_format.into())?;
    Ok(())
}

/// State for listing; any failure shows as `Error`
async fn machine_state(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    connection: &ConnectionArgs,
    record: &MachineRecord,
) -> MachineState {
    if !record.is_provisioned() {
        return MachineState::None;
    }
    let driver = match conn_mgr.create_driver(
        record.clone(),
        profile_name,
        connection,
        Default::default(),
        None,
    ) {
        Ok(driver) => driver,
        Err(e) => {
            warn!("Cannot query '{}': {}", record.name(), e);
            return MachineState::Error;
        }
    };
    let (state, cause) = driver.state_or_error().await;
    if let Some(e) = cause {
        warn!("Cannot query '{}': {}", record.name(), e);
    }
    state
}

fn recorded_ip(record: &MachineRecord) -> CliResult<&str> {
    record.ip().ok_or_else(|| GandiCtlError::ApiError {
        message: format!("Machine '{}': IP address is not set", record.name()),
    })
}

fn read_public_key(path: &str) -> CliResult<String> {
    let key = std::fs::read_to_string(path).map_err(|e| GandiCtlError::FileError {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    if key.trim().is_empty() {
        return Err(GandiCtlError::FileError {
            path: path.to_string(),
            message: "public key file is empty".to_string(),
        });
    }
    Ok(key)
}

fn print_action(
    name: &str,
    action: &'static str,
    vm_id: Option<i64>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => print_output(
            ActionResult {
                name,
                action,
                vm_id,
            },
            output_format.into(),
        )?,
        OutputFormat::Auto | OutputFormat::Table => {
            println!("Machine '{}' {}.", name.bold(), action);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gandictl_core::MachineConfig;
    use std::io::Write;

    #[test]
    fn test_action_wording() {
        assert_eq!(Action::Restart.progressive(), "Restarting");
        assert_eq!(Action::Kill.past(), "killed");
    }

    #[test]
    fn test_recorded_ip_requires_address() {
        let mut record = MachineRecord::new(MachineConfig::new("web-1"));
        record.ip_address = Some("0".to_string());
        assert!(recorded_ip(&record).is_err());

        record.ip_address = Some("192.0.2.7".to_string());
        assert_eq!(recorded_ip(&record).unwrap(), "192.0.2.7");
    }

    #[test]
    fn test_read_public_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ssh-ed25519 AAAA user@host").unwrap();
        let key = read_public_key(file.path().to_str().unwrap()).unwrap();
        assert!(key.starts_with("ssh-ed25519"));

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            read_public_key(empty.path().to_str().unwrap()),
            Err(GandiCtlError::FileError { .. })
        ));
        assert!(matches!(
            read_public_key("/definitely/not/here.pub"),
            Err(GandiCtlError::FileError { .. })
        ));
    }
}
