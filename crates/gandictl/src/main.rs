use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use gandictl_core::Config;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::machine::Action;
use connection::ConnectionManager;
use error::GandiCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    let (config, config_path) = match load_config(cli.config_file.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(
    config_file: Option<&str>,
) -> Result<(Config, Option<std::path::PathBuf>), GandiCtlError> {
    match config_file {
        Some(config_file) => {
            let path = std::path::PathBuf::from(config_file);
            debug!("Loading config from explicit path: {:?}", path);
            Ok((Config::load_from_path(&path)?, Some(path)))
        }
        None => {
            debug!("Loading config from default location");
            Ok((Config::load()?, None))
        }
    }
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over the verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "gandictl=warn,gandictl_core=warn",
            1 => "gandictl=info,gandictl_core=info",
            2 => "gandictl=debug,gandictl_core=debug",
            _ => "gandictl=trace,gandictl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), GandiCtlError> {
    info!("Command: {}", format_command(&cli.command));

    let profile = cli.profile.as_deref();
    let output = cli.output;

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Create(args) => {
            commands::machine::handle_create(conn_mgr, profile, args, output).await
        }
        Commands::Start(args) => {
            commands::machine::handle_lifecycle(conn_mgr, profile, Action::Start, args, output)
                .await
        }
        Commands::Stop(args) => {
            commands::machine::handle_lifecycle(conn_mgr, profile, Action::Stop, args, output)
                .await
        }
        Commands::Restart(args) => {
            commands::machine::handle_lifecycle(conn_mgr, profile, Action::Restart, args, output)
                .await
        }
        Commands::Kill(args) => {
            commands::machine::handle_lifecycle(conn_mgr, profile, Action::Kill, args, output)
                .await
        }
        Commands::Rm(args) => {
            commands::machine::handle_remove(conn_mgr, profile, args, output).await
        }
        Commands::Status { name, connection } => {
            commands::machine::handle_status(conn_mgr, profile, name, connection, output).await
        }
        Commands::Ip { name } => commands::machine::handle_ip(conn_mgr, name),
        Commands::Url { name } => commands::machine::handle_url(conn_mgr, name),
        Commands::Inspect { name } => commands::machine::handle_inspect(conn_mgr, name, output),
        Commands::Ls { quiet, connection } => {
            commands::machine::handle_list(conn_mgr, profile, *quiet, connection, output).await
        }
        Commands::Operation(op_cmd) => {
            commands::operation::handle_operation_command(op_cmd, conn_mgr, profile, output).await
        }
        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, output).await
        }
        Commands::Version => print_version(output),
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

fn print_version(format: cli::OutputFormat) -> Result<(), GandiCtlError> {
    match format {
        cli::OutputFormat::Json | cli::OutputFormat::Yaml => {
            let output_data = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "name": env!("CARGO_PKG_NAME"),
            });
            output::print_output(&output_data, format.into())?;
        }
        _ => {
            println!("gandictl {}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for logging, without credentials
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Create(args) => format!("create {} [api key redacted]", args.name),
        Commands::Start(args) => format!("start {}", args.name),
        Commands::Stop(args) => format!("stop {}", args.name),
        Commands::Restart(args) => format!("restart {}", args.name),
        Commands::Kill(args) => format!("kill {}", args.name),
        Commands::Rm(args) if args.force => format!("rm --force {}", args.name),
        Commands::Rm(args) => format!("rm {}", args.name),
        Commands::Status { name, .. } => format!("status {}", name),
        Commands::Ip { name } => format!("ip {}", name),
        Commands::Url { name } => format!("url {}", name),
        Commands::Inspect { name } => format!("inspect {}", name),
        Commands::Ls { .. } => "ls".to_string(),
        Commands::Operation(cmd) => {
            use cli::OperationCommands::*;
            match cmd {
                Info { id, .. } => format!("operation info {}", id),
                Wait { id, .. } => format!("operation wait {}", id),
            }
        }
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
    }
}
