//! Operation commands

use gandictl_core::wait_for_operation;
use tracing::debug;

use crate::cli::{OperationCommands, OutputFormat};
use crate::commands::wait::{spinner, until_interrupted};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::print_output;

pub async fn handle_operation_command(
    cmd: &OperationCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        OperationCommands::Info { id, connection } => {
            let client = conn_mgr.create_client(profile_name, connection)?;
            debug!("Fetching operation {}", id);
            let op = client.operation_info(*id).await?;
            print_output(&op, output_format.into())?;
            Ok(())
        }
        OperationCommands::Wait {
            id,
            connection,
            wait,
        } => {
            let client = conn_mgr.create_client(profile_name, connection)?;
            let (pb, on_progress) = spinner(&format!("Waiting for operation {}", id));
            let op = until_interrupted(
                &pb,
                wait_for_operation(&client, *id, wait.options(), Some(on_progress)),
            )
            .await?;

            match output_format {
                OutputFormat::Json | OutputFormat::Yaml => {
                    print_output(&op, output_format.into())?
                }
                OutputFormat::Auto | OutputFormat::Table => {
                    println!("Operation {} finished: {}", op.id, op.status)
                }
            }
            Ok(())
        }
    }
}
