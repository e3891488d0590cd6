//! Spinner output and Ctrl-C handling for commands that wait on operations

use std::future::Future;
use std::sync::Arc;

use gandictl_core::{ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::error::{GandiCtlError, Result as CliResult};

/// Spinner plus the callback that drives it
pub fn spinner(message: &str) -> (ProgressBar, ProgressCallback) {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());

    let label = message.to_string();
    let pb_clone = pb.clone();
    let callback: ProgressCallback = Arc::new(move |event: ProgressEvent| match &event {
        ProgressEvent::Started { operation_id } => {
            pb_clone.set_message(format!("{} (operation {})", label, operation_id));
        }
        ProgressEvent::Polling {
            operation_id,
            status,
            ..
        } => {
            pb_clone.set_message(format!(
                "{} (operation {}: {})",
                label,
                operation_id,
                format_step(status)
            ));
            pb_clone.tick();
        }
        ProgressEvent::Completed { operation_id } => {
            pb_clone.set_message(format!(
                "{} (operation {}: {})",
                label,
                operation_id,
                format_step("DONE")
            ));
        }
        ProgressEvent::Failed {
            operation_id,
            error,
        } => {
            pb_clone.set_message(format!(
                "{} (operation {} failed: {})",
                label, operation_id, error
            ));
        }
    });

    (pb, callback)
}

/// Run `fut` to completion unless the user presses Ctrl-C first.
///
/// Dropping the future stops polling; work already queued on Gandi continues.
pub async fn until_interrupted<T, F>(pb: &ProgressBar, fut: F) -> CliResult<T>
where
    F: Future<Output = gandictl_core::Result<T>>,
{
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    let result = tokio::select! {
        res = fut => res.map_err(GandiCtlError::from),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; queued operations keep running on Gandi");
            Err(GandiCtlError::Cancelled)
        }
    };
    pb.finish_and_clear();
    result
}

/// Operation step with a status icon
fn format_step(step: &str) -> String {
    match step {
        "DONE" => format!("\u{2713} {}", step),
        "BILL" | "WAIT" | "RUN" => format!("\u{21bb} {}", step),
        _ => format!("\u{2717} {}", step),
    }
}
