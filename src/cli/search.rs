use crate::cli::{connect, load, CliError};
use crate::controller::{ControllerStatus, SessionController};
use crate::export::query::TimeRange;
use crate::export::record::SearchRecord;
use crate::session::SessionOutcome;
use clap::{Args, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `{seq}-{time}<TAB>{event}` per line
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Search query; `search` is prepended when missing
    pub query: String,

    /// Earliest time bound (e.g. 2014-06-15T12:00:00 or -24h)
    #[arg(long)]
    pub earliest: Option<String>,

    /// Latest time bound (e.g. 2014-06-16T12:00:00 or now)
    #[arg(long)]
    pub latest: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Log in, run one export session to completion, and print its records.
///
/// Ctrl+C requests cancellation; the session stops at the next stream boundary
/// and nothing is printed. A second Ctrl+C aborts the stream being drained.
pub async fn run(config_path: Option<PathBuf>, args: SearchArgs) -> Result<(), CliError> {
    let config = load(config_path)?;
    let transport = Arc::new(connect(&config).await?);

    let (report_tx, mut report_rx) = mpsc::channel(1);
    let mut controller = SessionController::new(transport, report_tx);
    let mut status_rx = controller.subscribe();

    let time_range = TimeRange::from_bounds(args.earliest, args.latest);
    controller.submit(&args.query, time_range).await;

    let report = loop {
        tokio::select! {
            report = report_rx.recv() => break report,
            _ = signal::ctrl_c() => {
                if controller.status() == ControllerStatus::Searching && controller.cancel() {
                    eprintln!("Cancelling... (press Ctrl+C again to abort)");
                } else {
                    // Second interrupt: stop a stream that is still draining
                    eprintln!("Aborting...");
                    controller.abort().await;
                }
            }
            changed = status_rx.changed() => {
                if changed.is_ok() {
                    info!(status = ?*status_rx.borrow(), "Search status");
                }
            }
        }
    };

    let report = match report {
        Some(report) => report,
        None => {
            warn!("Session ended without a report");
            return Ok(());
        }
    };

    match report.outcome {
        SessionOutcome::Completed(records) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_records(&mut out, &records, args.format)?;
            out.flush()?;
            info!(records = records.len(), "Search complete");
            Ok(())
        }
        SessionOutcome::Cancelled => {
            eprintln!("Search cancelled");
            Ok(())
        }
        SessionOutcome::Failed(e) => Err(e.into()),
    }
}

pub fn write_records<W: Write>(
    out: &mut W,
    records: &[SearchRecord],
    format: OutputFormat,
) -> Result<(), CliError> {
    for record in records {
        match format {
            OutputFormat::Text => writeln!(out, "{}\t{}", record.label(), record.text)?,
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(record)?)?,
        }
    }
    Ok(())
}
