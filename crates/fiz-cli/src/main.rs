//! Fiz CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};

use fiz_cli::{
    Args,
    error_adapter::{Reportable, diagnostics_to_reportables, to_reportables},
};

fn render(reporter: &miette::GraphicalReportHandler, reportable: &Reportable<'_>) -> String {
    let mut writer = String::new();
    if let Err(err) = reporter.render_report(&mut writer, reportable) {
        return format!("{reportable} (report rendering failed: {err})");
    }
    writer
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Fiz");
    debug!(args:?; "Parsed arguments");

    let reporter = miette::GraphicalReportHandler::new();
    match fiz_cli::run(&args).await {
        Ok(outcome) => {
            for reportable in diagnostics_to_reportables(&outcome.diagnostics, &outcome.source) {
                warn!("{}", render(&reporter, &reportable));
            }
            info!("Completed successfully");
        }
        Err(err) => {
            // Render each diagnostic independently
            for reportable in to_reportables(&err) {
                error!("{}", render(&reporter, &reportable));
            }
            process::exit(1);
        }
    }
}
