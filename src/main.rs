//! FHIR Search Latency Client - Main CLI Application
//!
//! Searches a FHIR server for patients by family name and reports the
//! average response time of repeated batch runs over a names file.

use clap::Parser;
use fhir_search_latency::{
    app::App,
    cli::Cli,
    config::load_config,
    error::{AppError, Result},
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let use_color = cli.use_colors();

    if let Err(e) = run_application(cli).await {
        eprintln!("{}", e.format_for_console(use_color));
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Configuration failures are the only errors that reach this point
async fn run_application(cli: Cli) -> Result<()> {
    let config = load_config(cli)?;

    if !config.enable_color {
        colored::control::set_override(false);
    }

    let app = App::from_config(config).await?;

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available: never interrupt
            std::future::pending::<()>().await;
        }
    };

    app.run(interrupt).await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    if let AppError::Config(_) | AppError::Validation(_) = error {
        eprintln!();
        eprintln!("Configuration help:");
        eprintln!("  - Check your .env file format");
        eprintln!("  - The FHIR base URL must start with http:// or https://");
        eprintln!("  - TIMEOUT_SECONDS must be between 1 and 300");
        eprintln!("  - RUN_PLAN is a comma-separated list of 'cached' or 'no-cache'");
    }
}
