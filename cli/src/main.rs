//! winsvc-agent — install and hot-swap the service wrapper of build agents

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use winsvc_agent::app::AppContext;
use winsvc_agent::cli::Cli;
use winsvc_agent::output::json;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());
    let json_mode = cli.json;

    let app = match AppContext::new(&cli.app_flags()) {
        Ok(app) => app,
        Err(e) => return report_error(&e, json_mode),
    };
    let result = cli.run(&app).await;
    app.shutdown.drain().await;

    match result {
        Ok(code) => code,
        Err(e) => report_error(&e, json_mode),
    }
}

/// Structured logs go to stderr; `RUST_LOG` overrides the verbosity flags.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_error(err: &anyhow::Error, json_mode: bool) -> ExitCode {
    tracing::debug!(error = ?err, "command failed");
    if json_mode {
        match json::format_error(&format!("{err:#}"), json::error_code(err)) {
            Ok(obj) => eprintln!("{obj}"),
            Err(_) => eprintln!("Error: {err:#}"),
        }
    } else {
        eprintln!("Error: {err:#}");
    }
    ExitCode::FAILURE
}
