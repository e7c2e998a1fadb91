use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod plan;
mod session;

fn main() -> ExitCode {
    init_tracing();
    info!("=== Feign Session ===");

    match session::run() {
        Ok(summary_path) => {
            info!(path = %summary_path.display(), "session summary written");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!(error = %message, "session_failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
