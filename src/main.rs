//! Command-line entry point.
//!
//! Usage: `stagehttp [config.json]`. Without a path the defaults apply; log
//! verbosity follows `RUST_LOG` and defaults to `info`.

use std::process::ExitCode;

use log::error;
use stagehttp::{HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ServerConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Unable to load configuration from {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    if let Err(e) = HttpServer::new(config).run().await {
        error!("Server failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
