//! `serve` command

use super::{coordinator_or_exit, load_or_exit, EXIT_FATAL, EXIT_OK};
use crate::server::{self, AppState};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Override the configured port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let mut config = match load_or_exit(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        if let Some(port) = self.port {
            config.server.port = port;
        }

        let coordinator = match coordinator_or_exit(&config).await {
            Ok(coordinator) => Arc::new(coordinator),
            Err(code) => return Ok(code),
        };
        let state = Arc::new(AppState::new(coordinator, config.environment.clone()));

        match server::serve(&config.server, state, shutdown).await {
            Ok(()) => Ok(EXIT_OK),
            Err(e) => {
                tracing::error!(error = %e, "Server failed");
                eprintln!("Server failed: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}
