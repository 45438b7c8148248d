//! `status` command

use super::{coordinator_or_exit, load_or_exit, EXIT_FATAL, EXIT_OK};
use crate::core::export::{EndpointHealth, Overview};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Print the overview as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        let config = match load_or_exit(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let coordinator = match coordinator_or_exit(&config).await {
            Ok(coordinator) => coordinator,
            Err(code) => return Ok(code),
        };

        let overview = match coordinator.overview().await {
            Ok(overview) => overview,
            Err(e) => {
                eprintln!("❌ Failed to read export state");
                eprintln!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&overview)?);
        } else {
            print_overview(&overview);
        }
        Ok(EXIT_OK)
    }
}

fn print_overview(overview: &Overview) {
    let m = &overview.measurements;
    let r = &overview.runs;

    println!("📊 Export Status ({} store)", overview.store);
    println!();
    println!("Measurements:");
    println!("  Total: {}", m.total);
    println!("  Completed: {}", m.completed);
    println!("  Rejected: {}", m.rejected);
    println!("  Temporarily failed: {}", m.temp_failed);
    println!("  Failed: {}", m.failed);
    println!();
    println!("Runs:");
    println!("  Total: {}", r.total);
    println!("  Completed: {}", r.completed);
    println!("  Failed: {}", r.failed);
    match (r.last_run, r.last_status) {
        (Some(at), Some(status)) => {
            println!("  Last: {} ({status})", at.format("%Y-%m-%d %H:%M:%S"))
        }
        _ => println!("  Last: never"),
    }
    println!();
    print_endpoint("Source", &overview.source);
    print_endpoint("Destination", &overview.destination);
}

fn print_endpoint(label: &str, health: &EndpointHealth) {
    let mark = if health.healthy { "✅" } else { "❌" };
    println!("{mark} {label}: {}", health.endpoint);
    if let Some(error) = &health.error {
        println!("   Error: {error}");
    }
}
