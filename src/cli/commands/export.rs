//! `export` and `retry-failed` commands

use super::{coordinator_or_exit, load_or_exit, EXIT_FATAL, EXIT_OK, EXIT_PARTIAL};
use crate::core::export::{MeasurementReport, RunSummary};
use clap::Args;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Export everything since the configured start date, ignoring the watermark
    #[arg(long)]
    pub all: bool,
}

impl ExportArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(all = self.all, "Starting export command");

        let config = match load_or_exit(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let coordinator = match coordinator_or_exit(&config).await {
            Ok(coordinator) => coordinator,
            Err(code) => return Ok(code),
        };

        println!("🚀 Starting export...");
        let result = if self.all {
            coordinator.export_all().await
        } else {
            coordinator.run_export().await
        };

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        print_summary(&report.summary);
        print_failures(&report.outcomes);

        Ok(if report.summary.has_failures() {
            println!("⚠️  Export completed with failures");
            EXIT_PARTIAL
        } else {
            println!("✅ Export completed successfully!");
            EXIT_OK
        })
    }
}

/// Arguments for the retry-failed command
#[derive(Args, Debug, Default)]
pub struct RetryFailedArgs {}

impl RetryFailedArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_or_exit(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let coordinator = match coordinator_or_exit(&config).await {
            Ok(coordinator) => coordinator,
            Err(code) => return Ok(code),
        };

        let retry = match coordinator.retry_failed().await {
            Ok(retry) => retry,
            Err(e) => {
                tracing::error!(error = %e, "Retry failed");
                eprintln!("Retry failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if retry.is_empty() {
            println!("No measurements to export.");
        } else {
            println!("🔁 Retry Summary:");
            println!("  Retried: {}", retry.retried);
            println!("  Exported: {}", retry.exported);
            println!("  Still failing: {}", retry.failed);
        }
        println!("  Given up (retry window expired): {}", retry.aged);
        print_failures(&retry.outcomes);

        Ok(if retry.failed > 0 {
            EXIT_PARTIAL
        } else {
            EXIT_OK
        })
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Run: {}", summary.run_id);
    println!("  Measurements: {}", summary.total);
    println!("  Exported: {}", summary.exported);
    println!("  Rejected: {}", summary.rejected);
    println!("  Failed: {}", summary.failed);
    println!("  Already handled: {}", summary.handled);
    println!("  Pages: {}", summary.iterations);
    println!("  Duration: {:.2}s", summary.elapsed.as_secs_f64());
    println!();
}

fn print_failures(outcomes: &[MeasurementReport]) {
    let failures: Vec<_> = outcomes
        .iter()
        .filter_map(|report| report.result.as_ref().err().map(|f| (report, f)))
        .collect();
    if failures.is_empty() {
        return;
    }

    println!("⚠️  Failed measurements:");
    for (report, failure) in failures.iter().take(10) {
        println!("  - {} ({})", report.measurement, failure.category);
        println!("    Reason: {}", failure.message);
    }
    if failures.len() > 10 {
        println!("  ... and {} more failures", failures.len() - 10);
    }
    println!();
}
