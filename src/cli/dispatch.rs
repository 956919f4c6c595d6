use super::args::{CliArgs, Commands};
use anyhow::Context;
use browser_runtime::config::RuntimeConfig;
use browser_runtime::{telemetry, Runtime};
use serde_json::Value;
use tracing::{error, info};

pub async fn run(cli: CliArgs) -> anyhow::Result<()> {
    telemetry::init(&cli.log_level);

    let config = RuntimeConfig::load(cli.config.as_ref()).await.context("failed to load runtime config")?;
    let runtime = Runtime::start(config).await.context("failed to start runtime")?;

    let result = match cli.command {
        Commands::Call { tool, json } => {
            let args: Value = serde_json::from_str(&json).context("--json must be valid JSON")?;
            match runtime.tools.call(&tool, args).await {
                Ok(outcome) => serde_json::to_value(&outcome)?,
                Err(err) => {
                    error!(tool = %tool, error = %err, "tool call failed");
                    serde_json::json!({"error": err.to_string()})
                }
            }
        }
        Commands::Stats => {
            let stats = runtime.trace.stats();
            serde_json::json!({
                "total": stats.total,
                "ok": stats.ok,
                "failed": stats.failed,
                "retriesTotal": stats.retries_total,
                "trackedSessions": stats.tracked_sessions,
                "p50DurationMs": stats.p50_duration_ms,
                "p95DurationMs": stats.p95_duration_ms,
            })
        }
        Commands::Sessions => {
            let sessions: Vec<_> = runtime
                .pool
                .list()
                .iter()
                .map(|s| serde_json::json!({"sessionId": s.id().to_string(), "healthy": s.is_healthy()}))
                .collect();
            serde_json::json!({"sessions": sessions})
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    info!("command completed");
    runtime.shutdown().await;
    Ok(())
}
