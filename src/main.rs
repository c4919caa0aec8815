use anyhow::Context;
use clap::Parser;
use smart_recover::core::pipeline::load_governance;
use smart_recover::domain::ports::ConfigProvider;
use smart_recover::utils::{logger, validation::Validate};
use smart_recover::{CliConfig, LocalStorage, RecoveryEngine, RecoveryError, RecoveryPipeline};

fn report_failure(stage: &str, e: &RecoveryError) -> ! {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("🚀 SmartRecover allocation engine");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        report_failure("Configuration validation", &e);
    }

    let storage = LocalStorage::new(&config.workdir);

    tracing::info!("📁 Loading governance thresholds from: {}", config.governance_path());
    let governance = match load_governance(&storage, &config).await {
        Ok(governance) => governance,
        Err(e) => report_failure("Loading governance thresholds", &e),
    };

    let dry_run = config.dry_run;
    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = RecoveryPipeline::new(storage, config, governance);
    let engine = RecoveryEngine::new_with_monitoring(pipeline, monitor_enabled);

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - no snapshot will be written");
        match engine.preview().await {
            Ok(batch) => {
                let summary = serde_json::to_string_pretty(&batch.kpis)
                    .context("serializing KPI summary")?;
                println!("{}", summary);
            }
            Err(e) => report_failure("Dry run", &e),
        }
        return Ok(());
    }

    match engine.run().await {
        Ok(output_path) => {
            println!("✅ Processing complete");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => report_failure("Allocation run", &e),
    }

    Ok(())
}
