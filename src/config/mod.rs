pub mod governance;

pub mod cli;

pub use governance::GovernanceConfig;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_path, Validate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Parser))]
#[cfg_attr(feature = "cli", command(name = "smart-recover"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Scores overdue receivables and routes them to collection channels")
)]
pub struct CliConfig {
    /// Account batch (CSV)
    #[cfg_attr(feature = "cli", arg(long, default_value = "dummy_data.csv"))]
    pub input: String,

    /// Governance thresholds (TOML)
    #[cfg_attr(feature = "cli", arg(long, default_value = "config/thresholds.toml"))]
    pub config: String,

    /// Allocation snapshot (JSON)
    #[cfg_attr(feature = "cli", arg(long, default_value = "processed_allocations.json"))]
    pub output: String,

    /// Directory relative paths are resolved against
    #[cfg_attr(feature = "cli", arg(long, default_value = "."))]
    pub workdir: String,

    #[cfg_attr(feature = "cli", arg(short, long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Emit logs as JSON lines"))]
    pub json_logs: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Log CPU and memory per phase"))]
    pub monitor: bool,

    #[cfg_attr(
        feature = "cli",
        arg(long, help = "Score and route without writing the snapshot")
    )]
    pub dry_run: bool,
}

impl CliConfig {
    pub fn new(input: &str, config: &str, output: &str) -> Self {
        Self {
            input: input.to_string(),
            config: config.to_string(),
            output: output.to_string(),
            workdir: ".".to_string(),
            verbose: false,
            json_logs: false,
            monitor: false,
            dry_run: false,
        }
    }
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn governance_path(&self) -> &str {
        &self.config
    }

    fn output_path(&self) -> &str {
        &self.output
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("workdir", &self.workdir)?;
        validate_path("input", &self.input)?;
        validate_path("config", &self.config)?;
        validate_path("output", &self.output)?;
        validate_file_extension("input", &self.input, &["csv"])?;
        validate_file_extension("config", &self.config, &["toml"])?;
        validate_file_extension("output", &self.output, &["json"])?;
        Ok(())
    }
}
