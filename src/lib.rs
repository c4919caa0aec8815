pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{cli::LocalStorage, CliConfig, GovernanceConfig};
pub use crate::core::{engine::RecoveryEngine, pipeline::RecoveryPipeline};
pub use crate::utils::error::{RecoveryError, Result};
