use crate::utils::error::{RecoveryError, Result};
use crate::utils::validation::{
    validate_non_negative, validate_range, validate_required_field, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Region whose dispute penalty the scorer applies.
pub const DEFAULT_REGION: &str = "US";

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid"));

/// The thresholds document as written on disk. Every leaf is optional here so
/// that a missing field is reported by its dotted path instead of a serde error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceDocument {
    #[serde(default)]
    pub regional_adjustments: BTreeMap<String, RegionalAdjustment>,
    #[serde(default)]
    pub allocation_rules: AllocationRules,
    #[serde(default)]
    pub exception_handling: ExceptionHandling,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionalAdjustment {
    pub legal_dispute_penalty: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationRules {
    pub high_confidence_threshold: Option<f64>,
    pub high_p2p_threshold: Option<f64>,
    pub high_value_cutoff: Option<f64>,
    pub low_value_cutoff: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExceptionHandling {
    pub p2p_critical_threshold: Option<f64>,
}

/// Validated thresholds shared read-only by the scorer and the router.
#[derive(Debug, Clone, PartialEq)]
pub struct GovernanceConfig {
    legal_dispute_penalties: BTreeMap<String, f64>,
    pub high_confidence_threshold: f64,
    pub high_p2p_threshold: f64,
    pub high_value_cutoff: f64,
    pub low_value_cutoff: f64,
    pub p2p_critical_threshold: f64,
}

impl GovernanceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        let document: GovernanceDocument =
            toml::from_str(&processed_content).map_err(|e| RecoveryError::ConfigParseError {
                message: format!("TOML parsing error: {}", e),
            })?;

        Self::from_document(document)
    }

    pub fn from_document(document: GovernanceDocument) -> Result<Self> {
        let mut legal_dispute_penalties = BTreeMap::new();
        for (region, adjustment) in &document.regional_adjustments {
            let field = format!("regional_adjustments.{}.legal_dispute_penalty", region);
            let penalty = validate_required_field(&field, adjustment.legal_dispute_penalty)?;
            validate_non_negative(&field, penalty)?;
            legal_dispute_penalties.insert(region.clone(), penalty);
        }
        if !legal_dispute_penalties.contains_key(DEFAULT_REGION) {
            return Err(RecoveryError::MissingConfigError {
                field: format!("regional_adjustments.{}.legal_dispute_penalty", DEFAULT_REGION),
            });
        }

        let rules = &document.allocation_rules;
        let config = Self {
            legal_dispute_penalties,
            high_confidence_threshold: validate_required_field(
                "allocation_rules.high_confidence_threshold",
                rules.high_confidence_threshold,
            )?,
            high_p2p_threshold: validate_required_field(
                "allocation_rules.high_p2p_threshold",
                rules.high_p2p_threshold,
            )?,
            high_value_cutoff: validate_required_field(
                "allocation_rules.high_value_cutoff",
                rules.high_value_cutoff,
            )?,
            low_value_cutoff: validate_required_field(
                "allocation_rules.low_value_cutoff",
                rules.low_value_cutoff,
            )?,
            p2p_critical_threshold: validate_required_field(
                "exception_handling.p2p_critical_threshold",
                document.exception_handling.p2p_critical_threshold,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Penalty subtracted from the rule score for disputed accounts in `region`.
    /// Regions without an entry carry no penalty.
    pub fn legal_dispute_penalty(&self, region: &str) -> f64 {
        self.legal_dispute_penalties
            .get(region)
            .copied()
            .unwrap_or(0.0)
    }
}

impl Validate for GovernanceConfig {
    fn validate(&self) -> Result<()> {
        validate_range(
            "allocation_rules.high_confidence_threshold",
            self.high_confidence_threshold,
            0.0,
            1.0,
        )?;
        validate_range(
            "allocation_rules.high_p2p_threshold",
            self.high_p2p_threshold,
            0.0,
            100.0,
        )?;
        validate_range(
            "exception_handling.p2p_critical_threshold",
            self.p2p_critical_threshold,
            0.0,
            100.0,
        )?;
        validate_non_negative("allocation_rules.high_value_cutoff", self.high_value_cutoff)?;
        validate_non_negative("allocation_rules.low_value_cutoff", self.low_value_cutoff)?;

        if self.low_value_cutoff > self.high_value_cutoff {
            return Err(RecoveryError::InvalidConfigValueError {
                field: "allocation_rules.low_value_cutoff".to_string(),
                value: self.low_value_cutoff.to_string(),
                reason: format!(
                    "must not exceed allocation_rules.high_value_cutoff ({})",
                    self.high_value_cutoff
                ),
            });
        }

        Ok(())
    }
}

/// Replaces `${VAR}` with the environment value; unset variables stay verbatim.
fn substitute_env_vars(content: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}
