use crate::domain::model::{Agency, AllocatedRecord, PortfolioKpis};
use crate::utils::error::{RecoveryError, Result};
use serde::{Deserialize, Serialize};

/// Commission rate an external agency would have charged on internal recoveries.
pub const AGENCY_COMMISSION_RATE: f64 = 0.12;
/// Single-period savings projected over a 90-day horizon.
pub const PROJECTION_PERIODS_90D: f64 = 3.0;
/// Scores under this count as high-risk in executive reporting.
pub const HIGH_RISK_P2P: f64 = 30.0;

pub fn aggregate(records: &[AllocatedRecord]) -> Result<PortfolioKpis> {
    if records.is_empty() {
        return Err(RecoveryError::EmptyAggregation);
    }
    let count = records.len() as f64;

    let portfolio_value: f64 = records.iter().map(AllocatedRecord::amount).sum();
    let expected_recovery_value: f64 = records
        .iter()
        .map(|record| record.amount() * (record.p2p_score() / 100.0))
        .sum();
    let internal_value: f64 = records
        .iter()
        .filter(|record| record.assigned_agency == Agency::FedExInternalTeam)
        .map(AllocatedRecord::amount)
        .sum();
    let auto_allocated = records
        .iter()
        .filter(|record| !record.requires_manual_review)
        .count();
    let high_risk_cases = records
        .iter()
        .filter(|record| record.p2p_score() < HIGH_RISK_P2P)
        .count();
    let confidence_total: f64 = records.iter().map(AllocatedRecord::confidence).sum();

    Ok(PortfolioKpis {
        portfolio_value,
        expected_recovery_value,
        commission_savings_90d: AGENCY_COMMISSION_RATE * internal_value * PROJECTION_PERIODS_90D,
        auto_allocation_rate: auto_allocated as f64 / count,
        high_risk_cases,
        avg_confidence_score: confidence_total / count,
    })
}

/// KPI block as the dashboard displays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDisplay {
    #[serde(rename = "Portfolio_Value")]
    pub portfolio_value: String,
    #[serde(rename = "Expected_Recovery_Value")]
    pub expected_recovery_value: String,
    #[serde(rename = "Commission_Savings_90d")]
    pub commission_savings_90d: String,
    #[serde(rename = "Auto_Allocation_Rate")]
    pub auto_allocation_rate: String,
    #[serde(rename = "High_Risk_Cases")]
    pub high_risk_cases: usize,
    #[serde(rename = "Avg_Confidence_Score")]
    pub avg_confidence_score: String,
}

impl From<&PortfolioKpis> for KpiDisplay {
    fn from(kpis: &PortfolioKpis) -> Self {
        Self {
            portfolio_value: format_currency(kpis.portfolio_value),
            expected_recovery_value: format_currency(kpis.expected_recovery_value),
            commission_savings_90d: format_currency(kpis.commission_savings_90d),
            auto_allocation_rate: format!("{:.1}%", kpis.auto_allocation_rate * 100.0),
            high_risk_cases: kpis.high_risk_cases,
            avg_confidence_score: format!("{:.2}", kpis.avg_confidence_score),
        }
    }
}

/// Whole dollars with thousands separators, e.g. `$85,000`.
pub fn format_currency(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if value < 0.0 && rounded != "0" {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
