use crate::core::kpi::KpiDisplay;
use crate::domain::model::{Agency, AllocatedRecord, PortfolioKpis, ValidationReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const SNAPSHOT_VERSION: &str = "SmartRecover v2.0";
pub const TOKEN_PREFIX: &str = "FED-";
/// Hex characters of the digest kept in a token (32 bits).
pub const TOKEN_HEX_LEN: usize = 8;

const FAIRNESS_VARIANCE: f64 = 0.08;
const RETRAINING_ELIGIBLE: bool = true;

/// One-way display identifier for an account. Deterministic across runs; the
/// 32-bit truncation can collide on large portfolios.
pub fn tokenize(account_id: &str) -> String {
    let digest = Sha256::digest(account_id.as_bytes());
    let encoded = hex::encode(digest);
    format!("{}{}", TOKEN_PREFIX, &encoded[..TOKEN_HEX_LEN])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceFlags {
    pub data_quality_score: f64,
    pub fairness_variance: f64,
    pub retraining_eligible: bool,
}

impl GovernanceFlags {
    pub fn from_validation(report: &ValidationReport) -> Self {
        Self {
            data_quality_score: (report.quality_ratio() * 100.0).round() / 100.0,
            fairness_variance: FAIRNESS_VARIANCE,
            retraining_eligible: RETRAINING_ELIGIBLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub timestamp: String,
    pub version: String,
    pub kpis: KpiDisplay,
    pub governance_flags: GovernanceFlags,
}

/// Exported view of one allocation. Carries no raw account identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub tokenized_id: String,
    pub amount: f64,
    pub p2p_score: f64,
    pub p2p_confidence: f64,
    pub assigned_agency: Agency,
    pub requires_manual_review: bool,
}

impl From<&AllocatedRecord> for AllocationEntry {
    fn from(record: &AllocatedRecord) -> Self {
        Self {
            tokenized_id: tokenize(&record.account().account_id),
            amount: record.amount(),
            p2p_score: record.p2p_score(),
            p2p_confidence: record.confidence(),
            assigned_agency: record.assigned_agency,
            requires_manual_review: record.requires_manual_review,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub allocations: Vec<AllocationEntry>,
}

impl Snapshot {
    pub fn build(
        records: &[AllocatedRecord],
        kpis: &PortfolioKpis,
        validation: &ValidationReport,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            meta: SnapshotMeta {
                timestamp: generated_at.to_rfc3339(),
                version: SNAPSHOT_VERSION.to_string(),
                kpis: KpiDisplay::from(kpis),
                governance_flags: GovernanceFlags::from_validation(validation),
            },
            allocations: records.iter().map(AllocationEntry::from).collect(),
        }
    }

    pub fn to_json(&self) -> crate::utils::error::Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(data: &[u8]) -> crate::utils::error::Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
