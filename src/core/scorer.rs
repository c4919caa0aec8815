//! Hybrid collectability scoring.
//!
//! Two independent estimates are blended: a compliance-anchored rule score and
//! a fixed closed-form stand-in for a learned model. Their disagreement drives
//! the confidence reported alongside the blended score.

use crate::config::governance::{GovernanceConfig, DEFAULT_REGION};
use crate::domain::model::{AccountRecord, CustomerSegment, ScoredRecord};

const RULE_BASE: f64 = 100.0;
const RULE_DAILY_DECAY: f64 = 0.3;
const RULE_SME_BONUS: f64 = 5.0;

const LEARNED_BASE: f64 = 85.0;
const LEARNED_DAILY_DECAY: f64 = 0.25;

const LEARNED_WEIGHT: f64 = 0.6;
const RULE_WEIGHT: f64 = 0.4;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Reported confidence never claims near-certainty nor total doubt.
pub const CONFIDENCE_MIN: f64 = 0.6;
pub const CONFIDENCE_MAX: f64 = 0.95;

/// The two component estimates behind a hybrid score, kept for audit logs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub rule_score: f64,
    pub learned_score: f64,
}

impl ScoreBreakdown {
    pub fn compute(record: &AccountRecord, config: &GovernanceConfig) -> Self {
        Self {
            rule_score: rule_score(record, config),
            learned_score: learned_score(record),
        }
    }

    pub fn p2p_score(&self) -> f64 {
        (LEARNED_WEIGHT * self.learned_score + RULE_WEIGHT * self.rule_score)
            .clamp(SCORE_MIN, SCORE_MAX)
    }

    pub fn confidence(&self) -> f64 {
        (1.0 - (self.learned_score - self.rule_score).abs() / 100.0)
            .clamp(CONFIDENCE_MIN, CONFIDENCE_MAX)
    }
}

fn rule_score(record: &AccountRecord, config: &GovernanceConfig) -> f64 {
    let mut score = RULE_BASE - f64::from(record.days_overdue) * RULE_DAILY_DECAY;
    if record.dispute_history {
        score -= config.legal_dispute_penalty(DEFAULT_REGION);
    }
    if record.customer_segment == CustomerSegment::Sme {
        score += RULE_SME_BONUS;
    }
    score
}

fn learned_score(record: &AccountRecord) -> f64 {
    let segment_adjustment = match record.customer_segment {
        CustomerSegment::Enterprise => 0.0,
        CustomerSegment::Sme => 3.0,
        CustomerSegment::Retail => -2.0,
    };
    LEARNED_BASE - f64::from(record.days_overdue) * LEARNED_DAILY_DECAY + segment_adjustment
}

/// Returns `(p2p_score, confidence)` for one account.
pub fn score(record: &AccountRecord, config: &GovernanceConfig) -> (f64, f64) {
    let breakdown = ScoreBreakdown::compute(record, config);
    (breakdown.p2p_score(), breakdown.confidence())
}

pub fn score_record(record: AccountRecord, config: &GovernanceConfig) -> ScoredRecord {
    let (p2p_score, confidence) = score(&record, config);
    ScoredRecord {
        account: record,
        p2p_score,
        confidence,
    }
}

pub fn score_batch(records: Vec<AccountRecord>, config: &GovernanceConfig) -> Vec<ScoredRecord> {
    records
        .into_iter()
        .map(|record| score_record(record, config))
        .collect()
}
