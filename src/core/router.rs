use crate::config::governance::GovernanceConfig;
use crate::core::anonymizer::tokenize;
use crate::domain::model::{Agency, AllocatedRecord, CustomerSegment, ScoredRecord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateKind {
    LowConfidence,
    HighValueHighP2p,
    DisputeHistory,
    LowValueOrRetail,
    CriticalP2p,
    Fallback,
}

/// One governance rule: when `applies` holds, the record goes to `outcome`.
pub struct GovernanceGate {
    pub kind: GateKind,
    pub outcome: Agency,
    applies: fn(&ScoredRecord, &GovernanceConfig) -> bool,
}

impl GovernanceGate {
    pub fn applies(&self, record: &ScoredRecord, config: &GovernanceConfig) -> bool {
        (self.applies)(record, config)
    }
}

/// Gates in evaluation order. Conditions overlap, so position decides: the
/// first gate that applies wins and nothing after it is evaluated.
pub static GATES: [GovernanceGate; 6] = [
    GovernanceGate {
        kind: GateKind::LowConfidence,
        outcome: Agency::ManualReviewRequired,
        applies: below_confidence_threshold,
    },
    GovernanceGate {
        kind: GateKind::HighValueHighP2p,
        outcome: Agency::FedExInternalTeam,
        applies: high_value_high_p2p,
    },
    GovernanceGate {
        kind: GateKind::DisputeHistory,
        outcome: Agency::DcaAlphaLegal,
        applies: has_dispute_history,
    },
    GovernanceGate {
        kind: GateKind::LowValueOrRetail,
        outcome: Agency::DcaBetaDigital,
        applies: low_value_or_retail,
    },
    GovernanceGate {
        kind: GateKind::CriticalP2p,
        outcome: Agency::DcaGammaRecovery,
        applies: critical_p2p,
    },
    GovernanceGate {
        kind: GateKind::Fallback,
        outcome: Agency::DcaGeneralPartners,
        applies: always,
    },
];

fn below_confidence_threshold(record: &ScoredRecord, config: &GovernanceConfig) -> bool {
    record.confidence < config.high_confidence_threshold
}

fn high_value_high_p2p(record: &ScoredRecord, config: &GovernanceConfig) -> bool {
    record.p2p_score > config.high_p2p_threshold && record.account.amount > config.high_value_cutoff
}

fn has_dispute_history(record: &ScoredRecord, _config: &GovernanceConfig) -> bool {
    record.account.dispute_history
}

fn low_value_or_retail(record: &ScoredRecord, config: &GovernanceConfig) -> bool {
    record.account.amount < config.low_value_cutoff
        || record.account.customer_segment == CustomerSegment::Retail
}

fn critical_p2p(record: &ScoredRecord, config: &GovernanceConfig) -> bool {
    record.p2p_score < config.p2p_critical_threshold
}

fn always(_record: &ScoredRecord, _config: &GovernanceConfig) -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub gate: GateKind,
    pub agency: Agency,
    /// Set from the confidence gate alone, never from the final agency.
    pub requires_manual_review: bool,
}

pub fn route(record: &ScoredRecord, config: &GovernanceConfig) -> RoutingDecision {
    let requires_manual_review = GATES[0].applies(record, config);

    let gate = GATES
        .iter()
        .find(|gate| gate.applies(record, config))
        .unwrap_or(&GATES[GATES.len() - 1]);

    RoutingDecision {
        gate: gate.kind,
        agency: gate.outcome,
        requires_manual_review,
    }
}

pub fn allocate(record: ScoredRecord, config: &GovernanceConfig) -> AllocatedRecord {
    let decision = route(&record, config);
    tracing::debug!(
        account = %tokenize(&record.account.account_id),
        p2p_score = record.p2p_score,
        confidence = record.confidence,
        gate = ?decision.gate,
        "Routed to {}",
        decision.agency
    );

    AllocatedRecord {
        scored: record,
        assigned_agency: decision.agency,
        requires_manual_review: decision.requires_manual_review,
    }
}

pub fn allocate_batch(records: Vec<ScoredRecord>, config: &GovernanceConfig) -> Vec<AllocatedRecord> {
    let allocations: Vec<AllocatedRecord> = records
        .into_iter()
        .map(|record| allocate(record, config))
        .collect();

    let manual = allocations
        .iter()
        .filter(|record| record.requires_manual_review)
        .count();
    if manual > 0 {
        tracing::info!(
            "⏸️ {} of {} accounts held for manual review",
            manual,
            allocations.len()
        );
    }

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::governance::tests::default_config;
    use crate::core::scorer::score_record;
    use crate::domain::model::AccountRecord;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn scored(
        amount: f64,
        segment: CustomerSegment,
        dispute: bool,
        p2p_score: f64,
        confidence: f64,
    ) -> ScoredRecord {
        ScoredRecord {
            account: AccountRecord {
                account_id: "A1".to_string(),
                amount,
                days_overdue: 10,
                customer_segment: segment,
                dispute_history: dispute,
            },
            p2p_score,
            confidence,
        }
    }

    #[test]
    fn test_gate_order_is_fixed() {
        let kinds: Vec<GateKind> = GATES.iter().map(|gate| gate.kind).collect();
        assert_eq!(
            kinds,
            vec![
                GateKind::LowConfidence,
                GateKind::HighValueHighP2p,
                GateKind::DisputeHistory,
                GateKind::LowValueOrRetail,
                GateKind::CriticalP2p,
                GateKind::Fallback,
            ]
        );
    }

    #[test]
    fn test_low_confidence_goes_to_manual_review() {
        let config = default_config();
        // Would match every later gate as well.
        let record = scored(100.0, CustomerSegment::Retail, true, 5.0, 0.65);

        let decision = route(&record, &config);
        assert_eq!(decision.agency, Agency::ManualReviewRequired);
        assert_eq!(decision.gate, GateKind::LowConfidence);
        assert!(decision.requires_manual_review);
    }

    #[test]
    fn test_internal_team_wins_over_legal() {
        let config = default_config();
        let record = scored(6000.0, CustomerSegment::Enterprise, true, 80.0, 0.85);

        let decision = route(&record, &config);
        assert_eq!(decision.agency, Agency::FedExInternalTeam);
        assert!(!decision.requires_manual_review);
    }

    #[test]
    fn test_dispute_goes_to_legal_regardless_of_amount() {
        let config = default_config();
        for amount in [50.0, 1000.0, 50_000.0] {
            let record = scored(amount, CustomerSegment::Retail, true, 60.0, 0.8);
            assert_eq!(route(&record, &config).agency, Agency::DcaAlphaLegal);
        }
    }

    #[test]
    fn test_low_value_or_retail_goes_digital() {
        let config = default_config();
        let small = scored(300.0, CustomerSegment::Enterprise, false, 5.0, 0.8);
        let retail = scored(3000.0, CustomerSegment::Retail, false, 5.0, 0.8);

        assert_eq!(route(&small, &config).agency, Agency::DcaBetaDigital);
        assert_eq!(route(&retail, &config).agency, Agency::DcaBetaDigital);
    }

    #[test]
    fn test_critical_p2p_goes_to_recovery() {
        let config = default_config();
        let record = scored(3000.0, CustomerSegment::Sme, false, 9.9, 0.8);
        assert_eq!(route(&record, &config).agency, Agency::DcaGammaRecovery);
    }

    #[test]
    fn test_fallback_goes_to_general_partners() {
        let config = default_config();
        let record = scored(3000.0, CustomerSegment::Sme, false, 50.0, 0.8);

        let decision = route(&record, &config);
        assert_eq!(decision.agency, Agency::DcaGeneralPartners);
        assert_eq!(decision.gate, GateKind::Fallback);
    }

    #[test]
    fn test_threshold_boundaries_are_strict() {
        let config = default_config();
        // Exactly at the confidence threshold is not low confidence.
        let at_threshold = scored(3000.0, CustomerSegment::Sme, false, 50.0, 0.7);
        assert!(!route(&at_threshold, &config).requires_manual_review);

        // Exactly at the p2p/value cutoffs does not qualify for internal.
        let at_cutoffs = scored(5000.0, CustomerSegment::Enterprise, false, 75.0, 0.8);
        assert_eq!(route(&at_cutoffs, &config).agency, Agency::DcaGeneralPartners);

        // Exactly at the low value cutoff is not low value.
        let at_low = scored(500.0, CustomerSegment::Enterprise, false, 50.0, 0.8);
        assert_eq!(route(&at_low, &config).agency, Agency::DcaGeneralPartners);
    }

    #[test]
    fn test_manual_review_iff_confidence_below_threshold() {
        let config = default_config();
        for confidence in [0.6, 0.65, 0.69, 0.7, 0.75, 0.95] {
            let record = scored(1000.0, CustomerSegment::Sme, false, 50.0, confidence);
            let allocated = allocate(record, &config);
            assert_eq!(
                allocated.requires_manual_review,
                confidence < config.high_confidence_threshold
            );
            assert_eq!(
                allocated.requires_manual_review,
                allocated.assigned_agency == Agency::ManualReviewRequired
            );
        }
    }

    #[test]
    fn test_retail_scenario_routes_digital() {
        let config = default_config();
        let record = score_record(
            AccountRecord {
                account_id: "R1".to_string(),
                amount: 300.0,
                days_overdue: 5,
                customer_segment: CustomerSegment::Retail,
                dispute_history: false,
            },
            &config,
        );
        assert!(record.confidence >= config.high_confidence_threshold);
        assert_eq!(allocate(record, &config).assigned_agency, Agency::DcaBetaDigital);
    }

    #[test]
    fn test_batch_preserves_order() {
        let config = default_config();
        let records = vec![
            scored(6000.0, CustomerSegment::Enterprise, false, 80.0, 0.85),
            scored(100.0, CustomerSegment::Retail, false, 50.0, 0.65),
            scored(3000.0, CustomerSegment::Sme, true, 50.0, 0.85),
        ];

        let agencies: Vec<Agency> = allocate_batch(records, &config)
            .iter()
            .map(|record| record.assigned_agency)
            .collect();
        assert_eq!(
            agencies,
            vec![
                Agency::FedExInternalTeam,
                Agency::ManualReviewRequired,
                Agency::DcaAlphaLegal,
            ]
        );
    }

    #[test]
    fn test_routing_log_uses_tokenized_account() {
        let config = default_config();
        let mut record = scored(3000.0, CustomerSegment::Sme, false, 50.0, 0.8);
        record.account.account_id = "CUST-4242".to_string();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            allocate(record, &config);
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Routed to"));
        assert!(output.contains(&tokenize("CUST-4242")));
        assert!(!output.contains("CUST-4242"));
    }
}
