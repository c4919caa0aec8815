use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerSegment {
    Retail,
    #[serde(rename = "SME")]
    Sme,
    Enterprise,
}

impl CustomerSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerSegment::Retail => "Retail",
            CustomerSegment::Sme => "SME",
            CustomerSegment::Enterprise => "Enterprise",
        }
    }
}

impl FromStr for CustomerSegment {
    type Err = String;

    /// Matches the exact labels used in receivable exports; no case folding.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Retail" => Ok(CustomerSegment::Retail),
            "SME" => Ok(CustomerSegment::Sme),
            "Enterprise" => Ok(CustomerSegment::Enterprise),
            other => Err(format!("unknown customer segment '{}'", other)),
        }
    }
}

impl fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses integer cells that spreadsheet exports sometimes write as `10.0`.
/// Fractional or non-finite values are rejected.
fn parse_whole_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn deserialize_whole_number<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_whole_number(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid whole number '{}'", raw.trim()))
    })
}

/// `dispute_history` column; exports use 0/1 (possibly as `1.0`) or true/false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DisputeFlag(pub bool);

impl<'de> Deserialize<'de> for DisputeFlag {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "true" => return Ok(DisputeFlag(true)),
            "false" => return Ok(DisputeFlag(false)),
            _ => {}
        }
        match parse_whole_number(&normalized) {
            Some(1) => Ok(DisputeFlag(true)),
            Some(0) => Ok(DisputeFlag(false)),
            _ => Err(serde::de::Error::custom(format!(
                "invalid dispute_history '{}', expected 0/1 or true/false",
                normalized
            ))),
        }
    }
}

/// One input row as it appears in the CSV batch, before business validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAccountRow {
    pub account_id: String,
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub days_overdue: i64,
    pub customer_segment: String,
    pub dispute_history: DisputeFlag,
}

/// A business-valid overdue account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRecord {
    pub account_id: String,
    pub amount: f64,
    pub days_overdue: u32,
    pub customer_segment: CustomerSegment,
    pub dispute_history: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub account: AccountRecord,
    pub p2p_score: f64,
    pub confidence: f64,
}

/// Collection channel a debt is routed to. Serialized with the labels the
/// dashboard groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Agency {
    #[serde(rename = "FedEx Internal Team")]
    FedExInternalTeam,
    #[serde(rename = "DCA_Alpha_Legal")]
    DcaAlphaLegal,
    #[serde(rename = "DCA_Beta_Digital")]
    DcaBetaDigital,
    #[serde(rename = "DCA_Gamma_Recovery")]
    DcaGammaRecovery,
    #[serde(rename = "DCA_General_Partners")]
    DcaGeneralPartners,
    #[serde(rename = "MANUAL_REVIEW_REQUIRED")]
    ManualReviewRequired,
}

impl Agency {
    pub const ALL: [Agency; 6] = [
        Agency::FedExInternalTeam,
        Agency::DcaAlphaLegal,
        Agency::DcaBetaDigital,
        Agency::DcaGammaRecovery,
        Agency::DcaGeneralPartners,
        Agency::ManualReviewRequired,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Agency::FedExInternalTeam => "FedEx Internal Team",
            Agency::DcaAlphaLegal => "DCA_Alpha_Legal",
            Agency::DcaBetaDigital => "DCA_Beta_Digital",
            Agency::DcaGammaRecovery => "DCA_Gamma_Recovery",
            Agency::DcaGeneralPartners => "DCA_General_Partners",
            Agency::ManualReviewRequired => "MANUAL_REVIEW_REQUIRED",
        }
    }
}

impl fmt::Display for Agency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocatedRecord {
    pub scored: ScoredRecord,
    pub assigned_agency: Agency,
    pub requires_manual_review: bool,
}

impl AllocatedRecord {
    pub fn account(&self) -> &AccountRecord {
        &self.scored.account
    }

    pub fn amount(&self) -> f64 {
        self.scored.account.amount
    }

    pub fn p2p_score(&self) -> f64 {
        self.scored.p2p_score
    }

    pub fn confidence(&self) -> f64 {
        self.scored.confidence
    }
}

/// Rows read from the input batch, including the ones that could not be typed.
#[derive(Debug, Clone, Default)]
pub struct ExtractedBatch {
    pub rows: Vec<RawAccountRow>,
    pub unparseable: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub retained: usize,
    pub discarded: usize,
}

impl ValidationReport {
    /// Share of input rows that survived validation.
    pub fn quality_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.retained as f64 / self.total as f64
        }
    }
}

/// Portfolio-level executive metrics for one routed batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioKpis {
    pub portfolio_value: f64,
    pub expected_recovery_value: f64,
    pub commission_savings_90d: f64,
    pub auto_allocation_rate: f64,
    pub high_risk_cases: usize,
    pub avg_confidence_score: f64,
}

/// Output of the transform phase: every routed record plus its aggregates.
#[derive(Debug, Clone)]
pub struct AllocationBatch {
    pub allocations: Vec<AllocatedRecord>,
    pub kpis: PortfolioKpis,
    pub validation: ValidationReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_parsing_is_exact() {
        assert_eq!("SME".parse::<CustomerSegment>(), Ok(CustomerSegment::Sme));
        assert!("sme".parse::<CustomerSegment>().is_err());
        assert!("Unknown".parse::<CustomerSegment>().is_err());
    }

    #[test]
    fn test_agency_wire_labels() {
        for agency in Agency::ALL {
            let json = serde_json::to_string(&agency).unwrap();
            assert_eq!(json, format!("\"{}\"", agency.label()));
        }
    }

    #[test]
    fn test_dispute_flag_accepts_numeric_and_boolean() {
        let data = "account_id,amount,days_overdue,customer_segment,dispute_history\n\
                    A1,10,1,Retail,1\n\
                    A2,10,1,Retail,false\n\
                    A3,10,1,Retail,TRUE\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let flags: Vec<bool> = reader
            .deserialize::<RawAccountRow>()
            .map(|row| row.unwrap().dispute_history.0)
            .collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_dispute_flag_rejects_other_values() {
        let data = "account_id,amount,days_overdue,customer_segment,dispute_history\n\
                    A1,10,1,Retail,maybe\n\
                    A2,10,1,Retail,2\n\
                    A3,10,1,Retail,0.5\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        assert!(reader.deserialize::<RawAccountRow>().all(|row| row.is_err()));
    }

    #[test]
    fn test_whole_number_floats_are_accepted() {
        let data = "account_id,amount,days_overdue,customer_segment,dispute_history\n\
                    A1,10,10.0,Retail,1.0\n\
                    A2,10,-3.0,Retail,0.0\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<(i64, bool)> = reader
            .deserialize::<RawAccountRow>()
            .map(|row| {
                let row = row.unwrap();
                (row.days_overdue, row.dispute_history.0)
            })
            .collect();
        assert_eq!(rows, vec![(10, true), (-3, false)]);
    }

    #[test]
    fn test_fractional_days_are_rejected() {
        let data = "account_id,amount,days_overdue,customer_segment,dispute_history\n\
                    A1,10,10.5,Retail,0\n\
                    A2,10,ten,Retail,0\n\
                    A3,10,NaN,Retail,0\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        assert!(reader.deserialize::<RawAccountRow>().all(|row| row.is_err()));
    }
}
