use crate::domain::model::{AccountRecord, ExtractedBatch, RawAccountRow, ValidationReport};
use crate::utils::error::{RecoveryError, Result};

/// Business validity of one row: positive amount, non-negative days overdue,
/// known segment and a non-empty identifier.
pub fn validate_row(row: &RawAccountRow) -> Option<AccountRecord> {
    if row.account_id.trim().is_empty() {
        return None;
    }
    if !(row.amount.is_finite() && row.amount > 0.0) {
        return None;
    }
    let days_overdue = u32::try_from(row.days_overdue).ok()?;
    let customer_segment = row.customer_segment.parse().ok()?;

    Some(AccountRecord {
        account_id: row.account_id.clone(),
        amount: row.amount,
        days_overdue,
        customer_segment,
        dispute_history: row.dispute_history.0,
    })
}

/// Filters a batch to business-valid records, keeping input order. Rows that
/// failed to parse count as discarded.
pub fn validate_batch(batch: &ExtractedBatch) -> (Vec<AccountRecord>, ValidationReport) {
    let records: Vec<AccountRecord> = batch.rows.iter().filter_map(validate_row).collect();

    let total = batch.rows.len() + batch.unparseable;
    let report = ValidationReport {
        total,
        retained: records.len(),
        discarded: total - records.len(),
    };

    if report.discarded > 0 {
        tracing::warn!(
            "⚠️ Discarded {} of {} records during validation",
            report.discarded,
            report.total
        );
    }

    (records, report)
}

/// Like [`validate_batch`] but halts the run when nothing survives.
pub fn require_valid_records(
    batch: &ExtractedBatch,
) -> Result<(Vec<AccountRecord>, ValidationReport)> {
    let (records, report) = validate_batch(batch);
    if records.is_empty() {
        return Err(RecoveryError::EmptyBatch {
            discarded: report.discarded,
        });
    }
    Ok((records, report))
}
