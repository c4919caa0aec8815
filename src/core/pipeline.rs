use crate::config::governance::GovernanceConfig;
use crate::core::anonymizer::Snapshot;
use crate::core::{kpi, router, scorer, validator};
use crate::domain::model::{AllocationBatch, ExtractedBatch, RawAccountRow};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{RecoveryError, Result};
use chrono::{DateTime, Utc};

pub const REQUIRED_COLUMNS: [&str; 5] = [
    "account_id",
    "amount",
    "days_overdue",
    "customer_segment",
    "dispute_history",
];

/// Reads the governance thresholds named by `config` through the storage port.
/// A missing file is reported as a missing config source, not a missing input.
pub async fn load_governance<S: Storage, C: ConfigProvider>(
    storage: &S,
    config: &C,
) -> Result<GovernanceConfig> {
    let path = config.governance_path();
    tracing::debug!("Reading governance thresholds from: {}", path);
    let data = storage.read_file(path).await.map_err(|e| match e {
        RecoveryError::MissingInput { path } => RecoveryError::MissingConfigSource { path },
        other => other,
    })?;
    let content = String::from_utf8(data).map_err(|e| RecoveryError::ConfigParseError {
        message: format!("governance file is not UTF-8: {}", e),
    })?;
    GovernanceConfig::from_toml_str(&content)
}

/// Parses the CSV batch. Rows that cannot be typed are counted, not fatal.
pub fn parse_batch(data: &[u8]) -> Result<ExtractedBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();
    if !missing.is_empty() {
        return Err(RecoveryError::MalformedInput {
            message: format!("missing column(s): {}", missing.join(", ")),
        });
    }

    let mut batch = ExtractedBatch::default();
    for (index, row) in reader.deserialize::<RawAccountRow>().enumerate() {
        match row {
            Ok(row) => batch.rows.push(row),
            Err(e) => {
                batch.unparseable += 1;
                tracing::warn!("Skipping unreadable row {}: {}", index + 1, e);
            }
        }
    }
    Ok(batch)
}

pub struct RecoveryPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    governance: GovernanceConfig,
    clock: fn() -> DateTime<Utc>,
}

impl<S: Storage, C: ConfigProvider> RecoveryPipeline<S, C> {
    pub fn new(storage: S, config: C, governance: GovernanceConfig) -> Self {
        Self {
            storage,
            config,
            governance,
            clock: Utc::now,
        }
    }

    /// Fixes the snapshot timestamp source.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for RecoveryPipeline<S, C> {
    async fn extract(&self) -> Result<ExtractedBatch> {
        tracing::debug!("Reading account batch from: {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;
        parse_batch(&data)
    }

    async fn transform(&self, data: ExtractedBatch) -> Result<AllocationBatch> {
        tracing::info!("🔍 Running data integrity checks...");
        let (records, validation) = validator::require_valid_records(&data)?;

        tracing::info!("🧠 Scoring {} accounts...", records.len());
        let scored = scorer::score_batch(records, &self.governance);

        tracing::info!("⚖️ Executing governance routing...");
        let allocations = router::allocate_batch(scored, &self.governance);

        let kpis = kpi::aggregate(&allocations)?;

        Ok(AllocationBatch {
            allocations,
            kpis,
            validation,
        })
    }

    async fn load(&self, batch: AllocationBatch) -> Result<String> {
        let snapshot = Snapshot::build(
            &batch.allocations,
            &batch.kpis,
            &batch.validation,
            (self.clock)(),
        );
        let data = snapshot.to_json()?;

        tracing::debug!("Writing snapshot ({} bytes)", data.len());
        self.storage
            .write_file(self.config.output_path(), &data)
            .await?;

        Ok(self.config.output_path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::governance::tests::{default_config, DEFAULT_THRESHOLDS};
    use crate::config::CliConfig;
    use crate::domain::model::Agency;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put_file(&self, path: &str, data: &[u8]) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files
                .get(path)
                .cloned()
                .ok_or_else(|| RecoveryError::MissingInput {
                    path: path.to_string(),
                })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    const BATCH: &str = "account_id,amount,days_overdue,customer_segment,dispute_history\n\
                         A1,6000,10,Enterprise,0\n\
                         A2,300,5,Retail,0\n\
                         A3,0,5,Retail,0\n\
                         A4,2500,40,SME,1\n\
                         A5,1200,500,SME,1\n";

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn pipeline(storage: MockStorage) -> RecoveryPipeline<MockStorage, CliConfig> {
        let config = CliConfig::new("batch.csv", "thresholds.toml", "out/snapshot.json");
        RecoveryPipeline::new(storage, config, default_config()).with_clock(fixed_clock)
    }

    #[test]
    fn test_parse_batch_counts_unreadable_rows() {
        let data = "account_id,amount,days_overdue,customer_segment,dispute_history\n\
                    A1,100,1,Retail,0\n\
                    A2,lots,1,Retail,0\n\
                    A3, 250 ,2,SME,true\n";

        let batch = parse_batch(data.as_bytes()).unwrap();
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.unparseable, 1);
        assert_eq!(batch.rows[1].amount, 250.0);
    }

    #[test]
    fn test_parse_batch_rejects_missing_columns() {
        let data = "account_id,amount,days_overdue\nA1,100,1\n";
        match parse_batch(data.as_bytes()) {
            Err(RecoveryError::MalformedInput { message }) => {
                assert!(message.contains("customer_segment"));
                assert!(message.contains("dispute_history"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_governance_through_storage() {
        let storage = MockStorage::new();
        storage
            .put_file("thresholds.toml", DEFAULT_THRESHOLDS.as_bytes())
            .await;

        let settings = CliConfig::new("batch.csv", "thresholds.toml", "out/snapshot.json");
        let config = load_governance(&storage, &settings).await.unwrap();
        assert_eq!(config, default_config());

        let absent = CliConfig::new("batch.csv", "absent.toml", "out/snapshot.json");
        let missing = load_governance(&storage, &absent).await;
        assert!(matches!(
            missing,
            Err(RecoveryError::MissingConfigSource { .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_missing_input_is_fatal() {
        let pipeline = pipeline(MockStorage::new());
        assert!(matches!(
            pipeline.extract().await,
            Err(RecoveryError::MissingInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_transform_routes_batch_in_order() {
        let storage = MockStorage::new();
        storage.put_file("batch.csv", BATCH.as_bytes()).await;
        let pipeline = pipeline(storage);

        let extracted = pipeline.extract().await.unwrap();
        let batch = pipeline.transform(extracted).await.unwrap();

        let routed: Vec<(&str, Agency)> = batch
            .allocations
            .iter()
            .map(|record| (record.account().account_id.as_str(), record.assigned_agency))
            .collect();
        assert_eq!(
            routed,
            vec![
                ("A1", Agency::FedExInternalTeam),
                ("A2", Agency::DcaBetaDigital),
                ("A4", Agency::DcaAlphaLegal),
                ("A5", Agency::ManualReviewRequired),
            ]
        );
        assert_eq!(batch.validation.discarded, 1);
        assert!(batch.allocations[3].requires_manual_review);
        assert!((batch.kpis.portfolio_value - 10_000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_transform_halts_on_empty_batch() {
        let pipeline = pipeline(MockStorage::new());
        let data = parse_batch(
            b"account_id,amount,days_overdue,customer_segment,dispute_history\nA1,-1,2,Retail,0\n",
        )
        .unwrap();

        assert!(matches!(
            pipeline.transform(data).await,
            Err(RecoveryError::EmptyBatch { discarded: 1 })
        ));
    }

    #[tokio::test]
    async fn test_load_writes_snapshot() {
        let storage = MockStorage::new();
        storage.put_file("batch.csv", BATCH.as_bytes()).await;
        let pipeline = pipeline(storage.clone());

        let extracted = pipeline.extract().await.unwrap();
        let batch = pipeline.transform(extracted).await.unwrap();
        let output_path = pipeline.load(batch).await.unwrap();

        assert_eq!(output_path, "out/snapshot.json");
        let data = storage.get_file("out/snapshot.json").await.unwrap();
        let snapshot = Snapshot::from_json(&data).unwrap();

        assert_eq!(snapshot.meta.timestamp, "2026-03-01T12:00:00+00:00");
        assert_eq!(snapshot.allocations.len(), 4);
        assert_eq!(snapshot.meta.governance_flags.data_quality_score, 0.8);
        assert!(!String::from_utf8(data).unwrap().contains("\"A1\""));
    }
}
