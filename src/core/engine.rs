use crate::domain::model::AllocationBatch;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct RecoveryEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> RecoveryEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Extract and transform only. Nothing is written.
    pub async fn preview(&self) -> Result<AllocationBatch> {
        let raw_data = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} rows ({} unreadable)",
            raw_data.rows.len(),
            raw_data.unparseable
        );
        self.monitor.log_stats("Extract");

        let batch = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Routed {} of {} records",
            batch.validation.retained,
            batch.validation.total
        );
        self.monitor.log_stats("Transform");

        log_summary(&batch);
        Ok(batch)
    }

    /// Full run. Any failure before the write leaves no snapshot behind.
    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting allocation run");

        let batch = self.preview().await?;

        let output_path = self.pipeline.load(batch).await?;
        self.monitor.log_stats("Load");
        tracing::info!("📁 Output saved to: {}", output_path);

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}

fn log_summary(batch: &AllocationBatch) {
    let kpis = crate::core::kpi::KpiDisplay::from(&batch.kpis);
    tracing::info!(
        "📊 Expected 90-day commission savings: {}",
        kpis.commission_savings_90d
    );
    tracing::info!("🤖 Auto-allocation rate: {}", kpis.auto_allocation_rate);
    tracing::info!(
        "Portfolio {} | expected recovery {} | high-risk cases {} | avg confidence {}",
        kpis.portfolio_value,
        kpis.expected_recovery_value,
        kpis.high_risk_cases,
        kpis.avg_confidence_score
    );
}
