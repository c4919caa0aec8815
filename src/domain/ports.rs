use crate::domain::model::{AllocationBatch, ExtractedBatch};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where a run reads its batch and governance thresholds and writes its snapshot.
pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn governance_path(&self) -> &str;
    fn output_path(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedBatch>;
    async fn transform(&self, data: ExtractedBatch) -> Result<AllocationBatch>;
    async fn load(&self, batch: AllocationBatch) -> Result<String>;
}
