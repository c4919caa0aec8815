pub mod anonymizer;
pub mod engine;
pub mod kpi;
pub mod pipeline;
pub mod router;
pub mod scorer;
pub mod validator;

pub use crate::domain::model::{AllocationBatch, ExtractedBatch};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
