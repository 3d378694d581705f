pub mod http;
pub mod types;

use crate::error::ServiceError;
use async_trait::async_trait;

pub use types::{EvaluationStatus, Job, StatusState, VideoUpload};

#[async_trait]
pub trait EvaluationService: Send + Sync {
    async fn upload(&self, video: VideoUpload) -> Result<Job, ServiceError>;
    async fn enqueue(&self, job_id: &str, max_frames: u32) -> Result<(), ServiceError>;
    async fn status(&self, job_id: &str) -> Result<EvaluationStatus, ServiceError>;
}
