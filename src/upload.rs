use crate::{
    error::{ServiceError, UploadError, MSG_UPLOAD_FAILED},
    service::{EvaluationService, Job, VideoUpload},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Submits a video and keeps the returned job.
pub struct UploadController<S: EvaluationService> {
    service: Arc<S>,
    job: Option<Job>,
}

impl<S: EvaluationService> UploadController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service, job: None }
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub async fn submit(
        &mut self,
        video: Option<&Path>,
        interval_sec: u32,
    ) -> Result<&Job, UploadError> {
        self.job = None;
        let Some(path) = video else {
            return Err(UploadError::MissingVideo);
        };
        if interval_sec == 0 {
            return Err(UploadError::InvalidInterval);
        }
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            warn!("cannot read video {}: {err}", path.display());
            UploadError::Failed(MSG_UPLOAD_FAILED.to_string())
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        info!("uploading {} bytes={} interval={interval_sec}s", file_name, bytes.len());
        let job = self
            .service
            .upload(VideoUpload {
                file_name,
                bytes,
                interval_sec,
            })
            .await
            .map_err(|err| {
                warn!("upload failed: {err}");
                UploadError::Failed(upload_error_message(&err))
            })?;

        info!("upload accepted job={} frames={}", job.id, job.frames.len());
        Ok(&*self.job.insert(job))
    }
}

fn upload_error_message(err: &ServiceError) -> String {
    match err {
        ServiceError::Transport(m) => m.clone(),
        _ => MSG_UPLOAD_FAILED.to_string(),
    }
}
