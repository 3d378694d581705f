use super::{types::*, EvaluationService};
use crate::{config::Config, error::ServiceError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response, Url,
};
use std::time::Duration;
use tracing::debug;

pub struct HttpEvaluationService {
    http: Client,
    base_url: String,
}

impl HttpEvaluationService {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.service.request_timeout_seconds.max(1)))
            .build()
            .with_context(|| "building HTTP client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ServiceError::Transport(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::Transport(format!("base url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl EvaluationService for HttpEvaluationService {
    async fn upload(&self, video: VideoUpload) -> Result<Job, ServiceError> {
        let url = self.endpoint(&["upload"])?;
        debug!("POST {url} bytes={} interval={}", video.bytes.len(), video.interval_sec);
        let form = Form::new()
            .part("video", Part::bytes(video.bytes).file_name(video.file_name))
            .text("intervalSec", video.interval_sec.to_string());
        let resp = self.http.post(url).multipart(form).send().await?;
        let resp = expect_success(resp).await?;
        Ok(resp.json::<Job>().await?)
    }

    async fn enqueue(&self, job_id: &str, max_frames: u32) -> Result<(), ServiceError> {
        let url = self.endpoint(&["evaluate"])?;
        debug!("POST {url} id={job_id} maxFrames={max_frames}");
        let resp = self
            .http
            .post(url)
            .json(&EnqueueRequest {
                id: job_id,
                max_frames,
            })
            .send()
            .await?;
        expect_success(resp).await?;
        Ok(())
    }

    async fn status(&self, job_id: &str) -> Result<EvaluationStatus, ServiceError> {
        let url = self.endpoint(&["evaluate", job_id])?;
        let resp = self.http.get(url).send().await?;
        let resp = expect_success(resp).await?;
        Ok(resp.json::<EvaluationStatus>().await?)
    }
}

/// Non-success responses become `ServiceError::Status`, keeping `{error}` when the body has one.
async fn expect_success(resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty());
    Err(ServiceError::Status {
        status: status.as_u16(),
        message,
    })
}
