#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use snapauto::{
    error::ServiceError,
    service::{EvaluationService, EvaluationStatus, Job, StatusState, VideoUpload},
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted service: statuses are served in order, then `processing` forever.
pub struct FakeService {
    pub upload_result: Result<Job, ServiceError>,
    pub enqueue_result: Result<(), ServiceError>,
    pub statuses: Mutex<VecDeque<Result<EvaluationStatus, ServiceError>>>,
    pub status_delay: Duration,
    pub uploads: Mutex<Vec<(String, usize, u32)>>,
    pub enqueues: Mutex<Vec<(String, u32)>>,
    pub status_ids: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            upload_result: Ok(Job::default()),
            enqueue_result: Ok(()),
            statuses: Mutex::new(VecDeque::new()),
            status_delay: Duration::ZERO,
            uploads: Mutex::new(Vec::new()),
            enqueues: Mutex::new(Vec::new()),
            status_ids: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_statuses(self, statuses: Vec<Result<EvaluationStatus, ServiceError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_enqueue(mut self, result: Result<(), ServiceError>) -> Self {
        self.enqueue_result = result;
        self
    }

    pub fn with_upload(mut self, result: Result<Job, ServiceError>) -> Self {
        self.upload_result = result;
        self
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_ids.lock().unwrap().len()
    }

    pub fn enqueue_calls(&self) -> usize {
        self.enqueues.lock().unwrap().len()
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvaluationService for FakeService {
    async fn upload(&self, video: VideoUpload) -> Result<Job, ServiceError> {
        self.uploads
            .lock()
            .unwrap()
            .push((video.file_name, video.bytes.len(), video.interval_sec));
        self.upload_result.clone()
    }

    async fn enqueue(&self, job_id: &str, max_frames: u32) -> Result<(), ServiceError> {
        self.enqueues
            .lock()
            .unwrap()
            .push((job_id.to_string(), max_frames));
        self.enqueue_result.clone()
    }

    async fn status(&self, job_id: &str) -> Result<EvaluationStatus, ServiceError> {
        self.status_ids.lock().unwrap().push(job_id.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(status(StatusState::Processing, None)))
    }
}

pub fn status(state: StatusState, result: Option<Value>) -> EvaluationStatus {
    EvaluationStatus {
        status: state,
        result,
        error: None,
        files: Vec::new(),
    }
}

pub fn failed(error: Option<&str>) -> EvaluationStatus {
    EvaluationStatus {
        status: StatusState::Failed,
        result: None,
        error: error.map(str::to_string),
        files: Vec::new(),
    }
}
