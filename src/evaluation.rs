use crate::{
    config,
    error::{EvaluationError, ServiceError, MSG_EVALUATION_FAILED, MSG_STATUS_FAILED, MSG_TIMEOUT},
    normalize::NormalizedResult,
    service::{EvaluationService, EvaluationStatus, StatusState},
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub job_id: String,
    pub result: NormalizedResult,
    pub files: Vec<String>,
    /// The status payload exactly as the service returned it.
    pub status: EvaluationStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Idle,
    Queuing,
    Polling,
    Completed(Box<EvaluationOutcome>),
    Failed(String),
    TimedOut(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed(_) | JobState::Failed(_) | JobState::TimedOut(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Queuing => "queuing",
            JobState::Polling => "polling",
            JobState::Completed(_) => "completed",
            JobState::Failed(_) => "failed",
            JobState::TimedOut(_) => "timed_out",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub max_frames: u32,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_config(&config::Evaluation::default())
    }
}

impl PollSettings {
    pub fn from_config(cfg: &config::Evaluation) -> Self {
        Self {
            max_frames: cfg.max_frames,
            poll_interval: cfg.poll_interval(),
            timeout: cfg.timeout(),
        }
    }
}

/// The poll cadence and the timeout guard of the current attempt.
#[derive(Default)]
struct Timers {
    poll: Option<AbortHandle>,
    timeout: Option<AbortHandle>,
}

impl Timers {
    /// Idempotent: missing handles are skipped.
    fn cancel_all(&mut self) {
        if let Some(h) = self.poll.take() {
            h.abort();
        }
        if let Some(h) = self.timeout.take() {
            h.abort();
        }
    }

    fn any_active(&self) -> bool {
        self.poll.is_some() || self.timeout.is_some()
    }
}

struct Inner {
    state: watch::Sender<JobState>,
    timers: Mutex<Timers>,
    attempt: AtomicU64,
}

impl Inner {
    fn timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Leaves `Polling` for `attempt`. Stale attempts and already resolved
    /// states are ignored; returns whether the transition happened.
    fn resolve(&self, attempt: u64, next: JobState) -> bool {
        let mut timers = self.timers();
        if self.attempt.load(Ordering::SeqCst) != attempt
            || !matches!(*self.state.borrow(), JobState::Polling)
        {
            debug!("ignoring late {} for attempt {attempt}", next.name());
            return false;
        }
        timers.cancel_all();
        info!("evaluation {}", next.name());
        self.state.send_replace(next);
        true
    }

    /// Stops both timers and retires the current attempt. An in-flight
    /// attempt (`Queuing` or `Polling`) returns to `Idle`; terminal states stay.
    fn cancel(&self) {
        let mut timers = self.timers();
        timers.cancel_all();
        let in_flight = matches!(*self.state.borrow(), JobState::Queuing | JobState::Polling);
        if in_flight {
            let attempt = self.attempt.fetch_add(1, Ordering::SeqCst);
            info!("evaluation cancelled attempt={attempt}");
            self.state.send_replace(JobState::Idle);
        }
    }
}

/// Drives one evaluation at a time: enqueue, then poll until a terminal state
/// or the timeout budget. Dropping the controller cancels both timers.
pub struct EvaluationController<S: EvaluationService + 'static> {
    service: Arc<S>,
    settings: PollSettings,
    inner: Arc<Inner>,
}

impl<S: EvaluationService + 'static> EvaluationController<S> {
    pub fn new(service: Arc<S>, settings: PollSettings) -> Self {
        let (state, _) = watch::channel(JobState::Idle);
        Self {
            service,
            settings,
            inner: Arc::new(Inner {
                state,
                timers: Mutex::new(Timers::default()),
                attempt: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> JobState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.inner.state.subscribe()
    }

    pub fn timers_active(&self) -> bool {
        self.inner.timers().any_active()
    }

    /// Enqueues `job_id` and starts polling. Returns once polling has started;
    /// use [`wait`](Self::wait) for the outcome.
    pub async fn evaluate(&self, job_id: &str) -> Result<(), EvaluationError> {
        if job_id.is_empty() {
            return Err(EvaluationError::MissingJobId);
        }

        let attempt = {
            let mut timers = self.inner.timers();
            timers.cancel_all();
            let attempt = self.inner.attempt.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner.state.send_replace(JobState::Queuing);
            attempt
        };
        info!("evaluation queuing job={job_id} attempt={attempt}");

        if let Err(err) = self.service.enqueue(job_id, self.settings.max_frames).await {
            let message = enqueue_error_message(&err);
            warn!("enqueue rejected job={job_id}: {err}");
            let _timers = self.inner.timers();
            if self.inner.attempt.load(Ordering::SeqCst) == attempt {
                self.inner.state.send_replace(JobState::Failed(message.clone()));
            }
            return Err(EvaluationError::Enqueue(message));
        }

        let mut timers = self.inner.timers();
        if self.inner.attempt.load(Ordering::SeqCst) != attempt {
            debug!("attempt {attempt} superseded before polling started");
            return Ok(());
        }
        self.inner.state.send_replace(JobState::Polling);
        info!(
            "evaluation polling job={job_id} every={:?} budget={:?}",
            self.settings.poll_interval, self.settings.timeout
        );

        let poll = tokio::spawn(poll_loop(
            Arc::clone(&self.service),
            Arc::clone(&self.inner),
            attempt,
            job_id.to_string(),
            self.settings.poll_interval,
        ));
        let guard = tokio::spawn(timeout_guard(
            Arc::clone(&self.inner),
            attempt,
            self.settings.timeout,
        ));
        timers.poll = Some(poll.abort_handle());
        timers.timeout = Some(guard.abort_handle());
        Ok(())
    }

    /// Waits until the current attempt reaches a terminal state. Returns
    /// immediately when nothing is in flight.
    pub async fn wait(&self) -> JobState {
        let mut rx = self.subscribe();
        let state = rx
            .wait_for(|s| s.is_terminal() || matches!(s, JobState::Idle))
            .await
            .map(|s| s.clone());
        match state {
            Ok(s) => s,
            Err(_) => self.state(),
        }
    }

    /// Stops the poll cadence and the timeout guard and moves an in-flight
    /// evaluation back to `Idle`, releasing any [`wait`](Self::wait) caller.
    /// Safe to call repeatedly.
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

impl<S: EvaluationService + 'static> Drop for EvaluationController<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn poll_loop<S: EvaluationService>(
    service: Arc<S>,
    inner: Arc<Inner>,
    attempt: u64,
    job_id: String,
    period: Duration,
) {
    // Sequential: the next tick is awaited only after the previous request resolved.
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let next = match service.status(&job_id).await {
            Ok(status) => match status.status {
                StatusState::Completed => {
                    let result = NormalizedResult::from_value(status.result.as_ref());
                    JobState::Completed(Box::new(EvaluationOutcome {
                        job_id: job_id.clone(),
                        result,
                        files: status.files.clone(),
                        status,
                    }))
                }
                StatusState::Failed => JobState::Failed(
                    status
                        .error
                        .filter(|e| !e.is_empty())
                        .unwrap_or_else(|| MSG_EVALUATION_FAILED.to_string()),
                ),
                pending => {
                    debug!("job={job_id} still {pending:?}");
                    continue;
                }
            },
            Err(err) => {
                warn!("status request failed job={job_id}: {err}");
                JobState::Failed(status_error_message(&err))
            }
        };
        inner.resolve(attempt, next);
        return;
    }
}

async fn timeout_guard(inner: Arc<Inner>, attempt: u64, budget: Duration) {
    time::sleep(budget).await;
    if inner.resolve(attempt, JobState::TimedOut(MSG_TIMEOUT.to_string())) {
        warn!("evaluation gave up after {budget:?}");
    }
}

fn enqueue_error_message(err: &ServiceError) -> String {
    match err {
        ServiceError::Status {
            message: Some(m), ..
        } => m.clone(),
        ServiceError::Status { status, .. } => {
            format!("Erro {status}: Falha ao adicionar avaliação na fila")
        }
        other => other.to_string(),
    }
}

fn status_error_message(err: &ServiceError) -> String {
    match err {
        ServiceError::Status { .. } => MSG_STATUS_FAILED.to_string(),
        other => other.to_string(),
    }
}
