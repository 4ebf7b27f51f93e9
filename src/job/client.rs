//! Job client trait, HTTP implementation, and the poll-loop driver.
//!
//! The driver implements the blocking-wait contract: the caller does not
//! proceed past `run_job` until the job reaches a terminal state or a fatal
//! error occurs. The wait itself suspends cooperatively on the tokio runtime
//! rather than parking a thread, and honours an optional cancellation signal
//! and deadline.

use super::protocol::{StatusResponse, SubmitResponse, ENDPOINT_RESULT, ENDPOINT_RUN, ENDPOINT_STATUS};
use super::types::{Job, JobHandle, JobStatus, JobSubmission};
use crate::error::{Result, XJoinError};

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Abstraction over the remote job service. One implementation speaks HTTP
/// to the real dispatcher; tests script status sequences directly.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Sends a single submission request. Transport failure is fatal for the
    /// calling query; there is no retry at this layer.
    async fn submit(&self, submission: &JobSubmission) -> Result<JobHandle>;

    /// Fetches the current status with a fresh request.
    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// Retrieves the raw result payload. Only meaningful after `Done`.
    async fn fetch_result(&self, handle: &JobHandle) -> Result<Value>;
}

/// reqwest-based client for the dispatcher wire contract in `protocol`.
///
/// The inner `reqwest::Client` is an Arc internally and safe to share across
/// concurrent queries.
pub struct HttpJobClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpJobClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl JobClient for HttpJobClient {
    async fn submit(&self, submission: &JobSubmission) -> Result<JobHandle> {
        let url = format!("{}{}", self.base_url, ENDPOINT_RUN);
        tracing::debug!("Submitting job to {}", url);

        let response = self.http_client.post(&url).json(submission).send().await?;

        if !response.status().is_success() {
            return Err(XJoinError::Transport(format!(
                "job submission failed: {}",
                response.status()
            )));
        }

        let submit: SubmitResponse = response.json().await?;
        tracing::info!("Submitted job with id {}", submit.job_id);
        Ok(JobHandle(submit.job_id))
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus> {
        let url = format!("{}{}/{}", self.base_url, ENDPOINT_STATUS, handle.0);

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(XJoinError::Transport(format!(
                "status poll failed: {}",
                response.status()
            )));
        }

        let status: StatusResponse = response.json().await?;
        status.normalize()
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<Value> {
        let url = format!("{}{}/{}", self.base_url, ENDPOINT_RESULT, handle.0);
        tracing::debug!("Fetching job result from {}", url);

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(XJoinError::Transport(format!(
                "result fetch failed: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

/// Poll-loop settings. The reference interval is a fixed 3 seconds; backoff
/// is fixed-interval, not exponential.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// Overall bound on the wait. `None` waits until a terminal state.
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            deadline: None,
        }
    }
}

/// A cancellation signal for the poll loop. Flipping the sender to `true`
/// resolves the wait as `Interrupted`.
pub type CancelSignal = watch::Receiver<bool>;

/// Drives a job from submission to a terminal state.
///
/// Submits once, then polls on the configured fixed interval. Returns the
/// completed job with its payload on `Done`. `Failed` becomes
/// `RemoteJobFailure` with the remote message; cancellation or deadline
/// expiry becomes `Interrupted`. The returned error is fatal for the calling
/// query. No poll is issued after a terminal status has been observed.
pub async fn run_job(
    client: &dyn JobClient,
    submission: &JobSubmission,
    config: &PollConfig,
    mut cancel: Option<CancelSignal>,
) -> Result<Job> {
    let handle = client.submit(submission).await?;
    let mut job = Job::submitted(handle);
    let started = Instant::now();

    loop {
        match client.poll(&job.handle).await {
            Ok(status) => {
                if status != job.status {
                    tracing::debug!("Job {} is now {:?}", job.handle.0, status);
                }
                job.status = status;
            }
            Err(e) => {
                // Poll failures degrade to transport errors; treated as job failure.
                job.last_error = Some(e.to_string());
                return Err(e);
            }
        }

        match &job.status {
            JobStatus::Done => {
                job.payload = Some(client.fetch_result(&job.handle).await?);
                tracing::info!("Job {} completed", job.handle.0);
                return Ok(job);
            }
            JobStatus::Failed { message } => {
                job.last_error = Some(message.clone());
                return Err(XJoinError::RemoteJobFailure(message.clone()));
            }
            JobStatus::Interrupted => {
                // Unreachable from a wire status; kept for state-machine completeness.
                return Err(XJoinError::Interrupted(job.handle.0.clone()));
            }
            JobStatus::Submitted | JobStatus::Running => {}
        }

        if let Some(deadline) = config.deadline {
            if started.elapsed() >= deadline {
                job.status = JobStatus::Interrupted;
                return Err(XJoinError::Interrupted(format!(
                    "job {} exceeded wait deadline of {:?}",
                    job.handle.0, deadline
                )));
            }
        }

        if wait_or_cancelled(config.interval, cancel.as_mut()).await {
            job.status = JobStatus::Interrupted;
            return Err(XJoinError::Interrupted(format!(
                "job {} cancelled while polling",
                job.handle.0
            )));
        }
    }
}

/// Sleeps one poll interval. Returns true if the cancellation signal fired
/// during the wait.
async fn wait_or_cancelled(interval: Duration, cancel: Option<&mut CancelSignal>) -> bool {
    match cancel {
        None => {
            tokio::time::sleep(interval).await;
            false
        }
        Some(rx) => {
            if *rx.borrow() {
                return true;
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => false,
                changed = rx.changed() => changed.is_ok() && *rx.borrow(),
            }
        }
    }
}
