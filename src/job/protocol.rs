//! Remote Job Service Wire Contract
//!
//! DTOs and endpoint paths for the job-dispatcher HTTP protocol. This is a
//! fixed external protocol: field names and status strings are honoured as
//! the remote service defines them, and only normalized into the local
//! `JobStatus` taxonomy at the edge.

use super::types::JobStatus;
use crate::error::XJoinError;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_RUN: &str = "/run";
pub const ENDPOINT_STATUS: &str = "/status";
pub const ENDPOINT_RESULT: &str = "/result";

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "jobId")]
    pub job_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    /// Populated by the service on failure statuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    /// Normalizes a wire status into the local taxonomy.
    ///
    /// `PENDING`/`QUEUED`/`RUNNING` map to `Running`, `FINISHED` to `Done`,
    /// `ERROR`/`FAILURE` to `Failed` with the remote message attached. Any
    /// other string is an `UnexpectedState` error echoing the raw status —
    /// `Interrupted` is never produced here, it only arises from a local
    /// cancellation.
    pub fn normalize(&self) -> Result<JobStatus, XJoinError> {
        match self.status.as_str() {
            "PENDING" | "QUEUED" | "RUNNING" => Ok(JobStatus::Running),
            "FINISHED" => Ok(JobStatus::Done),
            "ERROR" | "FAILURE" => Ok(JobStatus::Failed {
                message: self
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("remote status {}", self.status)),
            }),
            other => Err(XJoinError::UnexpectedState(other.to_string())),
        }
    }
}
