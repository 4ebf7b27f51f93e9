use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of an in-flight remote computation, assigned by the remote
/// service at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct JobHandle(pub String);

/// Lifecycle state of an external job.
///
/// `Done`, `Failed` and `Interrupted` are terminal: no further polling occurs
/// once one of them has been observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum JobStatus {
    /// Accepted by the remote service, not yet observed running.
    Submitted,
    /// Still executing remotely.
    Running,
    /// Finished successfully; the result payload may now be fetched.
    Done,
    /// The remote service reported a terminal failure.
    /// Carries the remote-supplied message.
    Failed { message: String },
    /// The local wait was cancelled before the job reached a remote
    /// terminal state. Not a provider-reported status.
    Interrupted,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Failed { .. } | JobStatus::Interrupted
        )
    }
}

/// Parameters posted to the remote service at submission.
///
/// The concrete key set is provider-specific; keys and values are forwarded
/// verbatim so the remote wire contract is honoured bit-for-bit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSubmission {
    #[serde(flatten)]
    pub parameters: serde_json::Map<String, Value>,
}

impl JobSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.parameters.insert(key.to_string(), value.into());
    }
}

/// The tracked record of one remote computation.
///
/// Created at submission, transitioned only by the job driver, terminal once
/// `status.is_terminal()`.
#[derive(Debug, Clone)]
pub struct Job {
    pub handle: JobHandle,
    pub status: JobStatus,
    /// Raw result payload, opaque until a provider parses it.
    /// Populated only after a `Done` transition.
    pub payload: Option<Value>,
    pub last_error: Option<String>,
}

impl Job {
    pub fn submitted(handle: JobHandle) -> Self {
        Self {
            handle,
            status: JobStatus::Submitted,
            payload: None,
            last_error: None,
        }
    }
}
