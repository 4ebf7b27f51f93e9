//! External Job Client Module
//!
//! Implements the submit/poll/fetch state machine used to drive long-running
//! computations on remote services (sequence-similarity search). A job is
//! submitted once, polled on a fixed interval until it reaches a terminal
//! state, and its result payload fetched only after a successful completion.
//!
//! ## State Machine
//! `Submitted -> Running -> { Done, Failed, Interrupted }`
//! 1. **Submission**: a single synchronous request; transport failure here is
//!    fatal for the query, with no silent retry.
//! 2. **Polling**: each poll is a fresh request. Poll transport failures
//!    degrade to transport errors and fail the job.
//! 3. **Terminal handling**: `Failed` surfaces the remote-supplied message;
//!    `Interrupted` records a local cancellation and is reported distinctly
//!    from remote failure. Once terminal, the job is never polled again.
//!
//! ## Submodules
//! - **`types`**: Job handle, status taxonomy, and the tracked job record.
//! - **`protocol`**: HTTP wire contract (endpoints, DTOs, status normalization).
//! - **`client`**: The `JobClient` trait, its reqwest implementation, and the
//!   blocking-wait driver with sleep-based backoff and cancellation.

pub mod client;
pub mod protocol;
pub mod types;
