//! Job-backed sequence-similarity provider.
//!
//! Submits the user-supplied sequence to the remote similarity service
//! through the job client, waits for completion, and turns the alignment
//! report into an `ExternalResultSet` keyed by target entry id.
//!
//! ## Join-key case contract
//! The remote service's identifiers are case-bearing; this join treats them
//! case-insensitively. The provider therefore stores canonical UPPER-CASE
//! keys and upper-cases incoming join keys on lookup, while the identifier
//! list it publishes is lower-cased and sorted ascending. Both sides of the
//! asymmetry are deliberate and relied upon by downstream consumers.

use super::alignment::{parse_alignment_report, Alignment};
use super::registry::ProviderConfig;
use super::types::{
    ExternalResultSet, ExternalResultsProvider, ExternalValue, KeyNormalization,
};
use crate::error::{Result, XJoinError};
use crate::job::client::{run_job, HttpJobClient, JobClient, PollConfig};
use crate::job::types::JobSubmission;
use crate::join::params::RequestParams;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

// initialisation parameters
pub const INIT_URL: &str = "url";
pub const INIT_EMAIL: &str = "email";
pub const INIT_PROGRAM: &str = "program";
pub const INIT_DATABASE: &str = "database";
pub const INIT_STYPE: &str = "stype";
pub const INIT_POLL_SECONDS: &str = "poll.seconds";

// request parameters
pub const PARAM_SEQUENCE: &str = "sequence";
pub const PARAM_EXP_LOW: &str = "explowlim";
pub const PARAM_EXP_UPPER: &str = "expupperlim";
pub const PARAM_SCORES: &str = "scores";
pub const PARAM_ALIGNMENTS: &str = "alignments";

pub struct SequenceSearchProvider {
    email: String,
    program: String,
    database: String,
    stype: String,
    client: Arc<dyn JobClient>,
    poll: PollConfig,
}

impl std::fmt::Debug for SequenceSearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceSearchProvider")
            .field("email", &self.email)
            .field("program", &self.program)
            .field("database", &self.database)
            .field("stype", &self.stype)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl SequenceSearchProvider {
    /// Builds the provider from its initialisation config. Every key is
    /// required; a missing or empty one fails construction outright.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let url = config.require(INIT_URL)?.to_string();
        let client = Arc::new(HttpJobClient::new(url));
        Self::with_client(config, client)
    }

    /// Same validation as `from_config`, with the job client injected.
    pub fn with_client(config: &ProviderConfig, client: Arc<dyn JobClient>) -> Result<Self> {
        let email = config.require(INIT_EMAIL)?.to_string();
        let program = config.require(INIT_PROGRAM)?.to_string();
        let database = config.require(INIT_DATABASE)?.to_string();
        let stype = config.require(INIT_STYPE)?.to_string();

        let mut poll = PollConfig::default();
        if let Some(seconds) = config.get(INIT_POLL_SECONDS) {
            let seconds: u64 = seconds.parse().map_err(|_| {
                XJoinError::Configuration(format!("{} must be an integer", INIT_POLL_SECONDS))
            })?;
            poll.interval = Duration::from_secs(seconds);
        }

        tracing::info!(
            "Initialised sequence provider: program={} database={} stype={}",
            program,
            database,
            stype
        );

        Ok(Self {
            email,
            program,
            database,
            stype,
            client,
            poll,
        })
    }

    fn build_submission(&self, params: &RequestParams) -> Result<JobSubmission> {
        let mut submission = JobSubmission::new();
        submission.set(INIT_EMAIL, self.email.as_str());
        submission.set(INIT_PROGRAM, self.program.as_str());
        submission.set(INIT_DATABASE, self.database.as_str());
        submission.set(INIT_STYPE, self.stype.as_str());
        submission.set(PARAM_SEQUENCE, params.require(PARAM_SEQUENCE)?);
        submission.set(PARAM_EXP_LOW, require_f64(params, PARAM_EXP_LOW)?);
        submission.set(PARAM_EXP_UPPER, require_f64(params, PARAM_EXP_UPPER)?);
        submission.set(PARAM_SCORES, require_u32(params, PARAM_SCORES)?);
        submission.set(PARAM_ALIGNMENTS, require_u32(params, PARAM_ALIGNMENTS)?);
        Ok(submission)
    }
}

#[async_trait]
impl ExternalResultsProvider for SequenceSearchProvider {
    /// Runs one similarity job to completion and maps its report onto the
    /// join. Terminal failure, interruption and unexpected statuses all fail
    /// the query; there is no partial result set.
    async fn compute_results(&self, params: &RequestParams) -> Result<ExternalResultSet> {
        let submission = self.build_submission(params)?;
        let job = run_job(self.client.as_ref(), &submission, &self.poll, None).await?;

        let payload = job
            .payload
            .ok_or_else(|| XJoinError::ResultParse("job completed without a payload".to_string()))?;
        let report = extract_report(&payload)?;
        let alignments = parse_alignment_report(&report)?;

        tracing::debug!(
            "Sequence job {} produced {} alignment(s)",
            job.handle.0,
            alignments.len()
        );

        Ok(build_result_set(alignments))
    }
}

/// The result payload wraps the textual report under an `output` field.
fn extract_report(payload: &Value) -> Result<String> {
    payload
        .get("output")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| XJoinError::ResultParse("result payload has no output field".to_string()))
}

fn build_result_set(alignments: Vec<Alignment>) -> ExternalResultSet {
    // Canonical keys are upper-case entry ids; chains stay in report order.
    let mut by_entry: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    let mut chains: BTreeSet<String> = BTreeSet::new();

    for alignment in alignments {
        chains.insert(alignment.entry_chain());
        by_entry
            .entry(alignment.entry.clone())
            .or_default()
            .push(serde_json::to_value(&alignment).unwrap_or(Value::Null));
    }

    // Published identifiers are lower-cased and sorted ascending; lookups
    // upper-case the incoming key. See the module docs.
    let mut published: Vec<String> = by_entry.keys().map(|id| id.to_lowercase()).collect();
    published.sort();

    let num_entries = by_entry.len();
    let mut builder = ExternalResultSet::builder()
        .normalization(KeyNormalization::Uppercase)
        .publish_ids(published)
        .aggregate("numEntries", num_entries)
        .aggregate("numChains", chains.len());

    for (entry, records) in by_entry {
        builder = builder.insert(entry, ExternalValue::Many(records));
    }

    builder.build()
}

fn require_f64(params: &RequestParams, name: &str) -> Result<f64> {
    let raw = params.require(name)?;
    raw.parse().map_err(|_| {
        XJoinError::MissingParameter(format!("{} must be numeric, got \"{}\"", name, raw))
    })
}

fn require_u32(params: &RequestParams, name: &str) -> Result<u32> {
    let raw = params.require(name)?;
    raw.parse().map_err(|_| {
        XJoinError::MissingParameter(format!("{} must be an integer, got \"{}\"", name, raw))
    })
}
