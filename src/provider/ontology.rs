//! Direct-lookup ontology provider.
//!
//! No job/poll cycle: terms are resolved synchronously, either against a
//! remote ontology registry (OLS-style REST) or from a local resource file
//! loaded once at construction. Construction picks exactly one of the two
//! modes and fails fatally when neither is fully configured.

use super::registry::ProviderConfig;
use super::types::{ExternalResultSet, ExternalResultsProvider, ExternalValue};
use crate::error::{Result, XJoinError};
use crate::join::params::RequestParams;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

// initialisation parameters
pub const INIT_OLS_BASE_URL: &str = "ols.baseUrl";
pub const INIT_OLS_ONTOLOGY: &str = "ols.ontology";
pub const INIT_ONTOLOGY_URI: &str = "ontology.uri";
pub const INIT_CONFIG_FILE: &str = "config.file";

// request parameters
pub const PARAM_TERMS: &str = "terms";

#[derive(Debug)]
enum LookupMode {
    /// Named ontology in a remote registry.
    Remote {
        base_url: String,
        ontology: String,
        http_client: reqwest::Client,
    },
    /// Term records loaded from a local resource file, optionally overlaid
    /// with per-term overrides from a config file.
    Local { terms: HashMap<String, Value> },
}

#[derive(Debug)]
pub struct OntologyLookupProvider {
    mode: LookupMode,
}

impl OntologyLookupProvider {
    /// Chooses the construction mode from the init config:
    /// `ols.baseUrl` + `ols.ontology` selects the remote registry,
    /// `ontology.uri` (with optional `config.file`) the local resource.
    /// An incomplete remote pair, an unreadable local file, or no mode at
    /// all each fail construction.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let base_url = config.get(INIT_OLS_BASE_URL);
        let ontology = config.get(INIT_OLS_ONTOLOGY);
        let uri = config.get(INIT_ONTOLOGY_URI);

        let mode = match (base_url, ontology, uri) {
            (Some(base_url), Some(ontology), _) => {
                tracing::info!(
                    "Initialised ontology provider against {} (ontology {})",
                    base_url,
                    ontology
                );
                LookupMode::Remote {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    ontology: ontology.to_string(),
                    http_client: reqwest::Client::new(),
                }
            }
            (Some(_), None, _) => {
                return Err(XJoinError::Configuration(format!(
                    "{} requires {}",
                    INIT_OLS_BASE_URL, INIT_OLS_ONTOLOGY
                )))
            }
            (None, Some(_), _) => {
                return Err(XJoinError::Configuration(format!(
                    "{} requires {}",
                    INIT_OLS_ONTOLOGY, INIT_OLS_BASE_URL
                )))
            }
            (None, None, Some(uri)) => {
                let mut terms = load_term_file(uri)?;
                if let Some(overrides) = config.get(INIT_CONFIG_FILE) {
                    apply_overrides(&mut terms, load_term_file(overrides)?);
                }
                tracing::info!("Loaded {} ontology term(s) from {}", terms.len(), uri);
                LookupMode::Local { terms }
            }
            (None, None, None) => {
                return Err(XJoinError::Configuration(format!(
                    "either {} or {}+{} must be configured",
                    INIT_ONTOLOGY_URI, INIT_OLS_BASE_URL, INIT_OLS_ONTOLOGY
                )))
            }
        };

        Ok(Self { mode })
    }

    async fn lookup(&self, term: &str) -> Result<Option<Value>> {
        match &self.mode {
            LookupMode::Local { terms } => Ok(terms.get(term).cloned()),
            LookupMode::Remote {
                base_url,
                ontology,
                http_client,
            } => {
                let url = format!("{}/ontologies/{}/terms/{}", base_url, ontology, term);
                let response = http_client.get(&url).send().await?;

                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !response.status().is_success() {
                    return Err(XJoinError::Transport(format!(
                        "ontology lookup failed for {}: {}",
                        term,
                        response.status()
                    )));
                }

                Ok(Some(response.json().await?))
            }
        }
    }
}

#[async_trait]
impl ExternalResultsProvider for OntologyLookupProvider {
    /// Resolves every requested term. Unknown terms are skipped; only
    /// transport failures abort the query. Keys are matched verbatim and
    /// published in request order.
    async fn compute_results(&self, params: &RequestParams) -> Result<ExternalResultSet> {
        let raw_terms = params.require(PARAM_TERMS)?;

        let mut builder = ExternalResultSet::builder();
        let mut matched = 0usize;

        for term in raw_terms.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match self.lookup(term).await? {
                Some(record) => {
                    matched += 1;
                    builder = builder.insert(term, ExternalValue::Single(record));
                }
                None => {
                    tracing::debug!("No ontology record for term {}", term);
                }
            }
        }

        Ok(builder.aggregate("numTerms", matched).build())
    }
}

/// Loads a JSON object mapping term id to term record.
fn load_term_file(path: &str) -> Result<HashMap<String, Value>> {
    if !Path::new(path).exists() {
        return Err(XJoinError::Configuration(format!(
            "ontology resource not found: {}",
            path
        )));
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| XJoinError::Configuration(format!("cannot read {}: {}", path, e)))?;

    serde_json::from_str(&raw)
        .map_err(|e| XJoinError::Configuration(format!("malformed ontology resource {}: {}", path, e)))
}

/// Merges override records field-by-field onto the base term map.
fn apply_overrides(terms: &mut HashMap<String, Value>, overrides: HashMap<String, Value>) {
    for (term, record) in overrides {
        match (terms.get_mut(&term), record) {
            (Some(Value::Object(base)), Value::Object(extra)) => {
                for (key, value) in extra {
                    base.insert(key, value);
                }
            }
            (_, record) => {
                terms.insert(term, record);
            }
        }
    }
}
