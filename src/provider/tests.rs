//! Provider Tests
//!
//! Validates provider construction contracts, the job-backed sequence
//! pipeline against scripted job clients, the alignment-report parser, and
//! the external result-set model.
//!
//! ## Test Scopes
//! - **Result set**: key normalization, unknown-key lookups, aggregates.
//! - **Parser**: full reports, fragment accumulation, incomplete records.
//! - **Sequence provider**: init/request validation, end-to-end mapping,
//!   remote failure surfacing.
//! - **Ontology provider**: construction-mode matrix and local lookups.
//! - **Registry**: kind resolution and fail-fast construction.

#[cfg(test)]
mod tests {
    use crate::error::XJoinError;
    use crate::job::client::JobClient;
    use crate::job::types::{JobHandle, JobStatus, JobSubmission};
    use crate::join::params::RequestParams;
    use crate::provider::alignment::parse_alignment_report;
    use crate::provider::ontology::OntologyLookupProvider;
    use crate::provider::registry::{ProviderConfig, ProviderRegistry};
    use crate::provider::sequence::SequenceSearchProvider;
    use crate::provider::types::{
        ExternalResultSet, ExternalResultsProvider, ExternalValue, KeyNormalization,
    };

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Job client stub that completes immediately with a fixed outcome.
    struct StubJobClient {
        outcome: JobStatus,
        payload: Value,
    }

    impl StubJobClient {
        fn done(payload: Value) -> Arc<Self> {
            Arc::new(Self {
                outcome: JobStatus::Done,
                payload,
            })
        }

        fn failed(message: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: JobStatus::Failed {
                    message: message.to_string(),
                },
                payload: Value::Null,
            })
        }
    }

    #[async_trait]
    impl JobClient for StubJobClient {
        async fn submit(&self, _submission: &JobSubmission) -> Result<JobHandle, XJoinError> {
            Ok(JobHandle("stub-job".to_string()))
        }

        async fn poll(&self, _handle: &JobHandle) -> Result<JobStatus, XJoinError> {
            Ok(self.outcome.clone())
        }

        async fn fetch_result(&self, _handle: &JobHandle) -> Result<Value, XJoinError> {
            Ok(self.payload.clone())
        }
    }

    fn sequence_config() -> ProviderConfig {
        ProviderConfig::from([
            ("email", "search@example.org"),
            ("program", "fasta"),
            ("database", "pdb"),
            ("stype", "protein"),
        ])
    }

    fn sequence_params() -> RequestParams {
        RequestParams::from([
            ("sequence", "MKTAYIAKQRQISFVKSHFSRQLEERLGLI"),
            ("explowlim", "0"),
            ("expupperlim", "1.0"),
            ("scores", "5"),
            ("alignments", "5"),
        ])
    }

    /// Two-hit report: entry 1ABC chain A and entry 2XYZ chain B.
    const TWO_HIT_REPORT: &str = "\
FASTA searches a protein or DNA sequence data bank
>>>query, 30 aa vs pdb library

>>PDB:1ABC_A HEMOGLOBIN ALPHA
; fa_initn: 50
; fa_expect: 0.0002
; fa_bits: 24.5
; sw_ident: 0.950
; sw_overlap: 28
>query ..
; sq_len: 30
; al_start: 2
; al_stop: 29
MKTAYIAKQRQISFVKSHFSRQLEERLG
>PDB:1ABC_A ..
; sq_len: 141
; al_start: 5
; al_stop: 32
MKTAYIAKQRQISFVKSHFSRQLEERLG
>>PDB:2XYZ_B LYSOZYME C
; fa_expect: 0.013
; fa_bits: 19.2
; sw_ident: 0.821
>query ..
; al_start: 1
; al_stop: 28
MKTAYIAKQRQISFVKSHFSRQLEERLG
>PDB:2XYZ_B ..
; al_start: 11
; al_stop: 38
MKSAYIAKQRQISFVKSHFSRQLEERMG
";

    fn sequence_payload() -> Value {
        json!({ "output": TWO_HIT_REPORT })
    }

    // ============================================================
    // EXTERNAL RESULT SET
    // ============================================================

    #[test]
    fn test_result_set_unknown_key_returns_no_results() {
        let results = ExternalResultSet::builder()
            .insert("1ABC", ExternalValue::Single(json!({"x": 1})))
            .build();

        assert!(results.get("unknown").is_none());
    }

    #[test]
    fn test_result_set_uppercase_normalization() {
        let results = ExternalResultSet::builder()
            .normalization(KeyNormalization::Uppercase)
            .insert("1ABC", ExternalValue::Single(json!({"x": 1})))
            .build();

        // Lower-case incoming key still resolves the canonical entry
        assert!(results.get("1abc").is_some());
        assert!(results.get("1ABC").is_some());
    }

    #[test]
    fn test_result_set_verbatim_normalization_is_case_sensitive() {
        let results = ExternalResultSet::builder()
            .insert("GO:0005515", ExternalValue::Single(json!({"x": 1})))
            .build();

        assert!(results.get("GO:0005515").is_some());
        assert!(results.get("go:0005515").is_none());
    }

    #[test]
    fn test_result_set_published_ids_and_aggregates() {
        let results = ExternalResultSet::builder()
            .insert("B", ExternalValue::Single(json!(1)))
            .insert("A", ExternalValue::Single(json!(2)))
            .publish_ids(vec!["a".to_string(), "b".to_string()])
            .aggregate("numEntries", 2)
            .build();

        assert_eq!(results.join_ids(), &["a", "b"]);
        assert_eq!(results.aggregates().get("numEntries"), Some(&json!(2)));
    }

    #[test]
    fn test_external_value_records() {
        let single = ExternalValue::Single(json!({"a": 1}));
        assert_eq!(single.records().len(), 1);

        let many = ExternalValue::Many(vec![json!(1), json!(2), json!(3)]);
        assert_eq!(many.records().len(), 3);
    }

    // ============================================================
    // ALIGNMENT PARSER
    // ============================================================

    #[test]
    fn test_parse_two_hit_report() {
        let alignments = parse_alignment_report(TWO_HIT_REPORT).unwrap();

        assert_eq!(alignments.len(), 2);

        let first = &alignments[0];
        assert_eq!(first.entry, "1ABC");
        assert_eq!(first.chain, "A");
        assert_eq!(first.description.as_deref(), Some("HEMOGLOBIN ALPHA"));
        assert!((first.e_value - 0.0002).abs() < 1e-9);
        assert_eq!(first.bit_score, Some(24.5));
        assert!((first.percent_identity - 95.0).abs() < 1e-9);
        assert_eq!(first.query_start, 2);
        assert_eq!(first.query_end, 29);
        assert_eq!(first.target_start, 5);
        assert_eq!(first.target_end, 32);
        assert_eq!(first.query_sequence, "MKTAYIAKQRQISFVKSHFSRQLEERLG");
        assert_eq!(first.entry_chain(), "1ABC_A");

        let second = &alignments[1];
        assert_eq!(second.entry, "2XYZ");
        assert_eq!(second.chain, "B");
        assert_eq!(second.target_sequence, "MKSAYIAKQRQISFVKSHFSRQLEERMG");
    }

    #[test]
    fn test_parse_accumulates_split_sequence_lines() {
        let report = "\
>>PDB:3DEF_C
; fa_expect: 0.5
; sw_ident: 0.5
>query ..
; al_start: 1
; al_stop: 12
MKTAYI
AKQRQI
>PDB:3DEF_C ..
; al_start: 1
; al_stop: 12
MKTAYI
AKQRQI
";
        let alignments = parse_alignment_report(report).unwrap();

        assert_eq!(alignments.len(), 1);
        // Continuation lines concatenate into one fragment
        assert_eq!(alignments[0].query_sequence, "MKTAYIAKQRQI");
        assert_eq!(alignments[0].target_sequence, "MKTAYIAKQRQI");
    }

    #[test]
    fn test_parse_incomplete_record_is_an_error() {
        // Target block never closes its offsets
        let report = "\
>>PDB:3DEF_C
; fa_expect: 0.5
; sw_ident: 0.5
>query ..
; al_start: 1
; al_stop: 6
MKTAYI
>PDB:3DEF_C ..
MKTAYI
";
        let err = parse_alignment_report(report).unwrap_err();

        match err {
            XJoinError::ResultParse(message) => {
                assert!(message.contains("3DEF_C"), "message was: {}", message)
            }
            other => panic!("expected ResultParse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_report_yields_no_alignments() {
        let alignments = parse_alignment_report("no hits found\n").unwrap();
        assert!(alignments.is_empty());
    }

    #[test]
    fn test_parse_non_numeric_score_is_an_error() {
        let report = "\
>>PDB:3DEF_C
; fa_expect: abc
";
        assert!(matches!(
            parse_alignment_report(report).unwrap_err(),
            XJoinError::ResultParse(_)
        ));
    }

    // ============================================================
    // SEQUENCE PROVIDER - construction
    // ============================================================

    #[test]
    fn test_sequence_construction_requires_every_init_key() {
        for missing in ["email", "program", "database", "stype"] {
            let mut config = sequence_config();
            config.set(missing, "");

            let err = SequenceSearchProvider::with_client(
                &config,
                StubJobClient::done(Value::Null),
            )
            .err()
            .unwrap_or_else(|| panic!("construction should fail without {}", missing));

            match err {
                XJoinError::Configuration(message) => {
                    assert!(message.contains(missing), "message was: {}", message)
                }
                other => panic!("expected Configuration, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_sequence_from_config_requires_url() {
        assert!(matches!(
            SequenceSearchProvider::from_config(&sequence_config()).unwrap_err(),
            XJoinError::Configuration(_)
        ));
    }

    // ============================================================
    // SEQUENCE PROVIDER - compute_results
    // ============================================================

    #[tokio::test]
    async fn test_sequence_two_alignment_scenario() {
        let provider = SequenceSearchProvider::with_client(
            &sequence_config(),
            StubJobClient::done(sequence_payload()),
        )
        .unwrap();

        let results = provider.compute_results(&sequence_params()).await.unwrap();

        // Published identifiers are lower-cased and sorted ascending
        assert_eq!(results.join_ids(), &["1abc", "2xyz"]);

        // Lookups are upper-cased, so the lower-case document value matches
        let first = results.get("1abc").expect("1abc should have results");
        match first {
            ExternalValue::Many(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0]["chain"], json!("A"));
            }
            other => panic!("expected Many, got {:?}", other),
        }
        assert!(results.get("2XYZ").is_some());
        assert!(results.get("9zzz").is_none());

        assert_eq!(results.aggregates().get("numEntries"), Some(&json!(2)));
        assert_eq!(results.aggregates().get("numChains"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_sequence_remote_failure_surfaces_message() {
        let provider = SequenceSearchProvider::with_client(
            &sequence_config(),
            StubJobClient::failed("no hits"),
        )
        .unwrap();

        let err = provider.compute_results(&sequence_params()).await.unwrap_err();

        match err {
            XJoinError::RemoteJobFailure(message) => assert_eq!(message, "no hits"),
            other => panic!("expected RemoteJobFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sequence_missing_request_parameter() {
        let provider = SequenceSearchProvider::with_client(
            &sequence_config(),
            StubJobClient::done(sequence_payload()),
        )
        .unwrap();

        for missing in ["sequence", "explowlim", "expupperlim", "scores", "alignments"] {
            let mut params = sequence_params();
            params.set(missing, "");

            let err = provider.compute_results(&params).await.unwrap_err();
            match err {
                XJoinError::MissingParameter(message) => {
                    assert!(message.contains(missing), "message was: {}", message)
                }
                other => panic!("expected MissingParameter, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_sequence_non_numeric_threshold_fails_query() {
        let provider = SequenceSearchProvider::with_client(
            &sequence_config(),
            StubJobClient::done(sequence_payload()),
        )
        .unwrap();

        let mut params = sequence_params();
        params.set("expupperlim", "lots");

        assert!(matches!(
            provider.compute_results(&params).await.unwrap_err(),
            XJoinError::MissingParameter(_)
        ));
    }

    #[tokio::test]
    async fn test_sequence_payload_without_output_field() {
        let provider = SequenceSearchProvider::with_client(
            &sequence_config(),
            StubJobClient::done(json!({"unexpected": true})),
        )
        .unwrap();

        assert!(matches!(
            provider.compute_results(&sequence_params()).await.unwrap_err(),
            XJoinError::ResultParse(_)
        ));
    }

    // ============================================================
    // ONTOLOGY PROVIDER - construction modes
    // ============================================================

    fn write_temp_terms(name: &str, contents: &Value) -> String {
        let path = std::env::temp_dir().join(format!("{}-{}.json", name, uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_json::to_string(contents).unwrap()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_ontology_construct_no_parameters_fails() {
        let err = OntologyLookupProvider::from_config(&ProviderConfig::new()).unwrap_err();
        assert!(matches!(err, XJoinError::Configuration(_)));
    }

    #[test]
    fn test_ontology_construct_base_url_without_name_fails() {
        let config = ProviderConfig::from([("ols.baseUrl", "http://ontology.example.org/api")]);
        assert!(matches!(
            OntologyLookupProvider::from_config(&config).unwrap_err(),
            XJoinError::Configuration(_)
        ));
    }

    #[test]
    fn test_ontology_construct_name_without_base_url_fails() {
        let config = ProviderConfig::from([("ols.ontology", "efo")]);
        assert!(matches!(
            OntologyLookupProvider::from_config(&config).unwrap_err(),
            XJoinError::Configuration(_)
        ));
    }

    #[test]
    fn test_ontology_construct_remote_pair_succeeds() {
        let config = ProviderConfig::from([
            ("ols.baseUrl", "http://ontology.example.org/api"),
            ("ols.ontology", "efo"),
        ]);
        assert!(OntologyLookupProvider::from_config(&config).is_ok());
    }

    #[test]
    fn test_ontology_construct_local_uri_alone_succeeds() {
        let path = write_temp_terms(
            "terms",
            &json!({"GO:0005515": {"label": "protein binding"}}),
        );
        let config_pairs = [("ontology.uri", path.as_str())];

        assert!(OntologyLookupProvider::from_config(&ProviderConfig::from(config_pairs)).is_ok());
    }

    #[test]
    fn test_ontology_construct_missing_config_file_fails() {
        let path = write_temp_terms("terms", &json!({}));
        let config = ProviderConfig::from([
            ("ontology.uri", path.as_str()),
            ("config.file", "/nonexistent/ontology.properties.json"),
        ]);

        assert!(matches!(
            OntologyLookupProvider::from_config(&config).unwrap_err(),
            XJoinError::Configuration(_)
        ));
    }

    // ============================================================
    // ONTOLOGY PROVIDER - lookups
    // ============================================================

    #[tokio::test]
    async fn test_ontology_local_lookup_skips_unknown_terms() {
        let path = write_temp_terms(
            "terms",
            &json!({
                "GO:0005515": {"label": "protein binding"},
                "GO:0003824": {"label": "catalytic activity"}
            }),
        );
        let provider =
            OntologyLookupProvider::from_config(&ProviderConfig::from([(
                "ontology.uri",
                path.as_str(),
            )]))
            .unwrap();

        let params = RequestParams::from([("terms", "GO:0005515,GO:9999999,GO:0003824")]);
        let results = provider.compute_results(&params).await.unwrap();

        assert_eq!(results.join_ids(), &["GO:0005515", "GO:0003824"]);
        assert_eq!(results.aggregates().get("numTerms"), Some(&json!(2)));
        assert_eq!(
            results.get("GO:0005515"),
            Some(&ExternalValue::Single(json!({"label": "protein binding"})))
        );
        assert!(results.get("GO:9999999").is_none());
    }

    #[tokio::test]
    async fn test_ontology_config_file_overrides_term_fields() {
        let base = write_temp_terms("terms", &json!({"GO:0005515": {"label": "protein binding"}}));
        let overrides = write_temp_terms(
            "overrides",
            &json!({"GO:0005515": {"label": "protein binding (curated)", "curated": true}}),
        );
        let provider = OntologyLookupProvider::from_config(&ProviderConfig::from([
            ("ontology.uri", base.as_str()),
            ("config.file", overrides.as_str()),
        ]))
        .unwrap();

        let params = RequestParams::from([("terms", "GO:0005515")]);
        let results = provider.compute_results(&params).await.unwrap();

        assert_eq!(
            results.get("GO:0005515"),
            Some(&ExternalValue::Single(
                json!({"label": "protein binding (curated)", "curated": true})
            ))
        );
    }

    #[tokio::test]
    async fn test_ontology_requires_terms_parameter() {
        let path = write_temp_terms("terms", &json!({}));
        let provider =
            OntologyLookupProvider::from_config(&ProviderConfig::from([(
                "ontology.uri",
                path.as_str(),
            )]))
            .unwrap();

        assert!(matches!(
            provider.compute_results(&RequestParams::new()).await.unwrap_err(),
            XJoinError::MissingParameter(_)
        ));
    }

    // ============================================================
    // REGISTRY
    // ============================================================

    #[test]
    fn test_registry_builtins_registered() {
        let registry = ProviderRegistry::with_builtins();

        assert!(registry.has_kind("sequence"));
        assert!(registry.has_kind("ontology"));
        assert_eq!(registry.kinds().len(), 2);
    }

    #[test]
    fn test_registry_unknown_kind_is_configuration_error() {
        let registry = ProviderRegistry::with_builtins();

        let err = registry.build("graph", &ProviderConfig::new()).unwrap_err();
        match err {
            XJoinError::Configuration(message) => assert!(message.contains("graph")),
            other => panic!("expected Configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_construction_failure_propagates() {
        let registry = ProviderRegistry::with_builtins();

        // Sequence kind with an empty config: fail-fast, no partial provider
        assert!(matches!(
            registry.build("sequence", &ProviderConfig::new()).unwrap_err(),
            XJoinError::Configuration(_)
        ));
    }
}
