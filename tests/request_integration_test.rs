//! Scrub requests: JSON surface, word-list files and shared lists

use anonymiser::config::secret_string;
use anonymiser::domain::AnonymiserError;
use anonymiser::scrub::{Hasher, ScrubRequest, ScrubSettings, Sha256Hasher};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn hasher() -> Arc<dyn Hasher> {
    Arc::new(Sha256Hasher::new(secret_string("request-key".to_string())))
}

fn word_file(lines: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(lines.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_request_with_word_list_files() {
    let deny = word_file("# clinic staff\nNightingale\n\nSeacole\n");
    let allow = word_file("Seacole\n");

    let json = serde_json::json!({
        "patient": {"words": ["Alice Smith"]},
        "denylist": {"files": [deny.path()]},
        "allowlist": {"files": [allow.path()]}
    })
    .to_string();

    let request = ScrubRequest::from_json_with_defaults(&json, &ScrubSettings::default()).unwrap();
    let scrubber = request.build_scrubber(hasher()).unwrap();

    assert_eq!(
        scrubber.scrub("Alice Smith saw Nurse Nightingale and Nurse Seacole"),
        "[__PPP__] [__PPP__] saw Nurse [~~~] and Nurse Seacole"
    );
}

#[test]
fn test_missing_word_list_file_is_configuration_error() {
    let json = r#"{"denylist": {"files": ["/nonexistent/denylist.txt"]}}"#;
    let request = ScrubRequest::from_json_with_defaults(json, &ScrubSettings::default()).unwrap();

    let err = request.build_scrubber(hasher()).unwrap_err();
    assert!(matches!(err, AnonymiserError::Configuration(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn test_full_request_surface() {
    let json = r#"{
        "patient": {
            "dates": ["1990-01-12"],
            "phrases": ["Bob Hope"],
            "non_numeric_phrases": ["42"],
            "numbers": ["07700 900123"]
        },
        "third_party": {"codes": ["CB2 3EB"], "words": ["Nightingale"]},
        "denylist": {"words": ["secret"]},
        "scrub_string_suffixes": ["s"],
        "scrub_all_numbers_of_n_digits": [10],
        "scrub_all_uk_postcodes": true,
        "scrub_all_dates": true,
        "replace_all_dates_with": "%b %Y"
    }"#;

    let request = ScrubRequest::from_json_with_defaults(json, &ScrubSettings::default()).unwrap();
    let scrubber = request.build_scrubber(hasher()).unwrap();

    let outcome = scrubber.scrub_with_report(
        "Bob Hope (DOB 12/01/1990) called from 07700 900123 about 42 secrets. \
         Seen by Nightingale at CB2 3EB and at SW1A 1AA on 3 May 2001, NHS 9434765919.",
    );

    assert_eq!(
        outcome.text,
        "[__PPP__] (DOB [__PPP__]) called from [__PPP__] about 42 [~~~]. \
         Seen by [__TTT__] at [__TTT__] and at [~~~] on May 2001, NHS [~~~]."
    );
    assert_eq!(outcome.counts.patient, 3);
    assert_eq!(outcome.counts.third_party, 2);
    assert_eq!(outcome.counts.denylist, 1);
    assert_eq!(outcome.counts.postcodes, 1);
    assert_eq!(outcome.counts.dates, 1);
    assert_eq!(outcome.counts.numbers, 1);
    assert_eq!(outcome.config_hash, scrubber.get_hash());
}

#[test]
fn test_shared_lists_give_identical_scrubbers() {
    let json = r#"{
        "patient": {"phrases": ["Bob Hope"]},
        "denylist": {"words": ["secret"]}
    }"#;
    let request = ScrubRequest::from_json_with_defaults(json, &ScrubSettings::default()).unwrap();
    let h = hasher();
    let lists = request.prepare_lists(h.as_ref()).unwrap();

    let a = request.build_scrubber_with(Arc::clone(&h), &lists).unwrap();
    let b = request.build_scrubber_with(h, &lists).unwrap();

    assert_eq!(a.get_hash(), b.get_hash());
    assert_eq!(a.scrub("Bob Hope's secret"), b.scrub("Bob Hope's secret"));
}

#[test]
fn test_request_settings_override_configuration() {
    let defaults = ScrubSettings {
        replace_patient_info_with: "[P]".to_string(),
        string_max_regex_errors: 1,
        ..Default::default()
    };
    let json = r#"{"patient": {"words": ["Buchanan"]}, "string_max_regex_errors": 0}"#;

    let request = ScrubRequest::from_json_with_defaults(json, &defaults).unwrap();
    let scrubber = request.build_scrubber(hasher()).unwrap();

    assert_eq!(scrubber.scrub("Buchanan Buchenan"), "[P] Buchenan");
}

#[test]
fn test_malformed_request_rejected() {
    let err = ScrubRequest::from_json_with_defaults("{not json", &ScrubSettings::default())
        .unwrap_err();
    assert!(matches!(err, AnonymiserError::Serialization(_)));

    let err = ScrubRequest::from_json_with_defaults(
        r#"{"patient": {"phrases": "Bob"}}"#,
        &ScrubSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, AnonymiserError::Serialization(_)));
}

#[test]
fn test_invalid_fuzzy_settings_rejected() {
    let json = r#"{"string_max_regex_errors": 3, "min_string_length_for_errors": 3}"#;
    let request = ScrubRequest::from_json_with_defaults(json, &ScrubSettings::default()).unwrap();

    let err = request.build_scrubber(hasher()).unwrap_err();
    assert!(matches!(err, AnonymiserError::Configuration(_)));
}
