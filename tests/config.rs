use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;

use patent_citations::config::{Config, ConfigLoader, ConfigOverrides, DEFAULT_IMAGE_ROOT};
use patent_citations::error::PatentError;

#[test]
fn flags_override_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("patcite.json");
    fs::write(
        &path,
        r#"{
            "json_dir_input": "/srv/query",
            "json_dir_output": "/srv/document",
            "exclude": ["A61K"],
            "remote": { "timeout_secs": 5, "user_agent": "research-bot" }
        }"#,
    )
    .unwrap();

    let overrides = ConfigOverrides {
        json_dir_input: Some("/tmp/query".to_string()),
        exclude: vec!["A61K".to_string(), "H04L".to_string()],
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve(path.to_str(), overrides).unwrap();

    assert_eq!(resolved.roots.input, "/tmp/query");
    assert_eq!(resolved.roots.documents, "/srv/document");
    assert_eq!(resolved.roots.images, DEFAULT_IMAGE_ROOT);
    assert_eq!(resolved.exclude, vec!["A61K", "H04L"]);
    assert_eq!(resolved.client.timeout, Duration::from_secs(5));
    assert_eq!(resolved.client.user_agent.as_deref(), Some("research-bot"));
}

#[test]
fn timeout_flag_wins() {
    let config: Config = serde_json::from_str(r#"{"remote": {"timeout_secs": 5}}"#).unwrap();
    let overrides = ConfigOverrides {
        timeout_secs: Some(90),
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve_config(config, overrides);
    assert_eq!(resolved.client.timeout, Duration::from_secs(90));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let err = ConfigLoader::resolve(Some("does/not/exist.json"), ConfigOverrides::default())
        .unwrap_err();
    assert_matches!(err, PatentError::ConfigRead(_));
}

#[test]
fn invalid_config_json() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("patcite.json");
    fs::write(&path, "{ nope").unwrap();
    let err = ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap_err();
    assert_matches!(err, PatentError::ConfigParse(_));
}
