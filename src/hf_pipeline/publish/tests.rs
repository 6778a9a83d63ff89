//! Tests for Hub publishing

use super::*;
use tempfile::TempDir;

// ─── PublishConfig tests ─────────────────────────────────────────────

#[test]
fn test_publish_config_default() {
    let config = PublishConfig::default();
    assert!(config.repo_id.is_empty());
    assert_eq!(config.repo_type, RepoType::Model);
    assert!(!config.private);
    assert!(config.token.is_none());
    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
}

#[test]
fn test_repo_type_api_path() {
    assert_eq!(RepoType::Model.api_path(), "models");
    assert_eq!(RepoType::Dataset.api_path(), "datasets");
    assert_eq!(RepoType::Model.to_string(), "model");
}

// ─── PublishError tests ──────────────────────────────────────────────

#[test]
fn test_publish_error_display() {
    assert!(PublishError::AuthRequired.to_string().contains("HF_TOKEN"));

    let err = PublishError::InvalidRepoId { repo_id: "bad".into() };
    assert!(err.to_string().contains("bad"));

    let err = PublishError::RepoCreationFailed {
        repo_id: "a/b".into(),
        message: "403".into(),
    };
    assert!(err.to_string().contains("a/b"));
}

// ─── HfPublisher tests ──────────────────────────────────────────────

#[test]
fn test_publisher_invalid_repo_id() {
    for repo_id in ["no-slash", "", "a/b/c"] {
        let config = PublishConfig::model(repo_id, Some("fake-token".into()));
        assert!(matches!(
            HfPublisher::new(config),
            Err(PublishError::InvalidRepoId { .. })
        ));
    }
}

#[test]
fn test_publisher_urls() {
    let mut config = PublishConfig::model("someone/my-model", Some("fake-token".into()));
    config.endpoint = "http://localhost:9999/".into();
    let publisher = HfPublisher::new(config).unwrap();

    assert_eq!(publisher.repo_url(), "http://localhost:9999/someone/my-model");
    assert_eq!(
        publisher.upload_url("checkpoint-2/adapter_config.json"),
        "http://localhost:9999/api/models/someone/my-model/upload/main/checkpoint-2/adapter_config.json"
    );
}

#[test]
fn test_debug_hides_token() {
    let config = PublishConfig::model("someone/my-model", Some("hf_secret".into()));
    let publisher = HfPublisher::new(config).unwrap();
    assert!(!format!("{publisher:?}").contains("hf_secret"));
}

#[test]
fn test_collect_files_is_recursive_and_sorted() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("checkpoint-4")).unwrap();
    std::fs::write(dir.path().join("model.safetensors"), b"w").unwrap();
    std::fs::write(dir.path().join("config.json"), b"{}").unwrap();
    std::fs::write(dir.path().join("checkpoint-4/trainer_state.json"), b"{}").unwrap();

    let files: Vec<String> = collect_files(dir.path())
        .unwrap()
        .into_iter()
        .map(|(_, rel)| rel)
        .collect();
    assert_eq!(
        files,
        vec!["checkpoint-4/trainer_state.json", "config.json", "model.safetensors"]
    );
}
