//! Tests for job configuration

use super::*;
use proptest::prelude::*;
use serde_json::json;
use std::io::Write;

fn minimal() -> serde_json::Value {
    json!({ "model_name": "gpt2", "data_path": "tatsu-lab/alpaca" })
}

// ========================================================================
// PROPERTY TESTS
// ========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(200))]

    #[test]
    fn prop_set_block_size_is_min_of_request_and_limit(
        requested in 1usize..10_000,
        tokenizer_max in 1usize..10_000,
    ) {
        let resolved = resolve_block_size(Some(requested), tokenizer_max);
        prop_assert_eq!(resolved, requested.min(tokenizer_max));
        prop_assert!(resolved > 0);
    }

    #[test]
    fn prop_unset_block_size_is_capped_at_default(tokenizer_max in 1usize..100_000) {
        let resolved = resolve_block_size(None, tokenizer_max);
        prop_assert_eq!(resolved, DEFAULT_BLOCK_SIZE.min(tokenizer_max));
        prop_assert!(resolved <= tokenizer_max);
    }

    #[test]
    fn prop_resolve_never_mutates_params(block_size in -1i64..5000, tokenizer_max in 1usize..5000) {
        prop_assume!(block_size != 0);
        let params = TrainingParams::new("m", "d").with_block_size(block_size);
        let before = params.clone();
        let resolved = params.resolve(tokenizer_max);
        prop_assert_eq!(&params, &before);
        prop_assert_eq!(resolved.params(), &before);
        prop_assert!(resolved.block_size() <= tokenizer_max);
    }
}

// ========================================================================
// NORMALIZATION
// ========================================================================

#[test]
fn test_normalize_applies_defaults() {
    let params = normalize(minimal()).unwrap();
    assert_eq!(params.model_name, "gpt2");
    assert_eq!(params.train_split, "train");
    assert_eq!(params.valid_split, None);
    assert_eq!(params.text_column, "text");
    assert_eq!(params.train_batch_size, 2);
    assert_eq!(params.block_size, UNSET);
    assert_eq!(params.logging_steps, UNSET);
    assert_eq!(params.optimizer, "adamw_torch");
    assert_eq!(params.scheduler, "linear");
    assert!(params.add_eos_token);
    assert!(!params.use_peft);
    assert!(!params.push_to_hub);
}

#[test]
fn test_normalize_coerces_string_values() {
    let mut value = minimal();
    value["learning_rate"] = json!("2e-4");
    value["num_train_epochs"] = json!("3");
    value["use_peft"] = json!("True");
    value["block_size"] = json!("-1");
    value["lora_alpha"] = json!(16);
    value["valid_split"] = json!(null);

    let params = normalize(value).unwrap();
    assert!((params.learning_rate - 2e-4).abs() < 1e-12);
    assert_eq!(params.num_train_epochs, 3);
    assert!(params.use_peft);
    assert_eq!(params.block_size, -1);
    assert!((params.lora_alpha - 16.0).abs() < f64::EPSILON);
    assert!(params.valid_split.is_none());
}

#[test]
fn test_normalize_accepts_every_boolean_form() {
    for (raw, expected) in [
        (json!(true), true),
        (json!(false), false),
        (json!(1), true),
        (json!(0), false),
        (json!("yes"), true),
        (json!("Off"), false),
    ] {
        let mut value = minimal();
        value["fp16"] = raw.clone();
        value["push_to_hub"] = raw.clone();
        value["repo_id"] = json!("someone/model");
        let params = normalize(value).unwrap();
        assert_eq!(params.fp16, expected, "fp16 from {raw}");
        assert_eq!(params.push_to_hub, expected, "push_to_hub from {raw}");
    }

    let mut value = minimal();
    value["use_peft"] = json!(2);
    match normalize(value) {
        Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "use_peft"),
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn test_normalize_stringifies_numeric_names() {
    let mut value = minimal();
    value["valid_split"] = json!(2023);
    let params = normalize(value).unwrap();
    assert_eq!(params.valid_split.as_deref(), Some("2023"));
}

#[test]
fn test_normalize_rejects_unknown_field() {
    let mut value = minimal();
    value["lora_rank"] = json!(8);
    match normalize(value) {
        Err(ConfigError::UnknownField(name)) => assert_eq!(name, "lora_rank"),
        other => panic!("expected UnknownField, got {other:?}"),
    }
}

#[test]
fn test_normalize_rejects_missing_required_field() {
    match normalize(json!({ "model_name": "gpt2" })) {
        Err(ConfigError::MissingField(name)) => assert_eq!(name, "data_path"),
        other => panic!("expected MissingField, got {other:?}"),
    }
}

#[test]
fn test_normalize_names_field_with_bad_value() {
    let mut value = minimal();
    value["train_batch_size"] = json!("eight");
    match normalize(value) {
        Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "train_batch_size"),
        other => panic!("expected InvalidValue, got {other:?}"),
    }

    let mut value = minimal();
    value["eval_batch_size"] = json!(-4);
    assert!(matches!(
        normalize(value),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn test_normalize_rejects_non_mapping() {
    assert!(matches!(
        normalize(json!(["model_name"])),
        Err(ConfigError::NotAMapping(_))
    ));
}

#[test]
fn test_normalize_passes_typed_params_through() {
    let params = TrainingParams::new("gpt2", "data").with_lora(8, 16.0);
    assert_eq!(normalize(params.clone()).unwrap(), params);
}

#[test]
fn test_token_is_never_serialized() {
    let mut params = TrainingParams::new("gpt2", "data");
    params.huggingface_token = Some("hf_secret".into());
    let echoed = serde_json::to_string(&params).unwrap();
    assert!(!echoed.contains("hf_secret"));
}

#[test]
fn test_load_params_from_yaml() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "model_name: gpt2\ndata_path: ./data\nuse_peft: true\nlora_r: \"8\"\nvalid_split: validation\n"
    )
    .unwrap();

    let params = load_params(file.path()).unwrap();
    assert!(params.use_peft);
    assert_eq!(params.lora_r, 8);
    assert_eq!(params.valid_split.as_deref(), Some("validation"));
}

#[test]
fn test_load_params_from_json() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"model_name": "gpt2", "data_path": "./data", "fp16": 1}}"#).unwrap();
    let params = load_params(file.path()).unwrap();
    assert!(params.fp16);
}

// ========================================================================
// VALIDATION
// ========================================================================

#[test]
fn test_default_params_validate() {
    TrainingParams::new("gpt2", "data").validate().unwrap();
}

#[test]
fn test_validate_rejects_zero_block_size() {
    let params = TrainingParams::new("gpt2", "data").with_block_size(0);
    assert!(params.validate().is_err());
    let params = TrainingParams::new("gpt2", "data").with_block_size(-7);
    assert!(params.validate().is_err());
}

#[test]
fn test_validate_rejects_unknown_names() {
    let mut params = TrainingParams::new("gpt2", "data");
    params.scheduler = "polynomial_decay".into();
    assert!(params.validate().is_err());

    let mut params = TrainingParams::new("gpt2", "data");
    params.evaluation_strategy = "hourly".into();
    match params.validate() {
        Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "evaluation_strategy"),
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn test_push_without_repo_id_is_hard_failure() {
    let mut params = TrainingParams::new("gpt2", "data");
    params.push_to_hub = true;
    assert!(matches!(params.validate(), Err(ConfigError::InvalidRepoId(None))));

    params.repo_id = Some("not-a-repo".into());
    assert!(matches!(params.validate(), Err(ConfigError::InvalidRepoId(Some(_)))));

    params.repo_id = Some("someone/my-model".into());
    params.validate().unwrap();
}

#[test]
fn test_lora_dropout_range_checked_only_with_peft() {
    let mut params = TrainingParams::new("gpt2", "data");
    params.lora_dropout = 1.5;
    params.validate().unwrap();
    params.use_peft = true;
    assert!(params.validate().is_err());
}

#[test]
fn test_repo_id_shapes() {
    assert!(is_valid_repo_id("org/model"));
    assert!(is_valid_repo_id("org-1/model_v2.1"));
    assert!(!is_valid_repo_id("model"));
    assert!(!is_valid_repo_id("a/b/c"));
    assert!(!is_valid_repo_id("/model"));
    assert!(!is_valid_repo_id("org/has space"));
}

#[test]
fn test_target_module_list_parsing() {
    let mut params = TrainingParams::new("gpt2", "data");
    assert!(params.target_module_list().is_none());
    params.target_modules = Some("q_proj, v_proj,,o_proj".into());
    assert_eq!(
        params.target_module_list().unwrap(),
        vec!["q_proj", "v_proj", "o_proj"]
    );
}
