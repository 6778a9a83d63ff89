//! Tests for tokenizer preparation

use super::*;
use crate::testing::TinyModel;
use proptest::prelude::*;
use tempfile::TempDir;

// ========================================================================
// PROPERTY TESTS
// ========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(200))]

    #[test]
    fn prop_clamp_only_replaces_untrusted_limits(
        tokenizer_max in 1usize..100_000,
        configured in 1usize..10_000,
    ) {
        let clamped = clamp_max_length(tokenizer_max, configured);
        if tokenizer_max > MAX_TRUSTED_LENGTH {
            prop_assert_eq!(clamped, configured);
        } else {
            prop_assert_eq!(clamped, tokenizer_max);
        }
    }
}

// ========================================================================
// LOADING
// ========================================================================

#[test]
fn test_prepare_keeps_trusted_limit() {
    let dir = TempDir::new().unwrap();
    TinyModel::default().with_max_length(Some(512)).write(dir.path());

    let tokenizer = prepare_tokenizer(dir.path(), 1024).unwrap();
    assert_eq!(tokenizer.model_max_length(), 512);
}

#[test]
fn test_prepare_overrides_unbounded_limit() {
    let dir = TempDir::new().unwrap();
    TinyModel::default().with_max_length(None).write(dir.path());

    let tokenizer = prepare_tokenizer(dir.path(), 333).unwrap();
    assert_eq!(tokenizer.model_max_length(), 333);
}

#[test]
fn test_prepare_overrides_large_limit() {
    let dir = TempDir::new().unwrap();
    TinyModel::default().with_max_length(Some(8192)).write(dir.path());

    let tokenizer = prepare_tokenizer(dir.path(), 2048).unwrap();
    assert_eq!(tokenizer.model_max_length(), 2048);
}

#[test]
fn test_missing_tokenizer_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        HfTokenizer::from_dir(dir.path()),
        Err(TokenizerError::MissingFile(_))
    ));
}

#[test]
fn test_encode_and_eos() {
    let dir = TempDir::new().unwrap();
    let model = TinyModel::default();
    model.write(dir.path());

    let tokenizer = HfTokenizer::from_dir(dir.path()).unwrap();
    assert_eq!(tokenizer.len(), model.vocab().len());
    assert_eq!(tokenizer.eos_token().as_deref(), Some("</s>"));

    let encoded = tokenizer.encode("the cat sat</s>").unwrap();
    assert_eq!(encoded.len(), 4);
    assert_eq!(encoded.attention_mask, vec![1, 1, 1, 1]);
    assert_eq!(encoded.input_ids[3], tokenizer.token_to_id("</s>").unwrap());
}

#[test]
fn test_save_persists_clamped_limit() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    TinyModel::default().with_max_length(None).write(src.path());

    let tokenizer = prepare_tokenizer(src.path(), 64).unwrap();
    tokenizer.save(dst.path()).unwrap();

    let reloaded = HfTokenizer::from_dir(dst.path()).unwrap();
    assert_eq!(reloaded.model_max_length(), 64);
    assert_eq!(reloaded.len(), tokenizer.len());
}
