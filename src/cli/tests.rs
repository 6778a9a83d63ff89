//! Tests for CLI argument parsing and command dispatch

use super::*;
use crate::config::TrainingParams;
use crate::testing::TinyModel;
use std::path::PathBuf;
use tempfile::TempDir;

// ========================================================================
// PARSING
// ========================================================================

#[test]
fn test_parse_train_command() {
    let cli = parse_args(["afinar", "train", "job.yaml"]).unwrap();
    match cli.command {
        Command::Train(args) => {
            assert_eq!(args.config, PathBuf::from("job.yaml"));
            assert!(!args.dry_run);
            assert!(!args.push_to_hub);
        }
        _ => panic!("Expected Train command"),
    }
}

#[test]
fn test_parse_train_with_overrides() {
    let cli = parse_args([
        "afinar",
        "train",
        "job.yaml",
        "--epochs",
        "3",
        "--batch-size",
        "8",
        "--lr",
        "2e-4",
        "--project-name",
        "run-1",
        "--dry-run",
    ])
    .unwrap();

    match cli.command {
        Command::Train(args) => {
            assert_eq!(args.epochs, Some(3));
            assert_eq!(args.batch_size, Some(8));
            assert!((args.lr.unwrap() - 2e-4).abs() < 1e-12);
            assert_eq!(args.project_name.as_deref(), Some("run-1"));
            assert!(args.dry_run);
        }
        _ => panic!("Expected Train command"),
    }
}

#[test]
fn test_global_flags() {
    let cli = parse_args(["afinar", "validate", "job.yaml", "-v"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(LogLevel::from_flags(cli.verbose, cli.quiet), LogLevel::Verbose);

    let cli = parse_args(["afinar", "-q", "validate", "job.yaml"]).unwrap();
    assert!(cli.quiet);
    assert_eq!(LogLevel::from_flags(cli.verbose, cli.quiet).directive(), "warn");
    assert_eq!(LogLevel::Normal.directive(), "info");
}

#[test]
fn test_parse_merge_and_publish() {
    let cli = parse_args([
        "afinar", "merge", "--base", "b", "--adapter", "a", "--output", "o",
    ])
    .unwrap();
    assert_eq!(
        cli.command,
        Command::Merge(MergeArgs {
            base: PathBuf::from("b"),
            adapter: PathBuf::from("a"),
            output: PathBuf::from("o"),
        })
    );

    let cli = parse_args(["afinar", "publish", "out", "--repo", "me/model", "--private"]).unwrap();
    match cli.command {
        Command::Publish(args) => {
            assert_eq!(args.repo, "me/model");
            assert!(args.private);
        }
        _ => panic!("Expected Publish command"),
    }
}

#[test]
fn test_missing_subcommand_is_an_error() {
    assert!(parse_args(["afinar"]).is_err());
    assert!(parse_args(["afinar", "merge", "--base", "b"]).is_err());
}

// ========================================================================
// COMMANDS
// ========================================================================

#[test]
fn test_overrides_replace_loaded_values() {
    let mut params = TrainingParams::new("gpt2", "data");
    let cli = parse_args([
        "afinar", "train", "job.yaml", "--epochs", "7", "--lr", "0.5", "--push-to-hub",
    ])
    .unwrap();
    let Command::Train(args) = cli.command else {
        panic!("Expected Train command");
    };
    apply_overrides(&mut params, &args);
    assert_eq!(params.num_train_epochs, 7);
    assert!((params.learning_rate - 0.5).abs() < f64::EPSILON);
    assert!(params.push_to_hub);
    assert_eq!(params.train_batch_size, 2);
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("job.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_validate_and_dry_run_commands() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "model_name: gpt2\ndata_path: ./data\nuse_peft: true\n");
    let config = path.to_str().unwrap();

    run_command(parse_args(["afinar", "-q", "validate", config]).unwrap()).unwrap();
    run_command(parse_args(["afinar", "-q", "train", config, "--dry-run"]).unwrap()).unwrap();

    // push without a repo id is rejected before anything runs
    let err = run_command(
        parse_args(["afinar", "-q", "train", config, "--dry-run", "--push-to-hub"]).unwrap(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("repo"));
}

#[test]
fn test_merge_command_writes_merged_model() {
    use crate::lora::{save_peft_adapter, LoraConfig, LoraLayer, PeftAdapterConfig};
    use rand::SeedableRng;

    let dir = TempDir::new().unwrap();
    let base = dir.path().join("base");
    let adapter = dir.path().join("adapter");
    let output = dir.path().join("merged");
    TinyModel::default().write(&base);

    let lora = LoraConfig::new(2, 4.0).with_targets(["q_proj"]);
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let layer = LoraLayer::new(
        "model.layers.0.self_attn.q_proj",
        crate::testing::HIDDEN,
        crate::testing::HIDDEN,
        &lora,
        &mut rng,
    );
    let config = PeftAdapterConfig::from_lora_config(&lora, Some("base"));
    save_peft_adapter(&adapter, &config, [&layer]).unwrap();

    let cli = parse_args([
        "afinar",
        "-q",
        "merge",
        "--base",
        base.to_str().unwrap(),
        "--adapter",
        adapter.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ])
    .unwrap();
    run_command(cli).unwrap();

    assert!(output.join("model.safetensors").is_file());
    assert!(output.join("tokenizer.json").is_file());
    assert!(output.join("config.json").is_file());
}
